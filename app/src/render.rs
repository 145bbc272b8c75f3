use excelvision_core::auth::AuthStatus;
use excelvision_core::events::{Action, ActionEvent, Phase};
use excelvision_core::models::{GenerationSummary, Provider};
use std::fmt::Write as _;

pub const NO_GENERATIONS: &str = "No generations yet. Create your first above.";

fn failure_title(action: Action) -> Option<&'static str> {
    match action {
        Action::Generate => Some("Generation failed"),
        _ => None,
    }
}

/// One line of terminal output for a progress event.
pub fn render_event(event: &ActionEvent) -> String {
    match &event.phase {
        Phase::Started { message } => format!("… {message}"),
        Phase::Succeeded { message } => format!("✓ {message}"),
        Phase::Failed { reason } => match failure_title(event.action) {
            Some(title) => format!("✗ {title}: {reason}"),
            None => format!("✗ {reason}"),
        },
        Phase::Rejected { reason } => format!("! {reason}"),
    }
}

/// Display name for a provider string from the server; unknown values pass
/// through unchanged.
fn provider_label(raw: &str) -> &str {
    raw.parse::<Provider>()
        .map(|provider| provider.label())
        .unwrap_or(raw)
}

pub fn render_recent(items: &[GenerationSummary]) -> String {
    if items.is_empty() {
        return NO_GENERATIONS.to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{}", item.description);
        let _ = writeln!(
            out,
            "    {} · {} KB · {}",
            item.created_at_display(),
            item.size_kb(),
            provider_label(&item.provider)
        );
    }
    out.trim_end().to_string()
}

pub fn render_status(status: &AuthStatus) -> String {
    match status {
        AuthStatus::Anonymous => "Not signed in".to_string(),
        AuthStatus::Submitting => "Signing in...".to_string(),
        AuthStatus::Authenticated => "Signed in".to_string(),
        AuthStatus::Redirecting(url) => format!("Continue sign-in at {url}"),
        AuthStatus::Error(reason) => format!("Sign-in error: {reason}"),
    }
}
