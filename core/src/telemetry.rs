use anyhow::Result;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static SUBSCRIBER_GUARD: OnceLock<()> = OnceLock::new();

/// Install the global subscriber, logging to stderr so stdout stays clean for
/// command output.
///
/// `RUST_LOG` wins over `default_directive`. Calling this again is a no-op.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    if SUBSCRIBER_GUARD.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false));
    tracing::subscriber::set_global_default(subscriber)?;
    SUBSCRIBER_GUARD.set(()).ok();

    Ok(())
}
