use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use excelvision::{render_event, render_recent, render_status, ClientSession};
use excelvision_core::auth::{AuthMode, AuthOutcome};
use excelvision_core::events::Notifier;
use excelvision_core::models::{FederatedProvider, GenerationRequest, Provider};
use excelvision_core::{telemetry, ClientConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

#[derive(Parser, Debug)]
#[command(name = "excelvision", version, about = "Turn a description into an Excel spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Backend root, overriding excelvision.yaml and the environment.
    #[arg(long, global = true)]
    backend_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a spreadsheet and save it to the download directory.
    Generate {
        #[arg(long, short, default_value_t = Provider::Auto)]
        provider: Provider,
        /// Directory to save into instead of the configured one.
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// List recent generations.
    Recent,
    Login(CredentialArgs),
    Register(CredentialArgs),
    Logout,
    /// Sign in through Google or Microsoft in the browser.
    Sso {
        provider: FederatedProvider,
        /// Print the sign-in URL without opening it.
        #[arg(long)]
        no_browser: bool,
    },
    /// Show the backend and sign-in state.
    Status,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "EXCELVISION_PASSWORD", hide_env_values = true)]
    password: String,
}

fn main() -> Result<ExitCode> {
    telemetry::init_tracing("warn")?;
    let cli = Cli::parse();
    let runtime = Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = ClientConfig::load().map_err(|err| anyhow!(err.user_message()))?;
    if let Some(url) = &cli.backend_url {
        config = config
            .with_backend_url(url)
            .map_err(|err| anyhow!(err.user_message()))?;
    }

    let (notifier, mut events) = Notifier::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            eprintln!("{}", render_event(&event));
        }
    });

    let session = ClientSession::open(config, notifier)?;
    let code = execute(&session, cli.command).await;
    // Closing the last notifier ends the printer once it has flushed.
    drop(session);
    printer.await?;
    code
}

async fn execute(session: &ClientSession, command: Command) -> Result<ExitCode> {
    match command {
        Command::Generate {
            provider,
            out,
            description,
        } => {
            session.warm_up();
            let request = GenerationRequest::new(description.join(" ")).with_provider(provider);
            match session.generate(&request, out.as_deref()).await {
                Ok(artifact) => {
                    println!("{}", artifact.path.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    debug!(%err, "generate command failed");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Recent => {
            session.warm_up();
            println!("{}", render_recent(&session.recent().await));
            Ok(ExitCode::SUCCESS)
        }
        Command::Login(args) => authenticate(session, AuthMode::Login, args).await,
        Command::Register(args) => authenticate(session, AuthMode::Register, args).await,
        Command::Logout => Ok(match session.logout() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        }),
        Command::Sso {
            provider,
            no_browser,
        } => {
            let mut flow = session.auth_flow();
            let Ok(url) = flow.start_federated(provider).await else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{url}");
            if !no_browser {
                if let Err(err) = open::that(url.as_str()) {
                    warn!(%err, "could not open a browser");
                    eprintln!("Open the address above in your browser to continue.");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let config = session.config();
            println!("Backend:   {}", config.backend_url);
            println!("Downloads: {}", config.download_dir.display());
            println!("Account:   {}", render_status(session.auth_flow().status()));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn authenticate(
    session: &ClientSession,
    mode: AuthMode,
    args: CredentialArgs,
) -> Result<ExitCode> {
    session.warm_up();
    let mut flow = session.auth_flow();
    flow.set_mode(mode);
    flow.set_email(args.email);
    flow.set_password(args.password);
    match flow.submit().await {
        Ok(AuthOutcome::SignedIn | AuthOutcome::Registered) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            debug!(%err, "{} command failed", mode.title());
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_joins_description_words_and_parses_provider() {
        let cli = Cli::try_parse_from([
            "excelvision",
            "generate",
            "--provider",
            "gemini",
            "monthly",
            "budget",
        ])
        .unwrap();
        match cli.command {
            Command::Generate {
                provider,
                description,
                out,
            } => {
                assert_eq!(provider, Provider::Gemini);
                assert_eq!(description.join(" "), "monthly budget");
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sso_rejects_unknown_providers() {
        assert!(Cli::try_parse_from(["excelvision", "sso", "github"]).is_err());
        let cli = Cli::try_parse_from(["excelvision", "sso", "microsoft", "--no-browser"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Sso {
                provider: FederatedProvider::Microsoft,
                no_browser: true
            }
        ));
    }
}
