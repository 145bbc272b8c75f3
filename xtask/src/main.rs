use anyhow::Result;
use clap::{Parser, Subcommand};
use excelvision_core::download::DirectorySink;
use excelvision_core::events::drain;
use excelvision_core::generation::GenerationRequester;
use excelvision_core::mock::MockGateway;
use excelvision_core::models::{GenerationRequest, GenerationSummary, Provider};
use excelvision_core::recent::{RecentFetcher, RecentList};
use excelvision_core::{telemetry, Notifier};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for ExcelVision")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lightweight smoke test against an in-memory backend.
    Smoke,
}

fn main() -> Result<()> {
    telemetry::init_tracing("info")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke => smoke_test(),
    }
}

fn smoke_test() -> Result<()> {
    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;
    let gateway = Arc::new(MockGateway::new().with_generations(vec![GenerationSummary {
        id: "smoke".into(),
        description: "Smoke test sheet".into(),
        created_at: "2024-05-01T00:00:00+00:00".into(),
        size_bytes: 4096,
        provider: Provider::Auto.to_string(),
        filename: None,
    }]));
    let (notifier, mut events) = Notifier::channel();
    let requester = GenerationRequester::new(
        gateway.clone(),
        Arc::new(DirectorySink::new(temp_dir.path())),
        notifier,
        "excelvision",
    );

    let artifact = runtime.block_on(
        requester.generate(&GenerationRequest::new("smoke test from xtask"), None),
    )?;
    info!(
        path = %artifact.path.display(),
        size = artifact.size_bytes,
        events = drain(&mut events).len(),
        "smoke test spreadsheet saved"
    );

    let list = RecentList::new();
    runtime.block_on(async {
        RecentFetcher::new(gateway)
            .attach(list.clone())
            .settled()
            .await
    });
    info!(items = list.items().len(), "smoke test recent list loaded");

    Ok(())
}
