use super::config_for;
use excelvision::{render_recent, ClientSession};
use excelvision_core::mock::MockGateway;
use excelvision_core::recent::{RecentList, RecentState};
use excelvision_core::token_store::MemoryCredentialStorage;
use excelvision_core::{GenerationSummary, Notifier};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn recent_list_keeps_server_order() {
    let mut server = mockito::Server::new_async().await;
    let list = server
        .mock("GET", "/api/generations")
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"id": "2", "description": "Payroll", "created_at": "2024-05-02T09:00:00+00:00",
                 "size_bytes": 10240, "provider": "openai", "filename": "payroll.xlsx"},
                {"id": "1", "description": "Budget", "created_at": "2024-05-01T09:00:00+00:00",
                 "size_bytes": 2048, "provider": "auto"}
            ]"#,
        )
        .expect(1)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("session");
    let items = session.recent().await;
    list.assert_async().await;

    let descriptions: Vec<_> = items.iter().map(|item| item.description.as_str()).collect();
    assert_eq!(descriptions, ["Payroll", "Budget"]);
    assert_eq!(items[0].size_kb(), 10);
    assert!(render_recent(&items).contains("10 KB · OpenAI"));
}

#[tokio::test]
async fn unavailable_list_shows_the_placeholder() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/generations")
        .with_status(503)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("session");
    let items = session.recent().await;
    assert!(items.is_empty());
    assert_eq!(
        render_recent(&items),
        "No generations yet. Create your first above."
    );
}

#[tokio::test]
async fn leaving_the_view_before_the_reply_leaves_the_list_untouched() {
    let gateway = MockGateway::new().with_generations(vec![GenerationSummary {
        id: "late".into(),
        description: "Late reply".into(),
        created_at: "2024-05-01T00:00:00+00:00".into(),
        size_bytes: 1024,
        provider: "auto".into(),
        filename: None,
    }]);
    let gate = gateway.gate_generations();
    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::with_parts(
        excelvision_core::ClientConfig {
            state_dir: root.path().to_path_buf(),
            ..Default::default()
        },
        Arc::new(gateway),
        Arc::new(MemoryCredentialStorage::new()),
        Notifier::disconnected(),
    );

    let list = RecentList::new();
    let attachment = session.recent_fetcher().attach(list.clone());
    gate.entered().await;
    attachment.detach().await;
    gate.release();
    tokio::task::yield_now().await;

    assert_eq!(list.state(), RecentState::Pending);
}
