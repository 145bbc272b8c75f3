use super::{config_for, gateway_for};
use chrono::NaiveDate;
use excelvision::ClientSession;
use excelvision_core::download::{DirectorySink, FixedClock};
use excelvision_core::events::{drain, Phase};
use excelvision_core::gateway::SPREADSHEET_MIME;
use excelvision_core::generation::GenerationRequester;
use excelvision_core::models::{GenerationRequest, Provider};
use excelvision_core::{Credential, Notifier};
use mockito::Matcher;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const SHEET: &[u8] = b"PK\x03\x04scenario-sheet";

fn may_day() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"),
    ))
}

#[tokio::test]
async fn anonymous_generation_saves_one_dated_file() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(
            json!({"description": "Monthly budget", "provider": "auto"}),
        ))
        .with_status(200)
        .with_header("content-type", SPREADSHEET_MIME)
        .with_body(SHEET)
        .expect(1)
        .create_async()
        .await;

    let out = TempDir::new().expect("temp dir");
    let (notifier, mut events) = Notifier::channel();
    let requester = GenerationRequester::new(
        Arc::new(gateway_for(&server)),
        Arc::new(DirectorySink::new(out.path())),
        notifier,
        "excelvision",
    )
    .with_clock(may_day());

    let artifact = requester
        .generate(&GenerationRequest::new("Monthly budget"), None)
        .await
        .expect("generation succeeds");
    mock.assert_async().await;

    assert_eq!(artifact.filename, "excelvision_2024-05-01.xlsx");
    let names: Vec<_> = fs::read_dir(out.path())
        .expect("read downloads")
        .map(|entry| entry.expect("entry").file_name().into_string().expect("utf-8"))
        .collect();
    assert_eq!(names, ["excelvision_2024-05-01.xlsx"]);
    assert_eq!(fs::read(&artifact.path).expect("saved file"), SHEET);

    let phases: Vec<_> = drain(&mut events).into_iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        [
            Phase::Started {
                message: "Generating .xlsx...".into()
            },
            Phase::Succeeded {
                message: "Download ready!".into()
            },
        ]
    );
}

#[tokio::test]
async fn signed_in_generation_sends_the_bearer_and_keeps_earlier_downloads() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .match_header("authorization", "Bearer tok1")
        .match_body(Matcher::PartialJson(json!({"provider": "anthropic"})))
        .with_body(SHEET)
        .expect(2)
        .create_async()
        .await;

    let out = TempDir::new().expect("temp dir");
    let requester = GenerationRequester::new(
        Arc::new(gateway_for(&server)),
        Arc::new(DirectorySink::new(out.path())),
        Notifier::disconnected(),
        "excelvision",
    )
    .with_clock(may_day());
    let token = Credential::new("tok1").expect("token");
    let request = GenerationRequest::new("Sales pipeline").with_provider(Provider::Anthropic);

    let first = requester.generate(&request, Some(&token)).await.expect("first");
    let second = requester.generate(&request, Some(&token)).await.expect("second");
    mock.assert_async().await;

    assert_ne!(first.path, second.path);
    assert!(first.path.exists());
    assert_eq!(
        second.path.file_name().and_then(|n| n.to_str()),
        Some("excelvision_2024-05-01 (1).xlsx")
    );
}

#[tokio::test]
async fn server_detail_is_shown_and_nothing_is_saved() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Generation failed: quota exceeded"}"#)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let (notifier, mut events) = Notifier::channel();
    let session = ClientSession::open(config_for(&server, root.path()), notifier).expect("session");

    let err = session
        .generate(&GenerationRequest::new("Budget"), None)
        .await
        .expect_err("server error");
    assert_eq!(err.user_message("Try again"), "Generation failed: quota exceeded");
    assert!(!root.path().join("downloads").exists());

    let last = drain(&mut events).pop().expect("terminal event");
    assert_eq!(
        last.phase,
        Phase::Failed {
            reason: "Generation failed: quota exceeded".into()
        }
    );
}

#[tokio::test]
async fn blank_description_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/generate")
        .expect(0)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("session");
    let err = session
        .generate(&GenerationRequest::new("  "), None)
        .await
        .expect_err("rejected");

    assert!(err.is_validation());
    mock.assert_async().await;
}
