use super::config_for;
use excelvision::ClientSession;
use excelvision_core::auth::{AuthMode, AuthOutcome, AuthStatus};
use excelvision_core::events::{drain, Action, Phase};
use excelvision_core::models::{FederatedProvider, GenerationRequest};
use excelvision_core::Notifier;
use mockito::Matcher;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn login_persists_the_credential_across_sessions() {
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"email": "a@b.com", "password": "x"})))
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok1", "token_type": "bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let generate = server
        .mock("POST", "/api/generate")
        .match_header("authorization", "Bearer tok1")
        .with_body("PK")
        .expect(1)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let config = config_for(&server, root.path());
    {
        let session =
            ClientSession::open(config.clone(), Notifier::disconnected()).expect("session");
        let mut flow = session.auth_flow();
        flow.set_email("a@b.com");
        flow.set_password("x");
        assert_eq!(flow.submit().await.expect("login"), AuthOutcome::SignedIn);
        assert_eq!(flow.status(), &AuthStatus::Authenticated);
        assert_eq!(
            session.tokens().get().expect("stored").as_str(),
            "tok1"
        );
    }
    login.assert_async().await;

    let reopened = ClientSession::open(config, Notifier::disconnected()).expect("reopen");
    assert_eq!(reopened.auth_flow().status(), &AuthStatus::Authenticated);
    reopened
        .generate(&GenerationRequest::new("Budget"), None)
        .await
        .expect("authenticated generation");
    generate.assert_async().await;

    reopened.logout().expect("logout");
    let after_logout = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("reopen after logout");
    assert!(!after_logout.tokens().is_authenticated());
}

#[tokio::test]
async fn rejected_login_reports_the_server_detail() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/auth/login")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Invalid credentials"}"#)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let (notifier, mut events) = Notifier::channel();
    let session = ClientSession::open(config_for(&server, root.path()), notifier).expect("session");
    let mut flow = session.auth_flow();
    flow.set_email("a@b.com");
    flow.set_password("wrong");
    flow.submit().await.expect_err("login rejected");

    let events = drain(&mut events);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|event| event.action == Action::Login));
    assert_eq!(
        events[1].phase,
        Phase::Failed {
            reason: "Invalid credentials".into()
        }
    );
    assert!(flow.status().is_editable());
    assert_eq!(flow.form().password, "wrong");
    assert!(!flow.form().submitting);
    assert!(!session.tokens().is_authenticated());
}

#[tokio::test]
async fn registration_returns_to_the_login_form() {
    let mut server = mockito::Server::new_async().await;
    let register = server
        .mock("POST", "/api/auth/register")
        .match_body(Matcher::Json(json!({"email": "new@b.com", "password": "pw"})))
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 7, "email": "new@b.com"}"#)
        .expect(1)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("session");
    let mut flow = session.auth_flow();
    flow.set_mode(AuthMode::Register);
    flow.set_email("new@b.com");
    flow.set_password("pw");

    assert_eq!(flow.submit().await.expect("register"), AuthOutcome::Registered);
    register.assert_async().await;
    assert_eq!(flow.form().mode, AuthMode::Login);
    assert_eq!(flow.status(), &AuthStatus::Anonymous);
    assert!(!session.tokens().is_authenticated());
}

#[tokio::test]
async fn federated_sign_in_redirects_or_explains() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/auth/google/login")
        .with_header("content-type", "application/json")
        .with_body(r#"{"auth_url": "https://accounts.example.com/o/oauth2?state=abc"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/auth/microsoft/login")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Microsoft OAuth not configured"}"#)
        .create_async()
        .await;

    let root = TempDir::new().expect("temp dir");
    let session = ClientSession::open(config_for(&server, root.path()), Notifier::disconnected())
        .expect("session");
    let mut flow = session.auth_flow();

    let url = flow
        .start_federated(FederatedProvider::Google)
        .await
        .expect("google url");
    assert_eq!(url.host_str(), Some("accounts.example.com"));
    assert_eq!(flow.status(), &AuthStatus::Redirecting(url));

    flow.start_federated(FederatedProvider::Microsoft)
        .await
        .expect_err("not configured");
    assert_eq!(
        flow.status(),
        &AuthStatus::Error("Microsoft OAuth not configured".into())
    );
}
