//! API client and timer session tests against a live in-memory server.

use std::sync::Arc;

use plank_back::{
    client::{
        ClientError, StatusMessage, http::PlankClient, manual,
        session::{SaveOutcome, TimerSession},
    },
    config::AppConfig,
    dao::store::memory::MemoryStore,
    dto::attempt::CreateAttemptRequest,
    routes,
    state::AppState,
};
use reqwest::StatusCode;
use tokio::net::TcpListener;

async fn serve() -> String {
    let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryStore::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state)).await.unwrap();
    });
    format!("http://{addr}/")
}

async fn signed_in(base_url: &str, email: &str, name: &str) -> PlankClient {
    let client = PlankClient::new(base_url).unwrap();
    client.register(email, "hunter22", name).await.unwrap();
    let login = client.login(email, "hunter22").await.unwrap();
    assert_eq!(login.user.display_name, name);
    client.with_token(login.token)
}

#[tokio::test]
async fn rejected_calls_carry_the_server_reason() {
    let base_url = serve().await;
    let anonymous = PlankClient::new(&base_url).unwrap();

    let err = anonymous.list_attempts().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rejected { status, ref message, .. }
            if status == StatusCode::UNAUTHORIZED && message.as_deref() == Some("Unauthorized")
    ));

    let client = signed_in(&base_url, "ann@example.com", "Ann").await;
    let err = client
        .create_attempt(CreateAttemptRequest::seconds(3601))
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message("Failed to save attempt"),
        "Duration must be between 1 second and 1 hour"
    );
}

#[tokio::test]
async fn manual_entries_and_history() {
    let base_url = serve().await;
    let client = signed_in(&base_url, "bob@example.com", "Bob").await;

    assert_eq!(
        manual::submit_entry(&client, "1:30").await,
        StatusMessage::Success("New personal best!".into())
    );
    assert_eq!(
        manual::submit_entry(&client, "0:45").await,
        StatusMessage::Success("Attempt saved!".into())
    );

    let history = client.list_attempts().await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|a| a.duration_seconds == 90 && a.is_personal_best));

    let dashboard = client.dashboard().await.unwrap();
    assert_eq!(dashboard.personal_best, Some(90));
    assert_eq!(dashboard.total_time, 135);

    let board = client.leaderboard().await.unwrap();
    assert_eq!(board.len(), 1);
    assert!(board[0].is_current_user);

    let totals = client.total_leaderboard(None).await.unwrap();
    assert_eq!(totals[0].total_time_display, "02:15");

    client.logout().await.unwrap();
    assert!(client.list_attempts().await.is_err());
}

#[tokio::test]
async fn timer_session_saves_through_the_service() {
    let base_url = serve().await;
    let client = signed_in(&base_url, "cat@example.com", "Cat").await;
    let session = TimerSession::new(Arc::new(client.clone()));

    session.start().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;
    session.stop().await.unwrap();

    let outcome = session.save().await.unwrap();
    assert!(matches!(
        outcome,
        SaveOutcome::Saved {
            personal_best: true,
            ..
        }
    ));

    let history = client.list_attempts().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].duration_seconds, 1);
}
