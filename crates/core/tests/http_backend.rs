mod common;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use common::{Recorded, Recorder};
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};
use turn_relay_core::{
    AgentSettings, ClientError, ConversationAgent, ConversationBackend, Endpoint,
    HttpBackendClient, TurnRequest, TurnResult,
    backend::{BACKEND_APOLOGY, TIMEOUT_APOLOGY, UNREACHABLE_APOLOGY},
    endpoint::NoDynamicHost,
    protocol::ConversationRequest,
    turn::SessionContext,
};

type Captured = Arc<Mutex<Option<Value>>>;

/// Serves a fake backend that answers every conversation call with `reply`.
async fn spawn_backend(status: StatusCode, reply: Value, captured: Captured) -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/v1/conversation",
            post(
                move |State(captured): State<Captured>, Json(body): Json<Value>| async move {
                    *captured.lock().unwrap() = Some(body);
                    (status, Json(reply))
                },
            ),
        )
        .route(
            "/health",
            get(|| async { Json(json!({"version": "1.4.2"})) }),
        )
        .with_state(captured);
    serve(app).await
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn agent_for(addr: SocketAddr, timeout: Duration, recorder: Recorder) -> ConversationAgent {
    let mut settings = AgentSettings::for_entry("it");
    settings.configured_host = addr.ip().to_string();
    settings.port = addr.port();
    settings.timeout = timeout;
    ConversationAgent::new(
        settings,
        Arc::new(NoDynamicHost),
        Arc::new(HttpBackendClient::new().unwrap()),
        Arc::new(recorder),
    )
}

fn turn(text: &str) -> TurnRequest {
    TurnRequest::received_now(text, "01JAB", "en")
        .with_device("satellite-1")
        .with_user("user-1")
}

#[tokio::test]
async fn normal_response_end_to_end() {
    let captured = Captured::default();
    let addr = spawn_backend(
        StatusCode::OK,
        json!({"success": true, "data": {"response_type": "normal", "response": "Hello there", "continue_conversation": false}}),
        captured.clone(),
    )
    .await;
    let recorder = Recorder::default();
    let agent = agent_for(addr, Duration::from_secs(5), recorder.clone());

    let result = agent.process(&turn("hello")).await;

    assert_eq!(result, TurnResult::build("Hello there", false));
    assert!(recorder.calls().is_empty());

    let body = captured.lock().unwrap().clone().expect("backend saw the request");
    assert_eq!(body["message"], "hello");
    assert_eq!(body["context"]["session_id"], "voice_01JAB");
    assert_eq!(body["context"]["conversation_id"], "01JAB");
    assert_eq!(body["context"]["device_id"], "satellite-1");
    assert_eq!(body["context"]["voice_interaction"], true);
    assert_eq!(body["context"]["ha_context"]["agent_id"], "turn_relay_it");
    assert_eq!(body["context"]["ha_context"]["user_id"], "user-1");
    assert!(body["context"]["timestamp"].is_string());
}

#[tokio::test]
async fn server_error_status_is_apologised() {
    let addr = spawn_backend(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "boom"}),
        Captured::default(),
    )
    .await;
    let agent = agent_for(addr, Duration::from_secs(5), Recorder::default());

    let result = agent.process(&turn("hello")).await;

    assert_eq!(
        result,
        TurnResult {
            spoken_text: "Something went wrong with my thinking. Please try again.".into(),
            continue_conversation: false,
        }
    );
}

#[tokio::test]
async fn rejected_envelope_is_apologised() {
    let addr = spawn_backend(
        StatusCode::OK,
        json!({"success": false, "error": "model overloaded"}),
        Captured::default(),
    )
    .await;
    let agent = agent_for(addr, Duration::from_secs(5), Recorder::default());

    let result = agent.process(&turn("hello")).await;
    assert_eq!(result.spoken_text, BACKEND_APOLOGY);
    assert!(!result.continue_conversation);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let app = Router::new().route(
        "/api/v1/conversation",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"success": true}))
        }),
    );
    let addr = serve(app).await;
    let agent = agent_for(addr, Duration::from_millis(200), Recorder::default());

    let result = agent.process(&turn("hello")).await;
    assert_eq!(result.spoken_text, TIMEOUT_APOLOGY);
    assert!(!result.continue_conversation);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpBackendClient::new().unwrap();
    let request = turn("hello");
    let body = ConversationRequest::new(&request, &SessionContext::for_turn(&request), "it");
    let err = client
        .send(
            &Endpoint::new(addr.ip().to_string(), addr.port()),
            &body,
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unreachable(_)), "got {err:?}");

    let agent = agent_for(addr, Duration::from_secs(2), Recorder::default());
    assert_eq!(agent.process(&request).await.spoken_text, UNREACHABLE_APOLOGY);
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let app = Router::new().route(
        "/api/v1/conversation",
        post(|| async { "definitely not json" }),
    );
    let addr = serve(app).await;
    let client = HttpBackendClient::new().unwrap();
    let request = turn("hello");
    let body = ConversationRequest::new(&request, &SessionContext::for_turn(&request), "it");

    let err = client
        .send(
            &Endpoint::new(addr.ip().to_string(), addr.port()),
            &body,
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn immediate_speech_over_http() {
    let addr = spawn_backend(
        StatusCode::OK,
        json!({"success": true, "data": {
            "response_type": "immediate_speech_with_background_tools",
            "speech_text": "Dimming the lights",
            "continue_delay": 0
        }}),
        Captured::default(),
    )
    .await;
    let recorder = Recorder::default();
    let agent = agent_for(addr, Duration::from_secs(5), recorder.clone());

    let result = agent.process(&turn("dim the lights")).await;

    assert!(result.continue_conversation);
    assert!(result.spoken_text.trim().is_empty());
    let calls: Vec<Recorded> = recorder.calls().into_iter().map(|(c, _)| c).collect();
    assert_eq!(
        calls,
        vec![
            Recorded::Speak {
                text: "Dimming the lights".into(),
                blocking: false
            },
            Recorded::Alert
        ]
    );
}

#[tokio::test]
async fn health_probe_validates_backend() {
    let addr = spawn_backend(StatusCode::OK, json!({}), Captured::default()).await;
    let agent = agent_for(addr, Duration::from_secs(5), Recorder::default());

    let validated = agent.validate_backend().await.unwrap();
    assert_eq!(validated.version, "1.4.2");
    assert_eq!(validated.title, format!("Turn relay ({}:{})", addr.ip(), addr.port()));
}

#[tokio::test]
async fn health_probe_rejects_non_200() {
    let app = Router::new().route(
        "/health",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "starting") }),
    );
    let addr = serve(app).await;
    let agent = agent_for(addr, Duration::from_secs(5), Recorder::default());

    let err = agent.validate_backend().await.unwrap_err();
    assert!(matches!(err, ClientError::BackendStatus(503)));
}
