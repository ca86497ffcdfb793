use std::sync::Arc;

use phonechat::constants::WARNING_MARKER;
use phonechat::conversation::{ChatEngine, PendingAction, Session, TurnOutcome};
use phonechat::llm_interaction::{GatewayError, LanguageModelGateway, OllamaGateway};
use phonechat::provider::SeriesTableProvider;
use phonechat::sentiment::SentimentClassifier;
use phonechat::transcript::Turn;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(gateway: OllamaGateway) -> ChatEngine {
    ChatEngine::new(
        Arc::new(SeriesTableProvider),
        Arc::new(gateway),
        Arc::new(SentimentClassifier::default()),
    )
}

#[test_log::test(tokio::test)]
async fn test_send_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "mistral", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "mistral",
            "message": {"role": "assistant", "content": "A solid phone."},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = OllamaGateway::new(server.uri(), "mistral");
    let reply = gateway.send(&[Turn::user("iPhone 15")]).await.unwrap();
    assert_eq!(reply, "A solid phone.");
}

#[tokio::test]
async fn test_missing_message_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "model not loaded"})))
        .mount(&server)
        .await;

    let gateway = OllamaGateway::new(server.uri(), "mistral");
    let err = gateway.send(&[Turn::user("hi")]).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_http_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let gateway = OllamaGateway::new(server.uri(), "mistral");
    match gateway.send(&[Turn::user("hi")]).await.unwrap_err() {
        GatewayError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_idle_turn_sends_transcript_and_record_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "Lovely phone!"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(OllamaGateway::new(server.uri(), "mistral"));
    let mut session = Session::new(Some(3));
    let outcome = engine.handle_turn(&mut session, "iPhone 15").await;

    let TurnOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert!(reply.text.starts_with("Lovely phone!\n\n"));
    assert!(reply.gateway_fault.is_none());
    let phone = session.current_phone().unwrap();
    assert_eq!(phone.make, "Apple");
    assert_eq!(phone.series, "iPhone");
    assert!(PendingAction::OPENERS.contains(&session.pending().unwrap()));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1], json!({"role": "user", "content": "iPhone 15"}));
    let prompt = messages[2]["content"].as_str().unwrap();
    assert!(prompt.contains("Here are the phone details:"));
    assert!(prompt.contains("Make: Apple"));
    assert!(!prompt.contains(phone.imei.as_str()));
}

#[tokio::test]
async fn test_connection_fault_never_aborts_the_turn() {
    // Grab a free port and release it so connections are refused.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{}", port);

    let engine = engine(OllamaGateway::new(uri, "mistral"));
    let mut session = Session::new(Some(4));
    let outcome = engine.handle_turn(&mut session, "Galaxy S 24").await;

    let TurnOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert!(reply.text.contains(WARNING_MARKER));
    assert!(matches!(
        reply.gateway_fault.as_deref(),
        Some(fault) if fault.contains("request to")
    ));
    let action = session.pending().expect("a follow-up is still offered");
    assert!(PendingAction::OPENERS.contains(&action));
    assert!(reply.text.ends_with(action.prompt()));
}
