//! Completion flow over real HTTP against a mocked chat completions endpoint

mod common;

use std::time::Duration;

use colloquy_common::Error;
use colloquy_conversations::{
    shared, AssistantMessage, ConversationFactory, Message, SharedConversation, SystemMessage,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{completion_body, orchestrator_for, user, COMPLETIONS_PATH};

async fn wait_for_title(conversation: &SharedConversation) -> Option<String> {
    for _ in 0..200 {
        if let Some(title) = conversation.lock().await.title.clone() {
            return Some(title);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

async fn mount_title(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(body_string_contains("title generator"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .with_priority(1)
        .mount(server)
        .await;
}

async fn mount_reply(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer sk-integration"))
        .respond_with(template)
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_first_turn_gets_reply_and_title() {
    let server = MockServer::start().await;
    mount_title(&server, 200, completion_body("Greeting Exchange")).await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion_body("Hi there!")),
    )
    .await;

    let first = user(10, "Hello");
    let conversation = shared(ConversationFactory::new(Some(20)).new_conversation(1, first.clone()));
    let orchestrator = orchestrator_for(&server, Duration::from_secs(500));

    let reply = orchestrator
        .complete(&conversation, &first, 20, None)
        .await
        .expect("completion");

    assert_eq!(reply, AssistantMessage::new(20, "Hi there!", 10));
    assert_eq!(
        conversation.lock().await.messages,
        vec![Message::User(first), Message::Assistant(reply)]
    );

    assert_eq!(
        wait_for_title(&conversation).await.as_deref(),
        Some("Greeting Exchange")
    );

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_system_message_sent_first_on_the_wire() {
    let server = MockServer::start().await;
    mount_title(&server, 200, completion_body("Terse Chat")).await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion_body("Ok.")),
    )
    .await;

    let first = user(10, "Hello");
    let conversation = shared(ConversationFactory::new(None).new_conversation(1, first.clone()));
    let orchestrator = orchestrator_for(&server, Duration::from_secs(500));
    let system = SystemMessage::new("You are terse.");

    orchestrator
        .complete(&conversation, &first, 20, Some(&system))
        .await
        .expect("completion");

    let requests = server.received_requests().await.unwrap_or_default();
    let primary: serde_json::Value = requests
        .iter()
        .map(|r| serde_json::from_slice::<serde_json::Value>(&r.body).unwrap())
        .find(|body| body["messages"][0]["content"] == "You are terse.")
        .expect("primary request recorded");

    assert_eq!(primary["model"], "gpt-3.5-turbo");
    assert_eq!(
        primary["messages"],
        json!([
            {"role": "system", "content": "You are terse."},
            {"role": "user", "content": "Hello"}
        ])
    );
}

#[test_log::test(tokio::test)]
async fn test_slow_endpoint_times_out_without_mutation() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(completion_body("Too late"))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let first = user(10, "Hello");
    let conversation = shared(ConversationFactory::new(None).new_conversation(1, first.clone()));
    let before = conversation.lock().await.clone();
    let orchestrator = orchestrator_for(&server, Duration::from_millis(200));

    let err = orchestrator
        .complete(&conversation, &first, 20, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(*conversation.lock().await, before);
}

#[test_log::test(tokio::test)]
async fn test_provider_error_propagates_without_mutation() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "The server had an error", "type": "server_error"}
        })),
    )
    .await;

    let first = user(10, "Hello");
    let conversation = shared(ConversationFactory::new(None).new_conversation(1, first.clone()));
    let before = conversation.lock().await.clone();
    let orchestrator = orchestrator_for(&server, Duration::from_secs(500));

    let err = orchestrator
        .complete(&conversation, &first, 20, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RemoteCall(ref m) if m.contains("server_error")));
    assert_eq!(*conversation.lock().await, before);
}

#[test_log::test(tokio::test)]
async fn test_failed_title_call_does_not_affect_reply() {
    let server = MockServer::start().await;
    mount_title(
        &server,
        503,
        json!({"error": {"message": "overloaded", "type": "server_error"}}),
    )
    .await;
    mount_reply(
        &server,
        ResponseTemplate::new(200).set_body_json(completion_body("Hi there!")),
    )
    .await;

    let first = user(10, "Hello");
    let conversation = shared(ConversationFactory::new(None).new_conversation(1, first.clone()));
    let orchestrator = orchestrator_for(&server, Duration::from_secs(500));

    let reply = orchestrator
        .complete(&conversation, &first, 20, None)
        .await
        .expect("completion");
    assert_eq!(reply.content, "Hi there!");

    // Give the detached task time to hit the endpoint and fail
    for _ in 0..200 {
        if server.received_requests().await.unwrap_or_default().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let conv = conversation.lock().await;
    assert!(conv.title.is_none());
    assert_eq!(conv.messages.len(), 2);
}
