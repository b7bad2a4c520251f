//! OpenAI generator behaviour against a mock chat completions API.

use serde_json::json;
use support_drafter::config::parse_config;
use support_drafter::generation::OpenAIGenerator;
use support_drafter::models::{Category, Sentiment};
use support_drafter::traits::ReplyGenerator;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn generator_for(server: &MockServer) -> OpenAIGenerator {
    let config = parse_config(&format!(
        r#"
[notion]
database_id = "db"

[generation]
api_base = "{}/v1"
model = "gpt-4o-mini"
max_tokens = 400
"#,
        server.uri()
    ))
    .unwrap();
    OpenAIGenerator::new(&config.generation, "test-key").unwrap()
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 80 }
    })
}

#[tokio::test]
async fn test_generate_sends_single_prompt_and_returns_text_verbatim() {
    let server = MockServer::start().await;
    let reply = "Hi! Your parcel left our warehouse yesterday.\n\nSentiment: Neutral\nCategory: Delivery";

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini", "max_tokens": 400 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let generated = generator_for(&server)
        .generate("Order #12345", "Where is my package?")
        .await
        .unwrap();

    assert_eq!(generated.text, reply);
    assert_eq!(generated.sentiment, Some(Sentiment::Neutral));
    assert_eq!(generated.category, Some(Category::Delivery));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    let prompt = messages[0]["content"].as_str().unwrap();
    assert!(prompt.contains("Customer Request: Order #12345"));
    assert!(prompt.contains("Where is my package?"));
}

#[tokio::test]
async fn test_service_error_propagates_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "type": "server_error", "message": "The server had an error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = generator_for(&server)
        .generate("Order", "Where?")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("500"), "{}", err);
}

#[tokio::test]
async fn test_malformed_response_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = generator_for(&server)
        .generate("Order", "Where?")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("choices"), "{}", err);
}
