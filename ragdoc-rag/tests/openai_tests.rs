//! HTTP-level tests for the OpenAI-compatible gateways.
#![cfg(feature = "openai")]

use std::time::Duration;

use ragdoc_rag::completion::{CompletionProvider, GenerationParams};
use ragdoc_rag::config::{CompletionConfig, EmbeddingConfig};
use ragdoc_rag::embedding::EmbeddingProvider;
use ragdoc_rag::error::{FailureKind, RagError};
use ragdoc_rag::openai::{OpenAICompletionProvider, OpenAIEmbeddingProvider};
use ragdoc_rag::prompt::build_conversation;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedding_config(server: &MockServer) -> EmbeddingConfig {
    EmbeddingConfig {
        api_key: Some("test-key".into()),
        base_url: server.uri(),
        dimensions: 3,
        ..EmbeddingConfig::default()
    }
}

fn completion_config(server: &MockServer) -> CompletionConfig {
    CompletionConfig {
        api_key: Some("test-key".into()),
        base_url: format!("{}/", server.uri()),
        ..CompletionConfig::default()
    }
}

#[tokio::test]
async fn embeds_single_input_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "input": "hello world",
            "model": "text-embedding-3-small"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3] }],
            "model": "text-embedding-3-small"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new(&embedding_config(&server)).unwrap();
    let vector = provider.embed("hello world").await.unwrap();

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    assert_eq!(provider.dimensions(), 3);
}

#[tokio::test]
async fn embedding_error_status_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new(&embedding_config(&server)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();

    assert_eq!(err.failure_kind(), Some(FailureKind::Status(401)));
    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[tokio::test]
async fn embedding_without_vector_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let provider = OpenAIEmbeddingProvider::new(&embedding_config(&server)).unwrap();
    let err = provider.embed("hello").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert_eq!(err.failure_kind(), Some(FailureKind::MalformedResponse));
}

#[tokio::test]
async fn slow_embedding_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [{ "embedding": [0.1, 0.2, 0.3] }] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = EmbeddingConfig { timeout_secs: 1, ..embedding_config(&server) };
    let provider = OpenAIEmbeddingProvider::new(&config).unwrap();
    let err = provider.embed("hello").await.unwrap_err();

    assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
}

#[tokio::test]
async fn completes_with_system_and_user_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "gpt-4.1-nano", "max_tokens": 1000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Yes, according to the context." },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAICompletionProvider::new(&completion_config(&server)).unwrap();
    let params = GenerationParams::from(&completion_config(&server));
    let answer = provider
        .complete(&build_conversation("Rust is safe.", "Is it?"), &params)
        .await
        .unwrap();

    assert_eq!(answer, "Yes, according to the context.");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "Context:\nRust is safe.\n\nQuestion: Is it?\n\nAnswer:");
}

#[tokio::test]
async fn completion_missing_choices_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "chatcmpl-2" })))
        .mount(&server)
        .await;

    let provider = OpenAICompletionProvider::new(&completion_config(&server)).unwrap();
    let err = provider
        .complete(&build_conversation("c", "q"), &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::CompletionError { .. }));
    assert_eq!(err.failure_kind(), Some(FailureKind::MalformedResponse));
}

#[tokio::test]
async fn completion_server_error_is_a_status_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let provider = OpenAICompletionProvider::new(&completion_config(&server)).unwrap();
    let err = provider
        .complete(&build_conversation("c", "q"), &GenerationParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), Some(FailureKind::Status(503)));
    assert!(err.to_string().contains("upstream unavailable"));
}
