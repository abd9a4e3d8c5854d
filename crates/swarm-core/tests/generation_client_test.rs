//! HTTP generation client against a mock chat-completions server.

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swarm_core::generation::{
    AzureSettings, ChatMessage, CompletionRequest, GenerationConfig, GenerationError, Generator,
    HttpGenerator, JsonSchema, Provider,
};

fn openai_config(server: &MockServer) -> GenerationConfig {
    GenerationConfig {
        base_url: server.uri(),
        ..GenerationConfig::with_api_key("sk-test")
    }
}

fn request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::system("be brief"), ChatMessage::user("{}")],
        temperature: None,
        schema: None,
    }
}

fn completion(content: &str) -> Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn openai_request_shape_and_decoding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion(r#"{"summary":"ok"}"#)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerator::new(openai_config(&server)).unwrap();
    assert!(client.is_usable());

    let out = client.request_structured_completion(&request()).await.unwrap();
    assert_eq!(out["summary"], "ok");

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["model"], GenerationConfig::DEFAULT_MODEL);
    assert_eq!(body["response_format"], json!({ "type": "json_object" }));
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.2).abs() < 1e-6);
}

#[tokio::test]
async fn schema_and_temperature_override_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"a":1}"#)))
        .mount(&server)
        .await;

    let client = HttpGenerator::new(openai_config(&server)).unwrap();
    let req = CompletionRequest {
        temperature: Some(0.7),
        schema: Some(JsonSchema {
            name: "result".to_string(),
            schema: json!({ "type": "object" }),
            strict: false,
        }),
        ..request()
    };
    client.request_structured_completion(&req).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["response_format"]["type"], "json_schema");
    assert_eq!(body["response_format"]["json_schema"]["name"], "result");
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
}

#[tokio::test]
async fn azure_uses_deployment_url_and_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/chat-dep/chat/completions"))
        .and(query_param("api-version", "2024-02-15-preview"))
        .and(header("api-key", "az-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"x":"y"}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let config = GenerationConfig {
        provider: Provider::Azure,
        azure: AzureSettings {
            endpoint: Some(server.uri()),
            deployment: Some("chat-dep".to_string()),
            api_version: GenerationConfig::DEFAULT_AZURE_API_VERSION.to_string(),
        },
        ..GenerationConfig::with_api_key("az-key")
    };
    let client = HttpGenerator::new(config).unwrap();
    let out = client.request_structured_completion(&request()).await.unwrap();
    assert_eq!(out["x"], "y");
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = HttpGenerator::new(openai_config(&server)).unwrap();
    let err = client.request_structured_completion(&request()).await.unwrap_err();
    match err {
        GenerationError::Transport(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream down"));
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_content_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json at all")))
        .mount(&server)
        .await;

    let client = HttpGenerator::new(openai_config(&server)).unwrap();
    let err = client.request_structured_completion(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Parse(_)));
}

#[tokio::test]
async fn array_content_is_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("[1, 2]")))
        .mount(&server)
        .await;

    let client = HttpGenerator::new(openai_config(&server)).unwrap();
    let err = client.request_structured_completion(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Schema(_)));
}

#[tokio::test]
async fn slow_server_hits_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = GenerationConfig {
        timeout: Duration::from_millis(200),
        ..openai_config(&server)
    };
    let client = HttpGenerator::new(config).unwrap();
    let err = client.request_structured_completion(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
}

#[tokio::test]
async fn missing_key_is_unavailable_without_network() {
    let client = HttpGenerator::new(GenerationConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..GenerationConfig::disabled()
    })
    .unwrap();
    assert!(!client.is_usable());
    let err = client.request_structured_completion(&request()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Unavailable));
}
