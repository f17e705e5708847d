//! Integration tests for the Gemini image MCP server.
//!
//! The Gemini API is replaced by a local axum server returning canned
//! `generateContent` responses and recording every request it receives,
//! so the full request/response translation path is exercised without
//! network access or an API key.

use axum::{
    Router,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use gemini_flash_image_mcp::handler::STYLE_TRANSFER_PROMPT;
use gemini_flash_image_mcp::{
    ComposeImagesParams, Config, EditImageParams, GenerateImageParams, ImageInput,
    ImageToolHandler, StyleTransferParams,
};
use std::sync::{Arc, Mutex};

/// 1x1 transparent PNG, base64-encoded.
const PNG_PIXEL: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// One request as seen by the mock API.
#[derive(Debug)]
struct RecordedRequest {
    query: Option<String>,
    body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    body: String,
}

async fn mock_generate(
    State(state): State<MockState>,
    RawQuery(query): RawQuery,
    body: String,
) -> (StatusCode, String) {
    let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { query, body });
    (state.status, state.body.clone())
}

/// Start a mock Gemini endpoint returning `status`/`body` for every call.
///
/// Returns the endpoint URL and the recorded requests.
async fn spawn_mock(
    status: StatusCode,
    body: String,
) -> (String, Arc<Mutex<Vec<RecordedRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        requests: Arc::clone(&requests),
        status,
        body,
    };
    let app = Router::new()
        .route("/v1beta/generate", post(mock_generate))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1beta/generate", addr), requests)
}

fn test_handler(endpoint: String) -> ImageToolHandler {
    ImageToolHandler::new(Config {
        api_key: "test-key".to_string(),
        endpoint,
        server_name: "test-image-server".to_string(),
    })
}

/// A successful response carrying one inline image.
fn one_image_body(data: &str, mime_type: &str) -> String {
    serde_json::json!({
        "candidates": [
            {
                "content": {
                    "parts": [
                        {"text": "here you go"},
                        {"inlineData": {"data": data, "mimeType": mime_type}}
                    ]
                }
            }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn generate_image_end_to_end() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    let reply = handler
        .generate_image(GenerateImageParams {
            prompt: "a red cube".to_string(),
            save_to_file_path: None,
        })
        .await
        .expect("generation should succeed");

    assert_eq!(reply.status, "Generated image");
    assert_eq!(reply.image.mime_type, "image/png");
    assert_eq!(reply.image.data, PNG_PIXEL);
    assert!(reply.data_url.starts_with("data:image/png;base64,"));
    assert!(reply.data_url.ends_with(PNG_PIXEL));
    assert!(reply.saved_path.is_none());

    // One POST with the key as a query parameter and the prompt as the
    // first (and only) part
    let recorded = requests.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].query.as_deref(), Some("key=test-key"));
    let parts = &recorded[0].body["contents"][0]["parts"];
    assert_eq!(parts.as_array().unwrap().len(), 1);
    assert_eq!(parts[0]["text"], "a red cube");
}

#[tokio::test]
async fn generate_image_saves_to_file_with_derived_extension() {
    let (endpoint, _requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out");

    let reply = handler
        .generate_image(GenerateImageParams {
            prompt: "a red cube".to_string(),
            save_to_file_path: Some(target.to_string_lossy().to_string()),
        })
        .await
        .expect("generation should succeed");

    let saved = reply.saved_path.expect("should have saved a file");
    assert!(saved.is_absolute());
    assert!(saved.to_string_lossy().ends_with("out.png"));
    assert_eq!(
        std::fs::read(&saved).unwrap(),
        BASE64.decode(PNG_PIXEL).unwrap()
    );
    assert_eq!(
        reply.status,
        format!("Generated image saved to {}", saved.display())
    );
}

#[tokio::test]
async fn generate_fails_with_status_and_body_on_api_error() {
    let (endpoint, _requests) =
        spawn_mock(StatusCode::TOO_MANY_REQUESTS, "quota exceeded".to_string()).await;
    let handler = test_handler(endpoint);

    let err = handler
        .generate_image(GenerateImageParams {
            prompt: "a red cube".to_string(),
            save_to_file_path: None,
        })
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("429"), "should contain status code: {}", msg);
    assert!(msg.contains("quota exceeded"), "should contain body: {}", msg);
}

#[tokio::test]
async fn generate_fails_when_response_has_no_image() {
    let body = serde_json::json!({
        "candidates": [
            {"content": {"parts": [{"text": "sorry, text only"}]}}
        ]
    })
    .to_string();
    let (endpoint, _requests) = spawn_mock(StatusCode::OK, body).await;
    let handler = test_handler(endpoint);

    let err = handler
        .generate_image(GenerateImageParams {
            prompt: "a red cube".to_string(),
            save_to_file_path: None,
        })
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("No image data"),
        "got: {}",
        err
    );
}

#[tokio::test]
async fn edit_image_sends_prompt_then_image() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    let reply = handler
        .edit_image(EditImageParams {
            prompt: "make it blue".to_string(),
            image: ImageInput {
                data_base64: Some("aW5wdXQ=".to_string()),
                path: None,
                mime_type: Some("image/jpeg".to_string()),
            },
            save_to_file_path: None,
        })
        .await
        .expect("edit should succeed");

    assert_eq!(reply.status, "Edited image");

    let recorded = requests.lock().unwrap();
    let parts = &recorded[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "make it blue");
    assert_eq!(parts[1]["inline_data"]["data"], "aW5wdXQ=");
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
}

#[tokio::test]
async fn compose_rejects_single_image_before_any_http_call() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    let err = handler
        .compose_images(ComposeImagesParams {
            prompt: "merge these".to_string(),
            images: vec![ImageInput {
                data_base64: Some("b25seQ==".to_string()),
                path: None,
                mime_type: None,
            }],
            save_to_file_path: None,
        })
        .await
        .unwrap_err();

    assert!(err.is_validation(), "expected validation error, got {}", err);
    assert_eq!(
        requests.lock().unwrap().len(),
        0,
        "no HTTP request should have been made"
    );
}

#[tokio::test]
async fn compose_sends_images_in_caller_order() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    handler
        .compose_images(ComposeImagesParams {
            prompt: "merge these".to_string(),
            images: vec![
                ImageInput {
                    data_base64: Some("Zmlyc3Q=".to_string()),
                    path: None,
                    mime_type: None,
                },
                ImageInput {
                    data_base64: Some("c2Vjb25k".to_string()),
                    path: None,
                    mime_type: None,
                },
            ],
            save_to_file_path: None,
        })
        .await
        .expect("compose should succeed");

    let recorded = requests.lock().unwrap();
    let parts = &recorded[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "merge these");
    assert_eq!(parts[1]["inline_data"]["data"], "Zmlyc3Q=");
    assert_eq!(parts[2]["inline_data"]["data"], "c2Vjb25k");
}

#[tokio::test]
async fn style_transfer_defaults_prompt_and_orders_base_then_style() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/png")).await;
    let handler = test_handler(endpoint);

    let reply = handler
        .style_transfer(StyleTransferParams {
            prompt: None,
            base_image: ImageInput {
                data_base64: Some("QkFTRQ==".to_string()),
                path: None,
                mime_type: None,
            },
            style_image: ImageInput {
                data_base64: Some("U1RZTEU=".to_string()),
                path: None,
                mime_type: None,
            },
            save_to_file_path: None,
        })
        .await
        .expect("style transfer should succeed");

    assert_eq!(reply.status, "Style transferred image");

    let recorded = requests.lock().unwrap();
    let parts = &recorded[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], STYLE_TRANSFER_PROMPT);
    assert_eq!(parts[1]["inline_data"]["data"], "QkFTRQ==");
    assert_eq!(parts[2]["inline_data"]["data"], "U1RZTEU=");
}

#[tokio::test]
async fn edit_image_reads_path_input_and_saves_jpeg() {
    let (endpoint, requests) =
        spawn_mock(StatusCode::OK, one_image_body(PNG_PIXEL, "image/jpeg")).await;
    let handler = test_handler(endpoint);

    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("input.jpg");
    std::fs::write(&input_path, b"jpeg bytes").unwrap();
    let target = dir.path().join("edited");

    let reply = handler
        .edit_image(EditImageParams {
            prompt: "sharpen".to_string(),
            image: ImageInput {
                data_base64: None,
                path: Some(input_path.to_string_lossy().to_string()),
                mime_type: Some("image/jpeg".to_string()),
            },
            save_to_file_path: Some(target.to_string_lossy().to_string()),
        })
        .await
        .expect("edit should succeed");

    // Path-based input was read and inlined
    let recorded = requests.lock().unwrap();
    let parts = &recorded[0].body["contents"][0]["parts"];
    assert_eq!(
        parts[1]["inline_data"]["data"],
        BASE64.encode(b"jpeg bytes")
    );

    // The jpeg reply derived a .jpg extension on save
    let saved = reply.saved_path.expect("should have saved a file");
    assert!(saved.to_string_lossy().ends_with("edited.jpg"));
    assert!(saved.exists());
}
