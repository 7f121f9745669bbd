//! HTTP API gateway for huurwijzer.
//!
//! Exposes the chat, reset, health, and contract-upload endpoints over
//! Axum. All conversation state lives in the shared [`ChatService`]; the
//! gateway only translates between HTTP and service calls.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use huurwijzer_assistant::ChatService;
use huurwijzer_config::{AppConfig, GatewayConfig};
use huurwijzer_core::Error;

/// Uploaded contracts are bounded well below this; the limit guards
/// against runaway request bodies.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub service: ChatService,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/reset", post(reset_handler))
        .route("/upload-contract", post(upload_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy from config. `["*"]` opens the gateway to any origin;
/// otherwise only the listed origins are allowed (unparseable entries
/// are skipped with a warning).
fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins = &config.cors_origins;

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Skipping unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let generator = huurwijzer_providers::build_from_config(&config)?;
    let service = ChatService::from_config(&config, generator)?;

    let state = Arc::new(GatewayState { config, service });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "huurwijzer",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /chat": "Send a chat message",
            "POST /reset": "Clear the conversation",
            "POST /upload-contract": "Upload a rental contract (.pdf or .txt) for analysis",
            "GET /health": "Health check",
        },
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    text: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.service.handle_message(&payload.text).await {
        Ok(reply) => Ok(Json(ChatResponse { reply })),
        Err(e) => {
            error!(error = %e, "Chat processing failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to generate a reply".into(),
                }),
            ))
        }
    }
}

#[derive(Serialize)]
struct ResetResponse {
    status: &'static str,
}

async fn reset_handler(State(state): State<SharedState>) -> Json<ResetResponse> {
    state.service.reset().await;
    Json(ResetResponse { status: "reset" })
}

/// Upload response. Failures come back as 200 with an `error` field so
/// browser clients get a uniform JSON body either way.
#[derive(Serialize)]
#[serde(untagged)]
enum UploadResponse {
    Analysis { analysis: String },
    Error { error: String, kind: &'static str },
}

async fn upload_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Json<UploadResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((filename, bytes.to_vec()));
                        break;
                    }
                    Err(e) => {
                        return Json(UploadResponse::Error {
                            error: format!("Failed to read uploaded file: {e}"),
                            kind: "decode_error",
                        });
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Json(UploadResponse::Error {
                    error: format!("Malformed multipart request: {e}"),
                    kind: "decode_error",
                });
            }
        }
    }

    let Some((filename, bytes)) = upload else {
        return Json(UploadResponse::Error {
            error: "No file field in upload".into(),
            kind: "decode_error",
        });
    };

    match state.service.handle_document(&filename, &bytes).await {
        Ok(analysis) => Json(UploadResponse::Analysis { analysis }),
        Err(Error::Document(e)) => Json(UploadResponse::Error {
            error: e.to_string(),
            kind: e.kind(),
        }),
        Err(e) => {
            error!(error = %e, "Contract analysis failed");
            Json(UploadResponse::Error {
                error: "Failed to analyze the contract".into(),
                kind: "generation_failure",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use huurwijzer_core::{GenerateOptions, Generator, GeneratorError};
    use tower::ServiceExt;

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GeneratorError> {
            Ok(format!("{prompt} Hi there!"))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _options: &GenerateOptions,
        ) -> Result<String, GeneratorError> {
            Err(GeneratorError::Network("connection refused".into()))
        }
    }

    fn test_state(generator: Arc<dyn Generator>) -> SharedState {
        let config = AppConfig::default();
        let service = ChatService::from_config(&config, generator).unwrap();
        Arc::new(GatewayState { config, service })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_body(boundary: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(Arc::new(EchoGenerator)));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let app = build_router(test_state(Arc::new(EchoGenerator)));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["name"], "huurwijzer");
        assert!(json["endpoints"].get("POST /chat").is_some());
        assert!(json["endpoints"].get("POST /upload-contract").is_some());
    }

    #[tokio::test]
    async fn chat_roundtrip() {
        let app = build_router(test_state(Arc::new(EchoGenerator)));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"text":"Hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["reply"], "Hi there!");
    }

    #[tokio::test]
    async fn chat_failure_is_500() {
        let app = build_router(test_state(Arc::new(FailingGenerator)));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"text":"Hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn reset_endpoint() {
        let state = test_state(Arc::new(EchoGenerator));
        let app = build_router(state.clone());

        // Seed some history first
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{"text":"Hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(state.service.turn_count().await, 2);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reset")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "reset");
        assert_eq!(state.service.turn_count().await, 0);
    }

    #[tokio::test]
    async fn txt_upload_returns_analysis() {
        let app = build_router(test_state(Arc::new(EchoGenerator)));
        let boundary = "test-boundary";
        let body = multipart_body(boundary, "contract.txt", b"Monthly rent is 1400 euro.");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-contract")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["analysis"], "Hi there!");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn unsupported_upload_is_200_with_error() {
        let state = test_state(Arc::new(EchoGenerator));
        let app = build_router(state.clone());
        let boundary = "test-boundary";
        let body = multipart_body(boundary, "contract.docx", b"PK\x03\x04");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-contract")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("contract.docx"));
        assert_eq!(json["kind"], "unsupported_file_type");
        // Failed uploads leave the conversation untouched
        assert_eq!(state.service.turn_count().await, 0);
    }

    #[tokio::test]
    async fn upload_without_file_is_200_with_error() {
        let app = build_router(test_state(Arc::new(EchoGenerator)));
        let boundary = "test-boundary";
        let body = format!("--{boundary}--\r\n");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-contract")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn failed_analysis_is_200_with_error() {
        let state = test_state(Arc::new(FailingGenerator));
        let app = build_router(state.clone());
        let boundary = "test-boundary";
        let body = multipart_body(boundary, "contract.txt", b"some contract");

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/upload-contract")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["kind"], "generation_failure");
        assert_eq!(state.service.turn_count().await, 0);
    }
}
