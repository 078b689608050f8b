//! HTTP gateway for Folio.
//!
//! Exposes the persona chat endpoints consumed by the portfolio frontend:
//! - `POST /chat`
//! - `POST /persona-chat-update`
//! - `GET /get-persona`
//! - `GET /health`
//!
//! Built on Axum; CORS, body limits and request tracing come from tower-http
//! layers.

pub mod error;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use folio_config::{AppConfig, CredentialError};
use folio_core::ProviderError;
use folio_persona::PersonaStore;
use folio_providers::{DeadlineProvider, OpenAiCompatProvider};
use folio_security::OriginPolicy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::error::ApiError;

/// Request bodies above this size are refused before reaching a handler.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub provider: Arc<dyn folio_core::Provider>,
    pub store: PersonaStore,
    /// Outcome of the credential check, computed once at startup.
    pub credentials: Result<(), CredentialError>,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(config: AppConfig, provider: Arc<dyn folio_core::Provider>, store: PersonaStore) -> Self {
        let credentials = config.credentials().map(|_| ());
        Self {
            config,
            provider,
            store,
            credentials,
            started_at: Utc::now(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.config.environment.is_production()
    }

    /// Refuse work that needs the completion API when no usable key is set.
    pub fn check_credentials(&self) -> Result<(), ApiError> {
        self.credentials
            .as_ref()
            .map_err(|e| ApiError::from_credentials(e, self.is_production()))
            .copied()
    }
}

/// Build the Axum router with all gateway routes and layers.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.allowed_origins);

    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/persona-chat-update", post(handlers::persona_chat_update))
        .route("/get-persona", get(handlers::get_persona))
        .route("/health", get(health_handler))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins. `*` mirrors the request origin so that
/// credentials can still be allowed.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let policy = OriginPolicy::from_origins(origins);
    let allow_origin = if policy.is_any() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::predicate(move |origin: &HeaderValue, _parts| {
            origin.to_str().is_ok_and(|o| policy.allows(o))
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-requested-with")])
        .max_age(Duration::from_secs(86_400))
}

/// The completion provider for `config`, authenticated with the same
/// normalized key the credential check accepted.
pub fn build_provider(config: &AppConfig) -> Result<DeadlineProvider, ProviderError> {
    let http = OpenAiCompatProvider::with_timeout(
        "huggingface",
        config.provider.api_url.clone(),
        config.credentials().unwrap_or_default(),
        config.provider.timeout(),
    )?;
    Ok(DeadlineProvider::new(Arc::new(http), config.provider.timeout()))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    if let Err(e) = config.credentials() {
        warn!(error = %e, "Completion API credentials unusable; chat endpoints will answer 500");
    }

    let provider = Arc::new(build_provider(&config)?);

    let store = PersonaStore::new(config.persona.path.clone());
    if store.ensure_exists().await? {
        info!(path = %store.path().display(), "Initialized persona file");
    }

    let state = Arc::new(GatewayState::new(config, provider, store));
    let app = build_router(state.clone());

    info!(
        addr = %addr,
        environment = %state.config.environment,
        model = %state.config.provider.model,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.")
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Not found.")
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds().max(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use folio_config::Environment;
    use folio_core::error::ProviderError;
    use folio_core::message::{Message, Role};
    use folio_core::provider::{ProviderRequest, ProviderResponse};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Returns a canned result and records every request.
    struct MockProvider {
        result: Result<String, ProviderError>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl MockProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(err),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl folio_core::Provider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.result.clone().map(|content| ProviderResponse {
                message: Message::assistant(content),
                usage: None,
                model: "mock-model".into(),
            })
        }
    }

    /// Never answers.
    struct HangingProvider;

    #[async_trait]
    impl folio_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            std::future::pending().await
        }
    }

    fn test_config() -> AppConfig {
        AppConfig {
            api_key: Some("hf_abcdefghijkl".into()),
            ..AppConfig::default()
        }
    }

    fn test_state(
        dir: &tempfile::TempDir,
        config: AppConfig,
        provider: Arc<dyn folio_core::Provider>,
    ) -> SharedState {
        let store = PersonaStore::new(dir.path().join("persona_data.json"));
        Arc::new(GatewayState::new(config, provider, store))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(state: SharedState, req: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, test_config(), MockProvider::replying("x"));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn chat_returns_cleaned_escaped_reply() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("<think>pensando</think><b>Olá</b>, tudo bem?");
        let state = test_state(&dir, test_config(), provider.clone());

        let (status, body) = send(state, post_json("/chat", json!({"message": "  Oi!  "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "&lt;b&gt;Olá&lt;&#x2F;b&gt;, tudo bem?");

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "deepseek-ai/DeepSeek-R1");
        assert_eq!(request.max_tokens, Some(1000));
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Minha Persona:"));
        assert_eq!(request.messages[1].content, "Oi!");
    }

    #[tokio::test]
    async fn chat_rejects_missing_and_empty_messages() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("x");
        let state = test_state(&dir, test_config(), provider.clone());

        let (status, body) = send(state.clone(), post_json("/chat", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or empty message.");

        let (status, body) = send(state.clone(), post_json("/chat", json!({"message": 7}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or empty message.");

        let (status, body) = send(state, post_json("/chat", json!({"message": "\u{7}  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message cannot be empty after sanitization.");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn chat_message_length_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("ok");
        let state = test_state(&dir, test_config(), provider.clone());

        let (status, _) = send(state.clone(), post_json("/chat", json!({"message": "a".repeat(2000)}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(state, post_json("/chat", json!({"message": "a".repeat(2001)}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message too long. Maximum of 2000 characters.");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, test_config(), MockProvider::replying("x"));

        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(state.clone(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or missing request body.");

        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .body(Body::from(r#"{"message":"Oi"}"#))
            .unwrap();
        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Content-Type must be application/json.");
    }

    #[tokio::test]
    async fn missing_credentials_refuse_before_calling_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("x");
        let state = test_state(&dir, AppConfig::default(), provider.clone());

        let (status, body) = send(state, post_json("/chat", json!({"message": "Oi"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration incomplete.");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_credentials_refuse_updates() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("{}");
        let config = AppConfig {
            api_key: Some("sk-not-a-hf-token".into()),
            ..AppConfig::default()
        };
        let state = test_state(&dir, config, provider.clone());

        let (status, body) = send(state, post_json("/persona-chat-update", json!({"text": "Sou Ana"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration invalid.");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_upstream_times_out_with_504() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(DeadlineProvider::new(Arc::new(HangingProvider), Duration::from_secs(30)));
        let state = test_state(&dir, test_config(), provider);

        let (status, body) = send(state, post_json("/chat", json!({"message": "Oi"}))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().contains("Response time exceeded"));
    }

    #[tokio::test]
    async fn upstream_failures_map_to_statuses() {
        let cases = [
            (
                ProviderError::ApiError { status_code: 502, message: "bad gateway".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ProviderError::ApiError { status_code: 429, message: "slow down".into() },
                StatusCode::BAD_REQUEST,
            ),
            (ProviderError::Network("refused".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ProviderError::InvalidResponse("empty".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let dir = tempfile::tempdir().unwrap();
            let state = test_state(&dir, test_config(), MockProvider::failing(err));
            let (status, body) = send(state, post_json("/chat", json!({"message": "Oi"}))).await;
            assert_eq!(status, expected);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn production_hides_upstream_details() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            environment: Environment::Production,
            ..test_config()
        };
        let provider = MockProvider::failing(ProviderError::ApiError {
            status_code: 503,
            message: "internal trace id 1234".into(),
        });
        let state = test_state(&dir, config, provider);

        let (status, body) = send(state, post_json("/chat", json!({"message": "Oi"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("1234"));
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn persona_update_merges_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying(
            "<think>O usuário se chama Ana.</think>\n{\"nomeCompleto\": \"Ana\", \"interesses\": [\"xadrez\"]}",
        );
        let state = test_state(&dir, test_config(), provider.clone());

        let (status, body) = send(
            state.clone(),
            post_json("/persona-chat-update", json!({"text": "Meu nome é Ana, adoro xadrez."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["persona"]["nomeCompleto"], "Ana");
        assert_eq!(body["persona"]["interesses"], json!(["xadrez"]));
        assert_eq!(body["persona"]["tomDeVoz"], "Neutro");

        let stored = state.store.read().await.unwrap();
        assert_eq!(stored.get("nomeCompleto"), Some(&json!("Ana")));
        assert_eq!(stored.get("descricaoCurta"), Some(&json!("Um assistente virtual prestativo.")));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].temperature, 0.3);
        assert_eq!(seen[0].max_tokens, Some(500));
        assert!(seen[0].messages[0].content.ends_with("\"Meu nome é Ana, adoro xadrez.\"\n"));
    }

    #[tokio::test]
    async fn persona_update_with_unparseable_reply_keeps_persona() {
        let dir = tempfile::tempdir().unwrap();
        let raw = "<think>hmm</think>Não consegui extrair nada.";
        let config = AppConfig {
            environment: Environment::Production,
            ..test_config()
        };
        let state = test_state(&dir, config, MockProvider::replying(raw));

        let (status, body) = send(state.clone(), post_json("/persona-chat-update", json!({"text": "oi"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"], raw);
        assert!(!state.store.path().exists());
    }

    #[tokio::test]
    async fn get_persona_returns_sanitized_view() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, test_config(), MockProvider::replying("x"));
        let persona = folio_persona::Persona::from_value(json!({
            "nomeCompleto": "Ana\u{0}",
            "<script>": "x",
            "interesses": ["xadrez", 1],
            "apelido": null
        }))
        .unwrap();
        state.store.write(&persona).await.unwrap();

        let req = Request::builder().uri("/get-persona").body(Body::empty()).unwrap();
        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"nomeCompleto": "Ana", "script": "x", "interesses": ["xadrez"]})
        );
    }

    #[tokio::test]
    async fn cors_mirrors_allowed_origin_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.gateway.allowed_origins = vec!["https://portfolio.example".into()];
        let state = test_state(&dir, config, MockProvider::replying("x"));

        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header("origin", origin)
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap()
        };

        let response = build_router(state.clone())
            .oneshot(preflight("https://portfolio.example"))
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "https://portfolio.example"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
        assert_eq!(headers.get("access-control-max-age").unwrap(), "86400");

        let response = build_router(state).oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn wildcard_origin_is_mirrored() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, test_config(), MockProvider::replying("x"));
        let req = Request::builder()
            .uri("/health")
            .header("origin", "https://anywhere.example")
            .body(Body::empty())
            .unwrap();

        let response = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://anywhere.example"
        );
    }

    #[tokio::test]
    async fn padded_key_is_sent_trimmed_upstream() {
        let upstream = Router::new().route(
            "/v1/chat/completions",
            post(|headers: axum::http::HeaderMap| async move {
                let auth = headers["authorization"].to_str().unwrap().to_string();
                Json(json!({
                    "model": "mock-model",
                    "choices": [{"message": {"role": "assistant", "content": auth}}]
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let mut config = AppConfig {
            api_key: Some("  hf_abcdefghijkl\n".into()),
            ..AppConfig::default()
        };
        config.provider.api_url = format!("http://{addr}/v1");
        let provider = Arc::new(build_provider(&config).unwrap());
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, config, provider);

        let (status, body) = send(state, post_json("/chat", json!({"message": "Oi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Bearer hf_abcdefghijkl");
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::replying("x");
        let state = test_state(&dir, test_config(), provider.clone());
        let req = Request::builder().uri("/chat").body(Body::empty()).unwrap();

        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed."}));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, test_config(), MockProvider::replying("x"));
        let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();

        let (status, body) = send(state, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Not found."}));
    }
}
