//! Servidor web Axum que expõe o pipeline de anotação em JSON

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use nlp_core::{DocView, ErrorKind, Language, NlpError, Pipeline, ProcessOptions, StageMode};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Estado compartilhado da aplicação. Os estágios de cada pipeline só são
/// carregados no primeiro texto que precisa deles.
struct AppState {
    english: Pipeline,
    portuguese: Pipeline,
}

impl AppState {
    fn pipeline(&self, language: Language) -> &Pipeline {
        match language {
            Language::English => &self.english,
            Language::Portuguese => &self.portuguese,
        }
    }
}

#[derive(Deserialize)]
struct AnnotateRequest {
    text: String,
    #[serde(default)]
    language: Language,
    #[serde(default = "default_tag")]
    tag: bool,
    #[serde(default)]
    parse: StageMode,
    #[serde(default)]
    entity: StageMode,
    #[serde(default)]
    merge_multiword: bool,
}

fn default_tag() -> bool {
    true
}

impl AnnotateRequest {
    fn options(&self) -> ProcessOptions {
        ProcessOptions {
            tag: self.tag,
            parse: self.parse,
            entity: self.entity,
            merge_multiword: self.merge_multiword,
        }
    }
}

#[derive(Serialize)]
struct AnnotateResponse {
    #[serde(flatten)]
    doc: DocView,
    total_tokens: usize,
    processing_ms: u64,
}

#[derive(Deserialize)]
struct TagsQuery {
    #[serde(default)]
    language: Language,
}

/// Erro devolvido ao cliente como `{"error": ..., "kind": ...}`.
struct ApiError {
    status: StatusCode,
    kind: Option<ErrorKind>,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: None,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: None,
            message: message.into(),
        }
    }
}

impl From<NlpError> for ApiError {
    fn from(err: NlpError) -> Self {
        let kind = err.kind();
        let status = match kind {
            ErrorKind::ArgumentIncompatibility | ErrorKind::MalformedInput => StatusCode::BAD_REQUEST,
            ErrorKind::ModelNotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidTransition | ErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: Some(kind),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(error = %self.message, "falha ao anotar");
        }
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(AppState {
        english: Pipeline::english()?,
        portuguese: Pipeline::portuguese()?,
    });

    let addr = std::env::var("NLP_WEB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Servidor de anotação iniciado em http://{addr}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/tags", get(tags_handler))
        .route("/annotate", post(annotate_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Tag set do idioma pedido (`?language=portuguese`).
async fn tags_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TagsQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let handle = tokio::task::spawn_blocking(move || state.pipeline(query.language).tag_names());
    handle
        .await
        .map(Json)
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Anotação via HTTP POST.
async fn annotate_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnnotateRequest>,
) -> Result<Json<AnnotateResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("Texto vazio"));
    }
    info!(language = req.language.name(), bytes = req.text.len(), "anotando texto");

    // O pipeline é síncrono: roda fora do runtime async
    let handle = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let doc = state.pipeline(req.language).process(&req.text, req.options())?;
        Ok::<_, NlpError>((doc.to_view(), started.elapsed()))
    });
    let (doc, elapsed) = handle
        .await
        .map_err(|e| ApiError::internal(e.to_string()))??;

    Ok(Json(AnnotateResponse {
        total_tokens: doc.tokens.len(),
        processing_ms: elapsed.as_millis() as u64,
        doc,
    }))
}
