//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::core::config::AdvisorConfig;
use crate::core::errors::{AdvisorError, ErrorKind, ExtractionError};
use crate::core::models::{DocumentLanguage, Language, Query};
use crate::core::orchestrator::AnswerOrchestrator;
use crate::core::prompt::PRIVACY_NOTICE;
use crate::core::usage_tracker::UsageTracker;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnswerOrchestrator>,
    pub usage: UsageTracker,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Question about an optional document
#[derive(Deserialize, ToSchema)]
pub struct QueryRequest {
    pub question: String,
    /// Plain document text
    #[serde(default)]
    pub document_content: Option<String>,
    /// Language code of the document, or `auto`
    #[serde(default)]
    pub document_language: Option<String>,
    /// Language code the answer is returned in
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// Answer with its confidence label
#[derive(Serialize, ToSchema)]
pub struct QueryResponse {
    pub response: String,
    /// One of `High`, `Medium`, `Low`
    pub confidence: String,
    pub privacy: String,
}

/// Usage counters
#[derive(Serialize, ToSchema)]
pub struct UsageResponse {
    pub daily_limit: usize,
    pub daily_queries: usize,
    pub remaining: usize,
    pub total_queries: usize,
    pub document_uploads: usize,
    pub errors: usize,
    pub language_usage: BTreeMap<String, usize>,
    pub last_reset: String,
}

/// Error response
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

/// Error returned by handlers, rendered as [`ErrorResponse`]
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        let status = match (&err, err.kind()) {
            (AdvisorError::Document(ExtractionError::TooLarge { .. }), _) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            (_, ErrorKind::BadInput) | (_, ErrorKind::DocumentError) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::DailyLimit) => StatusCode::TOO_MANY_REQUESTS,
            (_, ErrorKind::ServiceUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            code: err.code(),
            message: err.user_message(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self {
                status,
                code: ErrorKind::DocumentError.code(),
                message: "The document is too large. Please upload a smaller file.".to_string(),
            }
        } else {
            debug!(rejection = %rejection.body_text(), "rejected request body");
            Self {
                status: StatusCode::BAD_REQUEST,
                code: ErrorKind::BadInput.code(),
                message: "Invalid request: a question is required.".to_string(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.message,
                code: self.code.to_string(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health_check, query, usage),
    components(schemas(
        HealthResponse,
        QueryRequest,
        QueryResponse,
        UsageResponse,
        ErrorResponse,
        ErrorDetail
    ))
)]
pub struct ApiDoc;

/// Health check handler
#[utoipa::path(get, path = "/", responses((status = 200, body = HealthResponse)))]
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Answer a question
#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, body = QueryResponse),
        (status = 400, body = ErrorResponse),
        (status = 413, body = ErrorResponse),
        (status = 429, body = ErrorResponse),
        (status = 503, body = ErrorResponse)
    )
)]
async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload?;
    state.usage.try_reserve().await?;

    let query = match build_query(payload) {
        Ok(query) => query,
        Err(e) => {
            state.usage.release().await;
            state.usage.record_error().await;
            return Err(e.into());
        }
    };
    if query.document.is_some() {
        state.usage.record_document_upload().await;
    }

    match state.orchestrator.answer(&query).await {
        Ok(answer) => {
            state.usage.record_query(query.preferred_lang).await;
            Ok(Json(QueryResponse {
                response: answer.response,
                confidence: answer.confidence.to_string(),
                privacy: PRIVACY_NOTICE.to_string(),
            }))
        }
        Err(e) => {
            warn!(code = e.code(), error = %e, "query failed");
            state.usage.release().await;
            state.usage.record_error().await;
            Err(e.into())
        }
    }
}

/// Usage statistics
#[utoipa::path(get, path = "/usage", responses((status = 200, body = UsageResponse)))]
async fn usage(State(state): State<Arc<AppState>>) -> Json<UsageResponse> {
    let stats = state.usage.get_stats().await;
    Json(UsageResponse {
        daily_limit: stats.daily_limit,
        daily_queries: stats.daily_queries,
        remaining: stats.remaining(),
        total_queries: stats.total_queries,
        document_uploads: stats.document_uploads,
        errors: stats.errors,
        language_usage: stats.language_usage,
        last_reset: stats.last_reset.to_rfc3339(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn build_query(payload: QueryRequest) -> Result<Query, AdvisorError> {
    let preferred = match payload.preferred_language.as_deref() {
        Some(code) => code
            .parse::<Language>()
            .map_err(|e| AdvisorError::bad_input(e.to_string()))?,
        None => Language::default(),
    };

    let mut query = Query::new(payload.question).with_preferred_lang(preferred);
    if let Some(document) = payload.document_content {
        let lang = match payload.document_language.as_deref() {
            Some(code) => code
                .parse::<DocumentLanguage>()
                .map_err(|e| AdvisorError::bad_input(e.to_string()))?,
            None => DocumentLanguage::Auto,
        };
        query = query.with_document(document, lang);
    }
    Ok(query)
}

/// Build the router. `body_limit` caps request bodies in bytes.
pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/query", post(query))
        .route("/usage", get(usage))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(config: AdvisorConfig, host: String, port: u16) -> anyhow::Result<()> {
    let orchestrator = Arc::new(AnswerOrchestrator::from_config(&config)?);
    let state = Arc::new(AppState {
        orchestrator,
        usage: UsageTracker::from_config(&config),
    });

    // Leave room for the JSON envelope around the document
    let app = router(state, config.max_upload_bytes as usize + 64 * 1024);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
