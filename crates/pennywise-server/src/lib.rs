//! Pennywise Web Server
//!
//! Axum-based REST API exposing expense evaluation, forecasting and
//! reduction planning. Every request is computed independently from its body;
//! the server holds no per-request state.
//!
//! - Configurable CORS policy
//! - JSON body size limit
//! - Structured error responses with a stable `kind` tag

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

use pennywise_core::AnalysisConfig;

mod handlers;

/// Maximum JSON request body size (5 MB)
pub const MAX_BODY_SIZE: usize = 5 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub analysis: AnalysisConfig,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(analysis: AnalysisConfig, config: ServerConfig) -> Router {
    let cors = cors_layer(&config);
    let state = Arc::new(AppState { analysis, config });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/evaluate", post(handlers::evaluate))
        .route("/predict", post(handlers::predict))
        .route("/suggest", post(handlers::suggest))
        .route("/plan", post(handlers::plan));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if config.allowed_origins.is_empty() {
        base.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        base.allow_origin(origins)
    }
}

/// Start the server
pub async fn serve(analysis: AnalysisConfig, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(analysis, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    analysis: AnalysisConfig,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        info!("CORS: allowing any origin");
    } else {
        info!("CORS: allowing {}", config.allowed_origins.join(", "));
    }

    let app = create_router(analysis, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self {
            kind: "missing_field",
            ..Self::bad_request(&format!("Missing '{}' field", field))
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message,
            "kind": self.kind,
        }));

        (self.status, body).into_response()
    }
}

impl From<pennywise_core::Error> for AppError {
    fn from(err: pennywise_core::Error) -> Self {
        use pennywise_core::Error;

        let status = match &err {
            Error::MalformedInput { .. } | Error::InvalidParameter(_) => {
                Some(StatusCode::BAD_REQUEST)
            }
            Error::NoDataForPeriod { .. } | Error::NoHistory { .. } | Error::EmptyInput(_) => {
                Some(StatusCode::UNPROCESSABLE_ENTITY)
            }
            _ => None,
        };

        match status {
            Some(status) => Self {
                status,
                kind: err.kind(),
                message: err.to_string(),
                internal: None,
            },
            None => Self {
                kind: err.kind(),
                // Return generic message to client, keep full error for logging
                internal: Some(err.into()),
                ..Self::internal("An internal error occurred")
            },
        }
    }
}
