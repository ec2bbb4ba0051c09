use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use tokio::net::TcpListener;
use tonic::Request;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ConfigError;
use crate::http::dto::{HealthBody, QuoteRequestBody, QuoteResponseBody};
use crate::http::error::ApiError;
use crate::quotation::QuotationServiceImpl;
use crate::quotation_proto::quotation_service_server::QuotationService;

pub const SERVICE_NAME: &str = "quotation-service";

/// Bounded wait on the quotation call.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AppState {
    pub quotation: Arc<QuotationServiceImpl>,
    pub quote_timeout: Duration,
}

impl AppState {
    pub fn new(quotation: QuotationServiceImpl) -> Self {
        Self {
            quotation: Arc::new(quotation),
            quote_timeout: DEFAULT_QUOTE_TIMEOUT,
        }
    }
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/quotes", post(create_quote))
        .route("/api/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for a single browser origin, with credentials.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|e| ConfigError::invalid("CORS_ORIGIN", origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

pub async fn serve(listener: TcpListener, router: Router) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "HTTP bridge starting");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn create_quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequestBody>, JsonRejection>,
) -> Result<Json<QuoteResponseBody>, ApiError> {
    let Json(body) = payload?;
    let request = body.into_proto()?;

    let response = tokio::time::timeout(
        state.quote_timeout,
        state.quotation.create_quote(Request::new(request)),
    )
    .await
    .map_err(|_| ApiError::Timeout(state.quote_timeout))??;

    Ok(Json(response.into_inner().into()))
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "UP".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
