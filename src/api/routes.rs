//! HTTP route handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::llm::{CompletionClient, MistralClient, RetryConfig};
use crate::memory;
use crate::pipeline::{Pipeline, PipelineError, ProcessRequest};
use crate::scrape::{FirecrawlClient, Scraper};

use super::types::{ErrorResponse, HealthResponse};

/// Shared application state.
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Build the collaborators, wire the pipeline, and start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let scraper: Option<Arc<dyn Scraper>> = match config.scrape.api_key.clone() {
        Some(api_key) => Some(Arc::new(FirecrawlClient::new(
            api_key,
            Duration::from_secs(config.scrape.timeout_secs),
        )?)),
        None => {
            tracing::warn!(
                "Scraper disabled (FIRECRAWL_API_KEY not set); captures degrade to user notes"
            );
            None
        }
    };

    let analyzer: Arc<dyn CompletionClient> = Arc::new(MistralClient::with_retry_config(
        config.analyzer.api_key.clone(),
        config.analyzer.model.clone(),
        RetryConfig::with_max_retries(config.analyzer.max_retries),
    ));

    let store = memory::init_store(&config.store);

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(scraper, analyzer, store),
    });

    let app = Router::new()
        .route("/receive_data", post(receive_data))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// POST /receive_data - run one capture through the ingestion pipeline.
///
/// Completed runs answer 200 with the pipeline outcome, including caught
/// store-write failures (`success: false`). Propagated failures map to
/// an HTTP status carrying an error body.
async fn receive_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessRequest>,
) -> Response {
    match state.pipeline.process(&request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => (
            status_for(&err),
            Json(ErrorResponse::new(err.to_string())),
        )
            .into_response(),
    }
}

/// Map a propagated pipeline failure to its HTTP status.
fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidRequest => StatusCode::BAD_REQUEST,
        PipelineError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::AcquisitionFailed(_) | PipelineError::AnalysisFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// GET /health - liveness probe with collaborator readiness.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store_ready: state.pipeline.store_ready(),
        scraper_ready: state.pipeline.scraper_ready(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::ScrapeError;

    #[test]
    fn pipeline_failures_map_to_expected_statuses() {
        assert_eq!(
            status_for(&PipelineError::InvalidRequest),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PipelineError::StoreUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&PipelineError::AcquisitionFailed(ScrapeError::Unsuccessful)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&PipelineError::AnalysisFailed(anyhow::anyhow!("bad json"))),
            StatusCode::BAD_GATEWAY
        );
    }
}
