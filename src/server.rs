use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::fetch::HttpFetcher;
use crate::model::ReportRequest;

/// Shared handler state: the HTTP client only. Every report build owns its
/// render state, so nothing else crosses requests.
#[derive(Clone, Default)]
pub struct AppState {
    fetcher: HttpFetcher,
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/report", post(generate))
        .with_state(AppState::default())
}

async fn health() -> &'static str {
    "ok"
}

/// Turn a request body into a downloadable PDF. Generation errors surface as
/// a plain-text 500 with the original message; no partial document is ever
/// returned.
async fn generate(State(state): State<AppState>, Json(request): Json<ReportRequest>) -> Response {
    match crate::generate_report(&request, &state.fetcher).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"incident-report.pdf\"",
                ),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            log::error!("report generation failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
