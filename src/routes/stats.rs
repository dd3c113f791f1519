use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{ApiError, OrApiError};
use crate::models::{CategoryCount, Stats};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/stats", get(get_stats))
        .route("/api/category-counts", get(get_category_counts))
}

#[tracing::instrument(name = "GET /api/stats", skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    let stats = state
        .pool
        .run(|db| db.stats())
        .await
        .or_api_error("Server error while fetching stats")?;
    Ok(Json(stats))
}

#[tracing::instrument(name = "GET /api/category-counts", skip(state))]
pub async fn get_category_counts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryCount>>, ApiError> {
    let counts = state
        .pool
        .run(|db| db.category_counts())
        .await
        .or_api_error("Server error while fetching category counts")?;
    Ok(Json(counts))
}
