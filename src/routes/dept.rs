use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::{issue_id, MessageResponse};
use crate::error::{ApiError, OrApiError};
use crate::models::Issue;
use crate::state::AppState;

const LIST_ERROR: &str = "Server error while fetching department issues";
const STATUS_ERROR: &str = "Server error while updating status";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dept/{name}", get(department_issues))
        // The static segment wins over `{name}`, so a department literally
        // called "status" is listed from here.
        .route(
            "/api/dept/status",
            put(update_status).get(status_department_issues),
        )
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(deserialize_with = "issue_id")]
    pub id: i64,
    pub status: String,
}

#[tracing::instrument(name = "GET /api/dept/{name}", skip(state))]
pub async fn department_issues(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    list_department(&state, name).await
}

#[tracing::instrument(name = "GET /api/dept/status", skip(state))]
async fn status_department_issues(
    State(state): State<AppState>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    list_department(&state, "status".to_string()).await
}

async fn list_department(state: &AppState, name: String) -> Result<Json<Vec<Issue>>, ApiError> {
    let issues = state
        .pool
        .run(move |db| db.list_by_department(&name))
        .await
        .or_api_error(LIST_ERROR)?;
    Ok(Json(issues))
}

#[tracing::instrument(name = "PUT /api/dept/status", skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(StatusRequest { id, status }) = body.or_api_error(STATUS_ERROR)?;

    let updated = state
        .pool
        .run({
            let status = status.clone();
            move |db| db.update_status(id, &status)
        })
        .await
        .or_api_error(STATUS_ERROR)?;

    if !updated {
        tracing::warn!(id, %status, "status update matched no issue");
    }

    Ok(Json(MessageResponse::new("Status updated successfully")))
}
