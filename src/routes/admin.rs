use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::{issue_id, MessageResponse};
use crate::error::{ApiError, OrApiError};
use crate::models::Issue;
use crate::state::AppState;

const ASSIGN_ERROR: &str = "Server error while assigning department";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/all-issues", get(all_issues))
        .route("/api/admin/assign", put(assign))
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(deserialize_with = "issue_id")]
    pub id: i64,
    pub department: String,
}

#[tracing::instrument(name = "GET /api/admin/all-issues", skip(state))]
pub async fn all_issues(State(state): State<AppState>) -> Result<Json<Vec<Issue>>, ApiError> {
    let issues = state
        .pool
        .run(|db| db.list_issues())
        .await
        .or_api_error("Server error while fetching issues")?;
    Ok(Json(issues))
}

#[tracing::instrument(name = "PUT /api/admin/assign", skip(state, body))]
pub async fn assign(
    State(state): State<AppState>,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(AssignRequest { id, department }) = body.or_api_error(ASSIGN_ERROR)?;

    let updated = state
        .pool
        .run({
            let department = department.clone();
            move |db| db.assign_department(id, &department)
        })
        .await
        .or_api_error(ASSIGN_ERROR)?;

    if !updated {
        tracing::warn!(id, %department, "assignment matched no issue");
    }

    Ok(Json(MessageResponse::new("Successfully assigned to department")))
}
