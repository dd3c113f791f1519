use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde::Deserialize;

use crate::error::{ApiError, OrApiError};
use crate::models::Issue;
use crate::state::AppState;
use crate::upload::StoredUpload;

const REPORT_ERROR: &str = "Server error while reporting issue";

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/report", post(report))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// A citizen submission before it is stored.
#[derive(Debug, Default, Deserialize)]
pub struct ReportForm {
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub image: Option<ImagePart>,
}

#[derive(Debug)]
pub struct ImagePart {
    pub file_name: String,
    pub bytes: Bytes,
}

#[tracing::instrument(name = "POST /api/report", skip(state, request))]
pub async fn report(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let form = read_form(request, &state).await.or_api_error(REPORT_ERROR)?;

    let stored = match &form.image {
        Some(image) => Some(
            state
                .uploads
                .store(&image.file_name, &image.bytes)
                .await
                .or_api_error(REPORT_ERROR)?,
        ),
        None => None,
    };
    let image_path = stored.as_ref().map(|upload| upload.public_path.clone());

    let ReportForm {
        category,
        description,
        ..
    } = form;
    let issue = state
        .pool
        .run(move |db| {
            db.create_issue(
                category.as_deref(),
                description.as_deref(),
                image_path.as_deref(),
            )
        })
        .await;

    let issue = match issue {
        Ok(issue) => issue,
        Err(err) => {
            if let Some(upload) = &stored {
                discard_upload(upload).await;
            }
            return Err(ApiError::internal(REPORT_ERROR, err));
        }
    };

    tracing::info!(id = issue.id, category = %issue.category, "issue reported");
    Ok((StatusCode::CREATED, Json(issue)))
}

/// Removes an upload whose issue was never stored.
async fn discard_upload(upload: &StoredUpload) {
    match tokio::fs::remove_file(&upload.disk_path).await {
        Ok(()) => tracing::debug!(file = %upload.file_name, "discarded upload of failed report"),
        Err(err) => tracing::error!(
            file = %upload.disk_path.display(),
            "Failed to discard upload of failed report: {}",
            err
        ),
    }
}

/// Reads a submission from a multipart, JSON, or urlencoded body. Only
/// multipart bodies can carry an image.
async fn read_form(request: Request, state: &AppState) -> Result<ReportForm> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state).await?;
        read_multipart(multipart).await
    } else if content_type.starts_with("application/json") {
        let Json(form) = Json::<ReportForm>::from_request(request, state).await?;
        Ok(form)
    } else {
        let Form(form) = Form::<ReportForm>::from_request(request, state).await?;
        Ok(form)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ReportForm> {
    let mut form = ReportForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("category") => form.category = Some(field.text().await?),
            Some("description") => form.description = Some(field.text().await?),
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty, unnamed part when no file was picked.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    form.image = Some(ImagePart { file_name, bytes });
                }
            }
            other => {
                tracing::debug!(field = ?other, "ignoring unknown form field");
            }
        }
    }

    Ok(form)
}
