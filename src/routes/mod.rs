use axum::Router;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::state::AppState;

pub mod admin;
pub mod dept;
pub mod report;
pub mod stats;

pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(stats::routes())
        .merge(report::routes(max_upload_bytes))
        .merge(admin::routes())
        .merge(dept::routes())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Accepts an issue id sent either as a JSON number or as a numeric string,
/// which is what HTML forms tend to post.
pub fn issue_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Number(id) => Ok(id),
        Repr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid issue id '{}'", text))),
    }
}
