use serde::{Deserialize, Serialize};

/// Status every new issue starts in.
pub const STATUS_PENDING: &str = "Pending";
/// Status that counts an issue as resolved in the aggregate stats.
pub const STATUS_RESOLVED: &str = "Resolved";
/// Department every new issue starts in.
pub const DEPARTMENT_UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub category: String,
    pub description: String,
    pub status: String,
    pub department: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub resolved: i64,
    /// Everything that is not exactly "Resolved", including unknown statuses.
    pub pending: i64,
}

impl Stats {
    pub fn from_counts(total: i64, resolved: i64) -> Self {
        Stats {
            total,
            resolved,
            pending: total - resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}
