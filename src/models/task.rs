use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub list_id: String,
    pub origin_backlog_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub order_index: f64,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A completed task joined with the backlog it is tagged with.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedTask {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed_at: String,
    pub origin_backlog_id: Option<String>,
    pub origin_backlog_name: Option<String>,
    pub origin_backlog_color: Option<String>,
}
