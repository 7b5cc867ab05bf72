use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Informational record emitted whenever a traveler's standing changes.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub notification_id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
