use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Organiser {
    pub organiser_id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
}
