use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

use crate::vibe::VibeScores;

/// Period label that matches every other period.
pub const FLEXIBLE_PERIOD: &str = "Flexible";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TravelerProfile {
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub age: i64,
    pub budget_min: i64,
    pub budget_max: i64,
    pub travel_period: Vec<String>,
    pub vibes: VibeScores,
    pub linked_buddy_id: Option<i64>,
    pub is_active: bool,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for TravelerProfile {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let period_blob: Vec<u8> = row.get(5);
        let travel_period = if period_blob.is_empty() {
            Vec::new()
        } else {
            bincode::deserialize::<Vec<String>>(&period_blob)
                .map_err(|err| sqlx::Error::ColumnDecode {
                    index: "travel_period".to_string(),
                    source: err,
                })?
        };

        let vibe_blob: Vec<u8> = row.get(6);
        let vibes = if vibe_blob.is_empty() {
            VibeScores::neutral()
        } else {
            bincode::deserialize::<VibeScores>(&vibe_blob)
                .map_err(|err| sqlx::Error::ColumnDecode {
                    index: "vibes".to_string(),
                    source: err,
                })?
        };

        Ok(Self {
            user_id: row.get(0),
            created_at: row.get(1),
            age: row.get(2),
            budget_min: row.get(3),
            budget_max: row.get(4),
            travel_period,
            vibes,
            linked_buddy_id: row.get(7),
            is_active: row.get(8),
        })
    }
}

impl TravelerProfile {
    pub fn new(
        user_id: i64,
        created_at: DateTime<Utc>,
        age: i64,
        budget_min: i64,
        budget_max: i64,
        travel_period: Vec<String>,
        vibes: VibeScores,
        linked_buddy_id: Option<i64>,
    ) -> Self {
        Self {
            user_id,
            created_at,
            age,
            budget_min,
            budget_max,
            travel_period,
            vibes,
            linked_buddy_id,
            is_active: true,
        }
    }

    pub fn travel_period_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.travel_period).unwrap_or_default()
    }

    pub fn vibes_blob(&self) -> Vec<u8> {
        bincode::serialize(&self.vibes).unwrap_or_default()
    }

    pub fn is_flexible(&self) -> bool {
        self.travel_period.iter().any(|p| p == FLEXIBLE_PERIOD)
    }
}

/// True when either traveler is flexible or the two period sets intersect.
pub fn periods_overlap(a: &TravelerProfile, b: &TravelerProfile) -> bool {
    if a.is_flexible() || b.is_flexible() {
        return true;
    }
    a.travel_period.iter().any(|p| b.travel_period.contains(p))
}
