use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_SPOTS: i64 = 20;

/// A trip offer created by an organiser. `group_id` links it to at most one
/// travel group; it is unset on creation and cleared again when the group is
/// deleted.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: i64,
    pub organiser_id: i64,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: f64,
    pub description: String,
    pub activities: String,
    pub max_spots: i64,
    pub deposit_amount: f64,
    pub group_id: Option<i64>,
}

impl Trip {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trip_id: i64,
        organiser_id: i64,
        destination: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: f64,
        description: String,
        activities: String,
        max_spots: i64,
        deposit_amount: f64,
    ) -> Self {
        Self {
            trip_id,
            organiser_id,
            destination,
            start_date,
            end_date,
            price,
            description,
            activities,
            max_spots,
            deposit_amount,
            group_id: None,
        }
    }
}
