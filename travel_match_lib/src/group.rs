use serde::{Deserialize, Serialize};
#[cfg(feature = "sqlx")]
use sqlx::{prelude::*, sqlite::SqliteRow};

pub const DEFAULT_MEMBER_ROLE: &str = "member";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "paid" => PaymentStatus::Paid,
            _ => PaymentStatus::Pending,
        }
    }
}

/// One membership row. A traveler has at most one of these at a time,
/// enforced by a uniqueness constraint on `user_id` in storage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupMember {
    pub group_id: i64,
    pub user_id: i64,
    pub role: String,
    pub confirmed: bool,
    pub payment_status: PaymentStatus,
}

#[cfg(feature = "sqlx")]
impl FromRow<'_, SqliteRow> for GroupMember {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let status: String = row.get(4);

        Ok(Self {
            group_id: row.get(0),
            user_id: row.get(1),
            role: row.get(2),
            confirmed: row.get(3),
            payment_status: PaymentStatus::from_label(&status),
        })
    }
}

impl GroupMember {
    /// Fresh membership as produced by a formation run: unconfirmed, unpaid.
    pub fn new(group_id: i64, user_id: i64) -> Self {
        Self {
            group_id,
            user_id,
            role: DEFAULT_MEMBER_ROLE.to_string(),
            confirmed: false,
            payment_status: PaymentStatus::Pending,
        }
    }
}
