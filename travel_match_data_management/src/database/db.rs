use std::path::{Path, PathBuf};

use chrono::Utc;
use const_format::concatcp;
use sqlx::{query, query_as, sqlite::SqliteConnectOptions, Executor, Pool, Sqlite, SqliteConnection, SqlitePool};
use travel_match_lib::{
    formation::FormedGroup,
    group::{GroupMember, PaymentStatus, DEFAULT_MEMBER_ROLE},
    notification::Notification,
    organiser::Organiser,
    profile::TravelerProfile,
    trip::Trip,
};

use crate::{DataManagerError, DATABASE_PATH};

use super::constants::*;

fn map_insert_err(context: &str) -> impl Fn(sqlx::Error) -> DataManagerError + '_ {
    move |err| match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DataManagerError::DuplicateAssignment
        }
        _ => DataManagerError::Database(format!("Failed to {context}")),
    }
}

#[derive(Clone)]
pub struct MatchDatabase {
    pool: Pool<Sqlite>,
}

impl MatchDatabase {
    pub async fn connect() -> Result<Self, DataManagerError> {
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::Database("Failed to locate project root".to_string()))?;
        Self::connect_at(root.join(DATABASE_PATH)).await
    }

    pub async fn connect_at(path: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await
            .map_err(|_| DataManagerError::Database("Failed to connect to database".to_string()))?;

        let db = Self {
            pool
        };

        db.init().await?;

        Ok(db)
    }

    pub async fn init(&self) -> Result<(), DataManagerError> {
        // The UNIQUE constraints on GroupMembers.user_id and Trips.group_id
        // are the storage-layer guards: at most one membership per traveler,
        // at most one trip per group.
        self.pool.execute(concatcp!("
            CREATE TABLE IF NOT EXISTS ", PROFILES_TABLE_NAME, "(",
                USER_ID,         " INTEGER PRIMARY KEY,",
                CREATED_AT,      " TIMESTAMP NOT NULL,",
                AGE,             " INTEGER NOT NULL,",
                BUDGET_MIN,      " INTEGER NOT NULL,",
                BUDGET_MAX,      " INTEGER NOT NULL,",
                TRAVEL_PERIOD,   " BLOB NOT NULL,",
                VIBES,           " BLOB NOT NULL,",
                LINKED_BUDDY_ID, " INTEGER,",
                IS_ACTIVE,       " BOOLEAN NOT NULL DEFAULT TRUE);

            CREATE TABLE IF NOT EXISTS ", GROUP_MEMBERS_TABLE_NAME, "(",
                GROUP_ID,       " INTEGER NOT NULL,",
                USER_ID,        " INTEGER NOT NULL UNIQUE,",
                ROLE,           " TEXT NOT NULL,",
                CONFIRMED,      " BOOLEAN NOT NULL,",
                PAYMENT_STATUS, " TEXT NOT NULL);

            CREATE TABLE IF NOT EXISTS ", TRIPS_TABLE_NAME, "(",
                TRIP_ID,        " INTEGER PRIMARY KEY AUTOINCREMENT,",
                ORGANISER_ID,   " INTEGER NOT NULL,",
                DESTINATION,    " TEXT NOT NULL,",
                START_DATE,     " DATE NOT NULL,",
                END_DATE,       " DATE NOT NULL,",
                PRICE,          " REAL NOT NULL,",
                DESCRIPTION,    " TEXT NOT NULL,",
                ACTIVITIES,     " TEXT NOT NULL,",
                MAX_SPOTS,      " INTEGER NOT NULL DEFAULT 20,",
                DEPOSIT_AMOUNT, " REAL NOT NULL DEFAULT 0.0,",
                GROUP_ID,       " INTEGER UNIQUE);

            CREATE TABLE IF NOT EXISTS ", ORGANISERS_TABLE_NAME, "(",
                ORGANISER_ID, " INTEGER PRIMARY KEY AUTOINCREMENT,",
                CREATED_AT,   " TIMESTAMP NOT NULL,",
                NAME,         " TEXT NOT NULL,",
                EMAIL,        " TEXT NOT NULL UNIQUE);

            CREATE TABLE IF NOT EXISTS ", NOTIFICATIONS_TABLE_NAME, "(",
                NOTIFICATION_ID, " INTEGER PRIMARY KEY AUTOINCREMENT,",
                USER_ID,         " INTEGER NOT NULL,",
                MESSAGE,         " TEXT NOT NULL,",
                IS_READ,         " BOOLEAN NOT NULL DEFAULT FALSE,",
                CREATED_AT,      " TIMESTAMP NOT NULL)")).await
            .map_err(|_| DataManagerError::Database("Failed to initialize database schema".to_string()))?;

        Ok(())
    }

    pub async fn insert_profile(&self, profile: &TravelerProfile) -> Result<(), DataManagerError> {
        query(concatcp!("
            INSERT INTO ", PROFILES_TABLE_NAME, "(",
            USER_ID, ", ", CREATED_AT, ", ", AGE, ", ", BUDGET_MIN, ", ", BUDGET_MAX, ", ",
            TRAVEL_PERIOD, ", ", VIBES, ", ", LINKED_BUDDY_ID, ", ", IS_ACTIVE, ")
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"))
                .bind(profile.user_id)
                .bind(profile.created_at)
                .bind(profile.age)
                .bind(profile.budget_min)
                .bind(profile.budget_max)
                .bind(profile.travel_period_blob())
                .bind(profile.vibes_blob())
                .bind(profile.linked_buddy_id)
                .bind(profile.is_active)
                .execute(&self.pool).await
                .map_err(map_insert_err("insert profile"))
                .map(|_| ())
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<TravelerProfile>, DataManagerError> {
        query_as::<_, TravelerProfile>(concatcp!("SELECT * FROM ", PROFILES_TABLE_NAME, " WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get profile".to_string()))
    }

    pub async fn get_profiles(&self) -> Result<Vec<TravelerProfile>, DataManagerError> {
        query_as::<_, TravelerProfile>(concatcp!("SELECT * FROM ", PROFILES_TABLE_NAME, " ORDER BY ", USER_ID))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get profiles".to_string()))
    }

    /// Active travelers without a group membership, in stable user id order.
    pub async fn get_eligible_profiles(&self) -> Result<Vec<TravelerProfile>, DataManagerError> {
        query_as::<_, TravelerProfile>(concatcp!("
            SELECT * FROM ", PROFILES_TABLE_NAME, "
            WHERE ", IS_ACTIVE, " = TRUE
            AND ", USER_ID, " NOT IN (SELECT ", USER_ID, " FROM ", GROUP_MEMBERS_TABLE_NAME, ")
            ORDER BY ", USER_ID))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get eligible profiles".to_string()))
    }

    pub async fn set_profile_active(&self, user_id: i64, active: bool) -> Result<(), DataManagerError> {
        query(concatcp!("UPDATE ", PROFILES_TABLE_NAME, " SET ", IS_ACTIVE, " = ?1 WHERE ", USER_ID, " = ?2"))
            .bind(active)
            .bind(user_id)
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to set profile active".to_string()))
            .map(|_| ())
    }

    /// 0 when no group exists yet.
    pub async fn max_group_id(&self) -> Result<i64, DataManagerError> {
        query_as::<_, (i64,)>(concatcp!("SELECT COALESCE(MAX(", GROUP_ID, "), 0) FROM ", GROUP_MEMBERS_TABLE_NAME))
            .fetch_one(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get max group id".to_string()))
            .map(|row| row.0)
    }

    pub async fn get_group_ids(&self) -> Result<Vec<i64>, DataManagerError> {
        query_as::<_, (i64,)>(concatcp!("SELECT DISTINCT ", GROUP_ID, " FROM ", GROUP_MEMBERS_TABLE_NAME, " ORDER BY ", GROUP_ID))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get group ids".to_string()))
            .map(|rows| rows.into_iter().map(|row| row.0).collect())
    }

    pub async fn get_group_members(&self, group_id: i64) -> Result<Vec<GroupMember>, DataManagerError> {
        query_as::<_, GroupMember>(concatcp!("SELECT * FROM ", GROUP_MEMBERS_TABLE_NAME, " WHERE ", GROUP_ID, " = ?1 ORDER BY ", USER_ID))
            .bind(group_id)
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get group members".to_string()))
    }

    pub async fn get_membership(&self, user_id: i64) -> Result<Option<GroupMember>, DataManagerError> {
        query_as::<_, GroupMember>(concatcp!("SELECT * FROM ", GROUP_MEMBERS_TABLE_NAME, " WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get membership".to_string()))
    }

    pub async fn count_paid_members(&self, group_id: i64) -> Result<i64, DataManagerError> {
        query_as::<_, (i64,)>(concatcp!("
            SELECT COUNT(*) FROM ", GROUP_MEMBERS_TABLE_NAME, "
            WHERE ", GROUP_ID, " = ?1 AND ", PAYMENT_STATUS, " = ?2"))
            .bind(group_id)
            .bind(PaymentStatus::Paid.as_label())
            .fetch_one(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to count paid members".to_string()))
            .map(|row| row.0)
    }

    /// Writes a finished formation result: one membership row per member,
    /// deactivates every placed profile, and notifies each member. All of it
    /// in one transaction, so a formation run is all-or-nothing.
    pub async fn persist_formed_group(&self, group: &FormedGroup, message: &str) -> Result<Vec<Notification>, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        let mut notifications = Vec::with_capacity(group.members.len());
        for member in &group.members {
            query(concatcp!("
                INSERT INTO ", GROUP_MEMBERS_TABLE_NAME, "(",
                GROUP_ID, ", ", USER_ID, ", ", ROLE, ", ", CONFIRMED, ", ", PAYMENT_STATUS, ")
                VALUES (?1, ?2, ?3, ?4, ?5)"))
                    .bind(group.group_id)
                    .bind(member.user_id)
                    .bind(DEFAULT_MEMBER_ROLE)
                    .bind(false)
                    .bind(PaymentStatus::Pending.as_label())
                    .execute(&mut *tx).await
                    .map_err(map_insert_err("insert group member"))?;

            query(concatcp!("UPDATE ", PROFILES_TABLE_NAME, " SET ", IS_ACTIVE, " = FALSE WHERE ", USER_ID, " = ?1"))
                .bind(member.user_id)
                .execute(&mut *tx).await
                .map_err(|_| DataManagerError::Database("Failed to deactivate profile".to_string()))?;

            notifications.push(Self::insert_notification_on(&mut tx, member.user_id, message).await?);
        }

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit formation run".to_string()))?;

        Ok(notifications)
    }

    /// Manual operator add, same shape as one formation step.
    pub async fn add_group_member(&self, member: &GroupMember, message: &str) -> Result<Notification, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        query(concatcp!("
            INSERT INTO ", GROUP_MEMBERS_TABLE_NAME, "(",
            GROUP_ID, ", ", USER_ID, ", ", ROLE, ", ", CONFIRMED, ", ", PAYMENT_STATUS, ")
            VALUES (?1, ?2, ?3, ?4, ?5)"))
                .bind(member.group_id)
                .bind(member.user_id)
                .bind(&member.role)
                .bind(member.confirmed)
                .bind(member.payment_status.as_label())
                .execute(&mut *tx).await
                .map_err(map_insert_err("insert group member"))?;

        query(concatcp!("UPDATE ", PROFILES_TABLE_NAME, " SET ", IS_ACTIVE, " = FALSE WHERE ", USER_ID, " = ?1"))
            .bind(member.user_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to deactivate profile".to_string()))?;

        let notification = Self::insert_notification_on(&mut tx, member.user_id, message).await?;

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit member add".to_string()))?;

        Ok(notification)
    }

    /// Marks a member paid and confirmed, with the payment notification in
    /// the same transaction.
    pub async fn record_payment(&self, user_id: i64, message: &str) -> Result<Notification, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        query(concatcp!("
            UPDATE ", GROUP_MEMBERS_TABLE_NAME, "
            SET ", PAYMENT_STATUS, " = ?1, ", CONFIRMED, " = TRUE WHERE ", USER_ID, " = ?2"))
            .bind(PaymentStatus::Paid.as_label())
            .bind(user_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to record payment".to_string()))?;

        let notification = Self::insert_notification_on(&mut tx, user_id, message).await?;

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit payment".to_string()))?;

        Ok(notification)
    }

    /// Removes one membership row and makes the traveler eligible again.
    /// Passing a message notifies them (operator-initiated removals do,
    /// self-initiated leaves don't).
    pub async fn release_member(&self, user_id: i64, message: Option<&str>) -> Result<Option<Notification>, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        query(concatcp!("DELETE FROM ", GROUP_MEMBERS_TABLE_NAME, " WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to delete membership".to_string()))?;

        query(concatcp!("UPDATE ", PROFILES_TABLE_NAME, " SET ", IS_ACTIVE, " = TRUE WHERE ", USER_ID, " = ?1"))
            .bind(user_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to reactivate profile".to_string()))?;

        let notification = match message {
            Some(message) => Some(Self::insert_notification_on(&mut tx, user_id, message).await?),
            None => None,
        };

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit member release".to_string()))?;

        Ok(notification)
    }

    /// Deletes a whole group: every membership row goes, an assigned trip is
    /// unlinked, every former member is reactivated and notified.
    pub async fn disband_group(&self, group_id: i64, member_ids: &[i64], message: &str) -> Result<Vec<Notification>, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        query(concatcp!("DELETE FROM ", GROUP_MEMBERS_TABLE_NAME, " WHERE ", GROUP_ID, " = ?1"))
            .bind(group_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to delete group".to_string()))?;

        query(concatcp!("UPDATE ", TRIPS_TABLE_NAME, " SET ", GROUP_ID, " = NULL WHERE ", GROUP_ID, " = ?1"))
            .bind(group_id)
            .execute(&mut *tx).await
            .map_err(|_| DataManagerError::Database("Failed to unlink trip".to_string()))?;

        let mut notifications = Vec::with_capacity(member_ids.len());
        for &user_id in member_ids {
            query(concatcp!("UPDATE ", PROFILES_TABLE_NAME, " SET ", IS_ACTIVE, " = TRUE WHERE ", USER_ID, " = ?1"))
                .bind(user_id)
                .execute(&mut *tx).await
                .map_err(|_| DataManagerError::Database("Failed to reactivate profile".to_string()))?;

            notifications.push(Self::insert_notification_on(&mut tx, user_id, message).await?);
        }

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit group deletion".to_string()))?;

        Ok(notifications)
    }

    pub async fn insert_trip(
        &self,
        organiser_id: i64,
        destination: String,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
        price: f64,
        description: String,
        activities: String,
        max_spots: i64,
        deposit_amount: f64,
    ) -> Result<Trip, DataManagerError> {
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", TRIPS_TABLE_NAME, "(",
            TRIP_ID, ", ", ORGANISER_ID, ", ", DESTINATION, ", ", START_DATE, ", ", END_DATE, ", ",
            PRICE, ", ", DESCRIPTION, ", ", ACTIVITIES, ", ", MAX_SPOTS, ", ", DEPOSIT_AMOUNT, ")
            VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING ", TRIP_ID))
                .bind(organiser_id)
                .bind(&destination)
                .bind(start_date)
                .bind(end_date)
                .bind(price)
                .bind(&description)
                .bind(&activities)
                .bind(max_spots)
                .bind(deposit_amount)
                .fetch_one(&self.pool).await
                .map_err(|_| DataManagerError::Database("Failed to insert trip".to_string()))
                .map(|row| row.0)?;

        Ok(Trip::new(id, organiser_id, destination, start_date, end_date, price, description, activities, max_spots, deposit_amount))
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Option<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " WHERE ", TRIP_ID, " = ?1"))
            .bind(trip_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get trip".to_string()))
    }

    pub async fn get_trips(&self) -> Result<Vec<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " ORDER BY ", TRIP_ID))
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get trips".to_string()))
    }

    pub async fn get_trip_for_group(&self, group_id: i64) -> Result<Option<Trip>, DataManagerError> {
        query_as::<_, Trip>(concatcp!("SELECT * FROM ", TRIPS_TABLE_NAME, " WHERE ", GROUP_ID, " = ?1"))
            .bind(group_id)
            .fetch_optional(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get trip for group".to_string()))
    }

    /// Links a trip to a group and notifies every member, atomically. The
    /// UNIQUE constraint on the trip's group column backstops the
    /// duplicate-assignment checks done before calling this.
    pub async fn link_trip(&self, trip_id: i64, group_id: i64, member_ids: &[i64], message: &str) -> Result<Vec<Notification>, DataManagerError> {
        let mut tx = self.pool.begin().await
            .map_err(|_| DataManagerError::Database("Failed to begin transaction".to_string()))?;

        query(concatcp!("UPDATE ", TRIPS_TABLE_NAME, " SET ", GROUP_ID, " = ?1 WHERE ", TRIP_ID, " = ?2"))
            .bind(group_id)
            .bind(trip_id)
            .execute(&mut *tx).await
            .map_err(map_insert_err("link trip"))?;

        let mut notifications = Vec::with_capacity(member_ids.len());
        for &user_id in member_ids {
            notifications.push(Self::insert_notification_on(&mut tx, user_id, message).await?);
        }

        tx.commit().await
            .map_err(|_| DataManagerError::Database("Failed to commit trip assignment".to_string()))?;

        Ok(notifications)
    }

    pub async fn insert_organiser(&self, name: String, email: String) -> Result<Organiser, DataManagerError> {
        let created_at = Utc::now();
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", ORGANISERS_TABLE_NAME, "(", ORGANISER_ID, ", ", CREATED_AT, ", ", NAME, ", ", EMAIL, ")
            VALUES (NULL, ?1, ?2, ?3) RETURNING ", ORGANISER_ID))
                .bind(created_at)
                .bind(&name)
                .bind(&email)
                .fetch_one(&self.pool).await
                .map_err(map_insert_err("insert organiser"))
                .map(|row| row.0)?;

        Ok(Organiser { organiser_id: id, created_at, name, email })
    }

    pub async fn insert_notification(&self, user_id: i64, message: &str) -> Result<Notification, DataManagerError> {
        let mut conn = self.pool.acquire().await
            .map_err(|_| DataManagerError::Database("Failed to acquire connection".to_string()))?;
        Self::insert_notification_on(&mut conn, user_id, message).await
    }

    async fn insert_notification_on(conn: &mut SqliteConnection, user_id: i64, message: &str) -> Result<Notification, DataManagerError> {
        let created_at = Utc::now();
        let id = query_as::<_, (i64,)>(concatcp!("
            INSERT INTO ", NOTIFICATIONS_TABLE_NAME, "(",
            NOTIFICATION_ID, ", ", USER_ID, ", ", MESSAGE, ", ", IS_READ, ", ", CREATED_AT, ")
            VALUES (NULL, ?1, ?2, FALSE, ?3) RETURNING ", NOTIFICATION_ID))
                .bind(user_id)
                .bind(message)
                .bind(created_at)
                .fetch_one(&mut *conn).await
                .map_err(|_| DataManagerError::Database("Failed to insert notification".to_string()))
                .map(|row| row.0)?;

        Ok(Notification {
            notification_id: id,
            user_id,
            message: message.to_string(),
            is_read: false,
            created_at,
        })
    }

    pub async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>, DataManagerError> {
        query_as::<_, Notification>(concatcp!("
            SELECT * FROM ", NOTIFICATIONS_TABLE_NAME, "
            WHERE ", USER_ID, " = ?1 ORDER BY ", NOTIFICATION_ID, " DESC"))
            .bind(user_id)
            .fetch_all(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to get notifications".to_string()))
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<(), DataManagerError> {
        query(concatcp!("UPDATE ", NOTIFICATIONS_TABLE_NAME, " SET ", IS_READ, " = TRUE WHERE ", NOTIFICATION_ID, " = ?1"))
            .bind(notification_id)
            .execute(&self.pool).await
            .map_err(|_| DataManagerError::Database("Failed to mark notification read".to_string()))
            .map(|_| ())
    }
}
