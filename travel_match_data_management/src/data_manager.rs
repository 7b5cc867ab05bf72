use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::Rng;
use tokio::sync::Mutex;
use travel_match_lib::{
    compatibility::{score, Compatibility},
    formation::{form_group, FirstAvailable, FormedGroup, SeedStrategy},
    group::{GroupMember, PaymentStatus},
    notification::Notification,
    organiser::Organiser,
    profile::TravelerProfile,
    summary::{group_stats, vibe_tags, GroupStats},
    trip::Trip,
    vibe::{VibeAnswers, VibeScores},
};

use crate::{database::db::MatchDatabase, DataManagerError, DATA_DIR};

/// Production seed choice: any pool member may anchor the next group.
pub struct RandomSeed;

impl SeedStrategy for RandomSeed {
    fn pick(&mut self, pool: &[TravelerProfile]) -> usize {
        rand::rng().random_range(0..pool.len())
    }
}

/// Everything one matchmaking run produced.
#[derive(Debug)]
pub struct MatchmakingReport {
    pub groups: Vec<FormedGroup>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug)]
pub struct GroupSummary {
    pub tags: Vec<String>,
    pub stats: Option<GroupStats>,
}

#[derive(Clone)]
pub struct DataManager {
    pub(crate) database: MatchDatabase,
    // Serializes matchmaking runs and manual member adds so two in-flight
    // writers cannot both place the same traveler. The UNIQUE(user_id)
    // constraint in storage backstops this.
    formation_lock: Arc<Mutex<()>>,
}

/// The public interface for all travel match data management.
impl DataManager {
    pub async fn start() -> Result<Self, DataManagerError> {
        // Create data dir if it doesn't exist
        let root: PathBuf = project_root::get_project_root()
            .map_err(|_| DataManagerError::Database("Failed to locate project root".to_string()))?;
        let data_dir = root.join(DATA_DIR);
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)
                .map_err(|_| DataManagerError::Database(format!("Failed to create data directory: {:?}", data_dir)))?;
        }

        let database = MatchDatabase::connect().await?;

        Ok(DataManager {
            database,
            formation_lock: Arc::new(Mutex::new(())),
        })
    }

    pub async fn start_at(path: impl AsRef<Path>) -> Result<Self, DataManagerError> {
        let database = MatchDatabase::connect_at(path).await?;

        Ok(DataManager {
            database,
            formation_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Ingests a new traveler. Vibe answers are normalized here (blank
    /// answers to the neutral midpoint, out-of-range clamped) so scoring
    /// never sees raw form input.
    pub async fn register_profile(
        &self,
        user_id: i64,
        age: i64,
        budget_min: i64,
        budget_max: i64,
        travel_period: Vec<String>,
        answers: VibeAnswers,
        linked_buddy_id: Option<i64>,
    ) -> Result<TravelerProfile, DataManagerError> {
        if budget_min < 0 || budget_max < budget_min {
            return Err(DataManagerError::MissingPrecondition(
                "budget range must satisfy 0 <= min <= max".to_string(),
            ));
        }

        let profile = TravelerProfile::new(
            user_id,
            Utc::now(),
            age,
            budget_min,
            budget_max,
            travel_period,
            VibeScores::from_answers(answers),
            linked_buddy_id,
        );
        self.database.insert_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<TravelerProfile>, DataManagerError> {
        self.database.get_profile(user_id).await
    }

    pub async fn get_profiles(&self) -> Result<Vec<TravelerProfile>, DataManagerError> {
        self.database.get_profiles().await
    }

    pub async fn set_profile_active(&self, user_id: i64, active: bool) -> Result<(), DataManagerError> {
        self.database.set_profile_active(user_id, active).await
    }

    pub async fn register_organiser(&self, name: String, email: String) -> Result<Organiser, DataManagerError> {
        self.database.insert_organiser(name, email).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn register_trip(
        &self,
        organiser_id: i64,
        destination: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: f64,
        description: String,
        activities: String,
        max_spots: i64,
        deposit_amount: f64,
    ) -> Result<Trip, DataManagerError> {
        if end_date < start_date {
            return Err(DataManagerError::MissingPrecondition(
                "trip end date precedes start date".to_string(),
            ));
        }

        self.database
            .insert_trip(organiser_id, destination, start_date, end_date, price, description, activities, max_spots, deposit_amount)
            .await
    }

    pub async fn get_trip(&self, trip_id: i64) -> Result<Option<Trip>, DataManagerError> {
        self.database.get_trip(trip_id).await
    }

    pub async fn get_trips(&self) -> Result<Vec<Trip>, DataManagerError> {
        self.database.get_trips().await
    }

    pub async fn get_group_ids(&self) -> Result<Vec<i64>, DataManagerError> {
        self.database.get_group_ids().await
    }

    pub async fn get_group_members(&self, group_id: i64) -> Result<Vec<GroupMember>, DataManagerError> {
        self.database.get_group_members(group_id).await
    }

    pub async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>, DataManagerError> {
        self.database.get_notifications(user_id).await
    }

    pub async fn mark_notification_read(&self, notification_id: i64) -> Result<(), DataManagerError> {
        self.database.mark_notification_read(notification_id).await
    }

    /// Scores two stored travelers against each other.
    pub async fn score_users(&self, user_a: i64, user_b: i64) -> Result<Compatibility, DataManagerError> {
        let a = self.database.get_profile(user_a).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("no profile for user {user_a}")))?;
        let b = self.database.get_profile(user_b).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("no profile for user {user_b}")))?;
        Ok(score(&a, &b))
    }

    /// Forms groups from every active, unassigned traveler until the pool is
    /// exhausted, with the deterministic pop-front seed choice.
    pub async fn run_matchmaking(&self) -> Result<MatchmakingReport, DataManagerError> {
        self.run_matchmaking_with(&mut FirstAvailable).await
    }

    pub async fn run_matchmaking_with(&self, seed_strategy: &mut dyn SeedStrategy) -> Result<MatchmakingReport, DataManagerError> {
        let _guard = self.formation_lock.lock().await;

        let mut pool = self.database.get_eligible_profiles().await?;
        let mut next_group_id = self.database.max_group_id().await? + 1;

        let mut groups = Vec::new();
        let mut notifications = Vec::new();
        while let Some(group) = form_group(next_group_id, &mut pool, seed_strategy) {
            tracing::info!("Formed group {} with {} members", group.group_id, group.members.len());

            let message = format!("You have been matched into travel group {}!", group.group_id);
            notifications.extend(self.database.persist_formed_group(&group, &message).await?);
            groups.push(group);
            next_group_id += 1;
        }

        Ok(MatchmakingReport { groups, notifications })
    }

    /// Manual operator add. Takes the same lock as matchmaking so the two
    /// cannot race each other into double-placing a traveler.
    pub async fn add_member(&self, group_id: i64, user_id: i64, role: String) -> Result<Notification, DataManagerError> {
        let _guard = self.formation_lock.lock().await;

        self.database.get_profile(user_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("no profile for user {user_id}")))?;

        let member = GroupMember {
            group_id,
            user_id,
            role,
            confirmed: false,
            payment_status: PaymentStatus::Pending,
        };
        let message = format!("You have been added to travel group {group_id}.");
        self.database.add_group_member(&member, &message).await
    }

    /// Links a trip to a group. Both sides must be unlinked.
    pub async fn assign_trip(&self, trip_id: i64, group_id: i64) -> Result<Vec<Notification>, DataManagerError> {
        let trip = self.database.get_trip(trip_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("no trip {trip_id}")))?;
        if trip.group_id.is_some() {
            return Err(DataManagerError::DuplicateAssignment);
        }
        if self.database.get_trip_for_group(group_id).await?.is_some() {
            return Err(DataManagerError::DuplicateAssignment);
        }

        let members = self.database.get_group_members(group_id).await?;
        if members.is_empty() {
            return Err(DataManagerError::MissingPrecondition(format!("group {group_id} has no members")));
        }

        let member_ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
        let message = format!("Your group has been assigned a trip to {}!", trip.destination);
        self.database.link_trip(trip_id, group_id, &member_ids, &message).await
    }

    /// Pays the deposit for one member: requires an assigned trip and a free
    /// spot, then marks them paid and confirmed.
    pub async fn pay_deposit(&self, user_id: i64) -> Result<Notification, DataManagerError> {
        let member = self.database.get_membership(user_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("user {user_id} is not in a group")))?;
        let trip = self.database.get_trip_for_group(member.group_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition("no trip assigned to the group".to_string()))?;

        if member.payment_status == PaymentStatus::Paid {
            return Err(DataManagerError::DuplicateAssignment);
        }

        let paid = self.database.count_paid_members(member.group_id).await?;
        if paid >= trip.max_spots {
            return Err(DataManagerError::CapacityExceeded);
        }

        let message = format!("Deposit received! Your spot for {} is confirmed.", trip.destination);
        self.database.record_payment(user_id, &message).await
    }

    /// Self-initiated exit: the membership row goes away and the traveler is
    /// eligible for future matchmaking again. No notification.
    pub async fn leave_group(&self, user_id: i64) -> Result<(), DataManagerError> {
        self.database.get_membership(user_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("user {user_id} is not in a group")))?;

        self.database.release_member(user_id, None).await?;
        Ok(())
    }

    /// Operator-initiated removal: same transition as leaving, plus a
    /// notification to the removed traveler.
    pub async fn remove_member(&self, user_id: i64) -> Result<Notification, DataManagerError> {
        self.database.get_membership(user_id).await?
            .ok_or_else(|| DataManagerError::MissingPrecondition(format!("user {user_id} is not in a group")))?;

        let message = "You have been removed from your travel group.";
        let notification = self.database.release_member(user_id, Some(message)).await?;
        notification.ok_or_else(|| DataManagerError::Database("Notification missing after removal".to_string()))
    }

    /// Disbands a group: rows deleted, trip unlinked, members reactivated
    /// and notified.
    pub async fn delete_group(&self, group_id: i64) -> Result<Vec<Notification>, DataManagerError> {
        let members = self.database.get_group_members(group_id).await?;
        if members.is_empty() {
            return Err(DataManagerError::MissingPrecondition(format!("group {group_id} has no members")));
        }

        let member_ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
        let message = "Your travel group has been disbanded.";
        self.database.disband_group(group_id, &member_ids, message).await
    }

    /// Tags and aggregate statistics for an existing group. Members whose
    /// profile cannot be resolved are skipped rather than counted as zeros.
    pub async fn summarize_group(&self, group_id: i64) -> Result<GroupSummary, DataManagerError> {
        let members = self.database.get_group_members(group_id).await?;

        let mut profiles = Vec::with_capacity(members.len());
        for member in &members {
            if let Some(profile) = self.database.get_profile(member.user_id).await? {
                profiles.push(profile);
            }
        }

        Ok(GroupSummary {
            tags: vibe_tags(&profiles),
            stats: group_stats(&profiles),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_match_lib::formation::GROUP_SIZE_CAP;
    use travel_match_lib::vibe::VibeAnswers;

    async fn manager() -> (DataManager, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let manager = DataManager::start_at(dir.path().join("test.db")).await.unwrap();
        (manager, dir)
    }

    async fn seed_traveler(manager: &DataManager, user_id: i64, age: i64, budget_min: i64, budget_max: i64) {
        manager
            .register_profile(
                user_id,
                age,
                budget_min,
                budget_max,
                vec!["Summer".to_string()],
                VibeAnswers::default(),
                None,
            )
            .await
            .unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn seed_trip(manager: &DataManager, email: &str, max_spots: i64) -> Trip {
        let organiser = manager
            .register_organiser("Sunway Tours".to_string(), email.to_string())
            .await
            .unwrap();
        manager
            .register_trip(
                organiser.organiser_id,
                "Lisbon".to_string(),
                date("2026-07-01"),
                date("2026-07-14"),
                1200.0,
                "Two weeks along the coast".to_string(),
                "surfing, food tours".to_string(),
                max_spots,
                150.0,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn matchmaking_places_compatible_travelers_in_one_group() {
        let (manager, _dir) = manager().await;
        for id in 1..=5 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }

        let report = manager.run_matchmaking().await.unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].members.len(), 5);
        assert_eq!(report.notifications.len(), 5);

        let members = manager.get_group_members(1).await.unwrap();
        assert_eq!(members.len(), 5);
        for member in &members {
            assert!(!member.confirmed);
            assert_eq!(member.payment_status, PaymentStatus::Pending);
        }

        // Placed members are no longer eligible.
        for id in 1..=5 {
            let profile = manager.get_profile(id).await.unwrap().unwrap();
            assert!(!profile.is_active);
        }
    }

    #[tokio::test]
    async fn second_run_finds_no_one_to_place() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }

        let first = manager.run_matchmaking().await.unwrap();
        assert_eq!(first.groups.len(), 1);

        let second = manager.run_matchmaking().await.unwrap();
        assert!(second.groups.is_empty());
        assert!(second.notifications.is_empty());
    }

    #[tokio::test]
    async fn incompatible_travelers_end_up_in_separate_groups() {
        let (manager, _dir) = manager().await;
        seed_traveler(&manager, 1, 25, 500, 1500).await;
        seed_traveler(&manager, 2, 55, 500, 1500).await;

        let report = manager.run_matchmaking().await.unwrap();
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].members.len(), 1);
        assert_eq!(report.groups[1].members.len(), 1);
        assert_ne!(report.groups[0].group_id, report.groups[1].group_id);
    }

    #[tokio::test]
    async fn buddies_are_grouped_together() {
        let (manager, _dir) = manager().await;
        for id in 1..=25 {
            let buddy = match id {
                1 => Some(24),
                24 => Some(1),
                _ => None,
            };
            manager
                .register_profile(id, 25, 500, 1500, vec!["Summer".to_string()], VibeAnswers::default(), buddy)
                .await
                .unwrap();
        }

        let report = manager.run_matchmaking().await.unwrap();
        let group = &report.groups[0];
        assert!(group.members.len() <= GROUP_SIZE_CAP);
        let ids: Vec<i64> = group.members.iter().map(|m| m.user_id).collect();
        assert!(ids.contains(&1));
        assert!(ids.contains(&24));
    }

    #[tokio::test]
    async fn no_user_is_ever_in_two_groups() {
        let (manager, _dir) = manager().await;
        for id in 1..=4 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        // Reactivating a placed profile without removing the membership row
        // must not get them placed again: the membership row keeps them out
        // of the pool, and a direct add trips the uniqueness constraint.
        manager.set_profile_active(2, true).await.unwrap();
        let report = manager.run_matchmaking().await.unwrap();
        assert!(report.groups.is_empty());

        let err = manager.add_member(99, 2, "member".to_string()).await.unwrap_err();
        assert!(matches!(err, DataManagerError::DuplicateAssignment));
    }

    #[tokio::test]
    async fn trip_assignment_is_exclusive_on_both_sides() {
        let (manager, _dir) = manager().await;
        for id in 1..=4 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        let trip = seed_trip(&manager, "tours@sunway.example", 20).await;
        let notifications = manager.assign_trip(trip.trip_id, 1).await.unwrap();
        assert_eq!(notifications.len(), 4);

        // Same trip again.
        let err = manager.assign_trip(trip.trip_id, 1).await.unwrap_err();
        assert!(matches!(err, DataManagerError::DuplicateAssignment));

        // A second trip on the same group.
        let other = seed_trip(&manager, "alps@sunway.example", 20).await;
        let err = manager.assign_trip(other.trip_id, 1).await.unwrap_err();
        assert!(matches!(err, DataManagerError::DuplicateAssignment));

        let stored = manager.get_trip(trip.trip_id).await.unwrap().unwrap();
        assert_eq!(stored.group_id, Some(1));
    }

    #[tokio::test]
    async fn deposit_requires_an_assigned_trip() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        let err = manager.pay_deposit(1).await.unwrap_err();
        assert!(matches!(err, DataManagerError::MissingPrecondition(_)));
    }

    #[tokio::test]
    async fn deposit_is_rejected_once_spots_run_out() {
        let (manager, _dir) = manager().await;
        for id in 1..=5 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        let trip = seed_trip(&manager, "tours@sunway.example", 3).await;
        manager.assign_trip(trip.trip_id, 1).await.unwrap();

        for id in 1..=3 {
            manager.pay_deposit(id).await.unwrap();
        }

        let err = manager.pay_deposit(4).await.unwrap_err();
        assert!(matches!(err, DataManagerError::CapacityExceeded));

        let members = manager.get_group_members(1).await.unwrap();
        let fourth = members.iter().find(|m| m.user_id == 4).unwrap();
        assert_eq!(fourth.payment_status, PaymentStatus::Pending);
        assert!(!fourth.confirmed);

        let third = members.iter().find(|m| m.user_id == 3).unwrap();
        assert_eq!(third.payment_status, PaymentStatus::Paid);
        assert!(third.confirmed);
    }

    #[tokio::test]
    async fn paying_twice_is_rejected() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();
        let trip = seed_trip(&manager, "tours@sunway.example", 20).await;
        manager.assign_trip(trip.trip_id, 1).await.unwrap();

        manager.pay_deposit(1).await.unwrap();
        let err = manager.pay_deposit(1).await.unwrap_err();
        assert!(matches!(err, DataManagerError::DuplicateAssignment));
    }

    #[tokio::test]
    async fn leaving_reactivates_the_traveler() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        manager.leave_group(2).await.unwrap();

        let profile = manager.get_profile(2).await.unwrap().unwrap();
        assert!(profile.is_active);
        assert_eq!(manager.get_group_members(1).await.unwrap().len(), 2);

        // Leaving twice is a missing precondition.
        let err = manager.leave_group(2).await.unwrap_err();
        assert!(matches!(err, DataManagerError::MissingPrecondition(_)));
    }

    #[tokio::test]
    async fn removal_notifies_the_removed_traveler() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        let notification = manager.remove_member(3).await.unwrap();
        assert_eq!(notification.user_id, 3);
        assert!(!notification.is_read);

        let stored = manager.get_notifications(3).await.unwrap();
        assert_eq!(stored[0].message, notification.message);
    }

    #[tokio::test]
    async fn deleting_a_group_unlinks_its_trip_and_reactivates_members() {
        let (manager, _dir) = manager().await;
        for id in 1..=4 {
            seed_traveler(&manager, id, 25, 500, 1500).await;
        }
        manager.run_matchmaking().await.unwrap();

        let trip = seed_trip(&manager, "tours@sunway.example", 20).await;
        manager.assign_trip(trip.trip_id, 1).await.unwrap();

        let notifications = manager.delete_group(1).await.unwrap();
        assert_eq!(notifications.len(), 4);

        let stored = manager.get_trip(trip.trip_id).await.unwrap().unwrap();
        assert_eq!(stored.group_id, None);

        assert!(manager.get_group_members(1).await.unwrap().is_empty());
        for id in 1..=4 {
            let profile = manager.get_profile(id).await.unwrap().unwrap();
            assert!(profile.is_active);
        }

        // Deleted members are eligible for the next run again.
        let report = manager.run_matchmaking().await.unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].group_id, 2);
    }

    #[tokio::test]
    async fn summarize_group_reports_tags_and_stats() {
        let (manager, _dir) = manager().await;
        for id in 1..=3 {
            seed_traveler(&manager, id, 22, 300, 700).await;
        }
        manager.run_matchmaking().await.unwrap();

        let summary = manager.summarize_group(1).await.unwrap();
        assert!(summary.tags.contains(&"budget travelers".to_string()));
        assert!(summary.tags.contains(&"young crowd".to_string()));

        let stats = summary.stats.unwrap();
        assert_eq!(stats.age_range, (22, 22));
        assert_eq!(stats.top_interests.len(), 3);
    }

    #[tokio::test]
    async fn summarize_unknown_group_is_empty() {
        let (manager, _dir) = manager().await;
        let summary = manager.summarize_group(404).await.unwrap();
        assert!(summary.tags.is_empty());
        assert!(summary.stats.is_none());
    }

    #[tokio::test]
    async fn score_users_reads_stored_profiles() {
        let (manager, _dir) = manager().await;
        seed_traveler(&manager, 1, 25, 500, 1000).await;
        seed_traveler(&manager, 2, 25, 500, 1000).await;
        seed_traveler(&manager, 3, 40, 500, 1000).await;

        assert_eq!(manager.score_users(1, 2).await.unwrap(), Compatibility::Score(100));
        assert_eq!(manager.score_users(1, 3).await.unwrap(), Compatibility::Incompatible);

        let err = manager.score_users(1, 99).await.unwrap_err();
        assert!(matches!(err, DataManagerError::MissingPrecondition(_)));
    }

    #[tokio::test]
    async fn duplicate_profile_registration_is_rejected() {
        let (manager, _dir) = manager().await;
        seed_traveler(&manager, 1, 25, 500, 1500).await;

        let err = manager
            .register_profile(1, 30, 0, 100, vec![], VibeAnswers::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::DuplicateAssignment));
    }

    #[tokio::test]
    async fn inverted_budget_range_is_rejected_at_ingestion() {
        let (manager, _dir) = manager().await;
        let err = manager
            .register_profile(1, 25, 900, 400, vec![], VibeAnswers::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataManagerError::MissingPrecondition(_)));
    }
}
