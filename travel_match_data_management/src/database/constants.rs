#![allow(dead_code)]

pub const PROFILES_TABLE_NAME: &str = "TravelerProfiles";
pub const USER_ID: &str = "user_id";
pub const CREATED_AT: &str = "created_at";
pub const AGE: &str = "age";
pub const BUDGET_MIN: &str = "budget_min";
pub const BUDGET_MAX: &str = "budget_max";
pub const TRAVEL_PERIOD: &str = "travel_period";
pub const VIBES: &str = "vibes";
pub const LINKED_BUDDY_ID: &str = "linked_buddy_id";
pub const IS_ACTIVE: &str = "is_active";

pub const GROUP_MEMBERS_TABLE_NAME: &str = "GroupMembers";
pub const GROUP_ID: &str = "group_id";
pub const ROLE: &str = "role";
pub const CONFIRMED: &str = "confirmed";
pub const PAYMENT_STATUS: &str = "payment_status";

pub const TRIPS_TABLE_NAME: &str = "Trips";
pub const TRIP_ID: &str = "trip_id";
pub const ORGANISER_ID: &str = "organiser_id";
pub const DESTINATION: &str = "destination";
pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";
pub const PRICE: &str = "price";
pub const DESCRIPTION: &str = "description";
pub const ACTIVITIES: &str = "activities";
pub const MAX_SPOTS: &str = "max_spots";
pub const DEPOSIT_AMOUNT: &str = "deposit_amount";

pub const ORGANISERS_TABLE_NAME: &str = "Organisers";
pub const NAME: &str = "name";
pub const EMAIL: &str = "email";

pub const NOTIFICATIONS_TABLE_NAME: &str = "Notifications";
pub const NOTIFICATION_ID: &str = "notification_id";
pub const MESSAGE: &str = "message";
pub const IS_READ: &str = "is_read";
