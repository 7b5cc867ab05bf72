use tokio::sync::broadcast;
use travel_match_data_management::DataManager;
use travel_match_lib::notification::Notification;

pub struct ServerState {
    // Channel used to fan notification events out to connected consumers.
    pub tx: broadcast::Sender<Notification>,
    pub data_manager: DataManager,
}
