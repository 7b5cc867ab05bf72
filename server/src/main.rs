use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use local_ip_address::local_ip;
use serde::{Deserialize, Serialize};
use server::server_state::ServerState;
use std::{fs::OpenOptions, net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_match_data_management::{DataManager, DataManagerError};
use travel_match_lib::{
    formation::FormedGroup,
    notification::Notification,
    trip::DEFAULT_MAX_SPOTS,
    vibe::VibeAnswers,
};

const PORT: u16 = 3080;

#[tokio::main]
async fn main() {
    std::fs::create_dir_all("server/log").unwrap();
    let log_file = "server/log/server.log";

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .unwrap();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    // Set up application state for use with with_state().
    let (tx, _rx) = broadcast::channel(100);
    let data_manager = DataManager::start().await.unwrap();

    let server_state = Arc::new(ServerState {
        tx,
        data_manager,
    });

    // Log every notification event that passes through the channel.
    let mut rx = server_state.tx.subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = rx.recv().await {
            tracing::info!("Notification for user {}: {}", notification.user_id, notification.message);
        }
    });

    let app = Router::new()
        .route("/score/{user_a}/{user_b}", get(get_score))
        .route("/matchmaking", post(run_matchmaking))
        .route("/groups", get(get_group_ids))
        .route("/group/{group_id}/summary", get(get_group_summary))
        .route("/group/{group_id}/members", get(get_group_members))
        .route("/group/{group_id}/add/{user_id}", post(add_member))
        .route("/group/{group_id}/delete", post(delete_group))
        .route("/trip/{trip_id}/assign/{group_id}", post(assign_trip))
        .route("/user/{user_id}/deposit", post(pay_deposit))
        .route("/user/{user_id}/leave", post(leave_group))
        .route("/user/{user_id}/remove", post(remove_member))
        .route("/profile", post(register_profile))
        .route("/profile/{user_id}", get(get_profile))
        .route("/profiles", get(get_profiles))
        .route("/organiser", post(register_organiser))
        .route("/trip", post(register_trip))
        .route("/trips", get(get_trips))
        .route("/notifications/{user_id}", get(get_notifications))
        .route("/notification/{notification_id}/read", post(mark_notification_read))
        .with_state(server_state.clone());

    let ip = local_ip().unwrap();
    let listener = tokio::net::TcpListener::bind(SocketAddr::from((ip, PORT)))
        .await
        .unwrap();
    tracing::info!("Listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

fn error_response(err: DataManagerError) -> Response {
    match err {
        DataManagerError::CapacityExceeded | DataManagerError::DuplicateAssignment => {
            StatusCode::CONFLICT.into_response()
        }
        DataManagerError::MissingPrecondition(reason) => {
            (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response()
        }
        DataManagerError::Database(reason) => {
            tracing::error!("Database error: {reason}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Serialize)]
struct ScoreResponse {
    compatible: bool,
    score: Option<u8>,
}

async fn get_score(
    State(state): State<Arc<ServerState>>,
    Path((user_a, user_b)): Path<(i64, i64)>,
) -> Response {
    match state.data_manager.score_users(user_a, user_b).await {
        Ok(compatibility) => {
            let score = compatibility.score();
            Json(ScoreResponse {
                compatible: score.is_some(),
                score,
            })
            .into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
struct MatchmakingResponse {
    groups: Vec<FormedGroup>,
    notifications: Vec<Notification>,
}

async fn run_matchmaking(State(state): State<Arc<ServerState>>) -> Response {
    match state.data_manager.run_matchmaking().await {
        Ok(report) => {
            for notification in &report.notifications {
                let _ = state.tx.send(notification.clone());
            }
            Json(MatchmakingResponse {
                groups: report.groups,
                notifications: report.notifications,
            })
            .into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn get_group_ids(State(state): State<Arc<ServerState>>) -> Response {
    match state.data_manager.get_group_ids().await {
        Ok(ids) => Json(ids).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Serialize)]
struct SummaryResponse {
    tags: Vec<String>,
    stats: Option<travel_match_lib::summary::GroupStats>,
}

async fn get_group_summary(
    State(state): State<Arc<ServerState>>,
    Path(group_id): Path<i64>,
) -> Response {
    match state.data_manager.summarize_group(group_id).await {
        Ok(summary) => Json(SummaryResponse {
            tags: summary.tags,
            stats: summary.stats,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_group_members(
    State(state): State<Arc<ServerState>>,
    Path(group_id): Path<i64>,
) -> Response {
    match state.data_manager.get_group_members(group_id).await {
        Ok(members) => Json(members).into_response(),
        Err(err) => error_response(err),
    }
}

async fn add_member(
    State(state): State<Arc<ServerState>>,
    Path((group_id, user_id)): Path<(i64, i64)>,
) -> Response {
    match state.data_manager.add_member(group_id, user_id, "member".to_string()).await {
        Ok(notification) => {
            let _ = state.tx.send(notification.clone());
            Json(notification).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn delete_group(
    State(state): State<Arc<ServerState>>,
    Path(group_id): Path<i64>,
) -> Response {
    match state.data_manager.delete_group(group_id).await {
        Ok(notifications) => {
            for notification in notifications {
                let _ = state.tx.send(notification);
            }
            StatusCode::OK.into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn assign_trip(
    State(state): State<Arc<ServerState>>,
    Path((trip_id, group_id)): Path<(i64, i64)>,
) -> Response {
    match state.data_manager.assign_trip(trip_id, group_id).await {
        Ok(notifications) => {
            for notification in notifications {
                let _ = state.tx.send(notification);
            }
            StatusCode::OK.into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn pay_deposit(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.data_manager.pay_deposit(user_id).await {
        Ok(notification) => {
            let _ = state.tx.send(notification.clone());
            Json(notification).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn leave_group(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.data_manager.leave_group(user_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

async fn remove_member(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.data_manager.remove_member(user_id).await {
        Ok(notification) => {
            let _ = state.tx.send(notification.clone());
            Json(notification).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct RegisterProfileRequest {
    user_id: i64,
    age: i64,
    budget_min: i64,
    budget_max: i64,
    travel_period: Vec<String>,
    #[serde(default)]
    vibes: VibeAnswers,
    linked_buddy_id: Option<i64>,
}

async fn register_profile(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterProfileRequest>,
) -> Response {
    let result = state
        .data_manager
        .register_profile(
            request.user_id,
            request.age,
            request.budget_min,
            request.budget_max,
            request.travel_period,
            request.vibes,
            request.linked_buddy_id,
        )
        .await;

    match result {
        Ok(profile) => Json(profile).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_profile(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.data_manager.get_profile(user_id).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_profiles(State(state): State<Arc<ServerState>>) -> Response {
    match state.data_manager.get_profiles().await {
        Ok(profiles) => Json(profiles).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize)]
struct RegisterOrganiserRequest {
    name: String,
    email: String,
}

async fn register_organiser(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterOrganiserRequest>,
) -> Response {
    match state.data_manager.register_organiser(request.name, request.email).await {
        Ok(organiser) => Json(organiser).into_response(),
        Err(err) => error_response(err),
    }
}

fn default_max_spots() -> i64 {
    DEFAULT_MAX_SPOTS
}

#[derive(Deserialize)]
struct RegisterTripRequest {
    organiser_id: i64,
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price: f64,
    #[serde(default)]
    description: String,
    #[serde(default)]
    activities: String,
    #[serde(default = "default_max_spots")]
    max_spots: i64,
    #[serde(default)]
    deposit_amount: f64,
}

async fn register_trip(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<RegisterTripRequest>,
) -> Response {
    let result = state
        .data_manager
        .register_trip(
            request.organiser_id,
            request.destination,
            request.start_date,
            request.end_date,
            request.price,
            request.description,
            request.activities,
            request.max_spots,
            request.deposit_amount,
        )
        .await;

    match result {
        Ok(trip) => Json(trip).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_trips(State(state): State<Arc<ServerState>>) -> Response {
    match state.data_manager.get_trips().await {
        Ok(trips) => Json(trips).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_notifications(
    State(state): State<Arc<ServerState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.data_manager.get_notifications(user_id).await {
        Ok(notifications) => Json(notifications).into_response(),
        Err(err) => error_response(err),
    }
}

async fn mark_notification_read(
    State(state): State<Arc<ServerState>>,
    Path(notification_id): Path<i64>,
) -> Response {
    match state.data_manager.mark_notification_read(notification_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}
