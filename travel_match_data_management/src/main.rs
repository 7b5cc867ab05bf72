use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_match_data_management::DataManager;

// CLI for manual data operations
#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str);

    let manager = match DataManager::start().await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!("Failed to start data manager: {err:?}");
            return;
        }
    };

    match command {
        Some("matchmake") => match manager.run_matchmaking().await {
            Ok(report) => {
                for group in &report.groups {
                    println!(
                        "group {}: {} members, shared budget {}-{}",
                        group.group_id,
                        group.members.len(),
                        group.budget_window.low,
                        group.budget_window.high
                    );
                }
                println!("{} notifications emitted", report.notifications.len());
            }
            Err(err) => tracing::error!("Matchmaking failed: {err:?}"),
        },
        Some("summary") => {
            let Some(group_id) = args.get(2).and_then(|id| id.parse::<i64>().ok()) else {
                eprintln!("usage: summary <group_id>");
                return;
            };
            match manager.summarize_group(group_id).await {
                Ok(summary) => {
                    println!("tags: {}", summary.tags.join(", "));
                    if let Some(stats) = summary.stats {
                        println!("ages {}-{}", stats.age_range.0, stats.age_range.1);
                        println!("top interests: {}", stats.top_interests.join(", "));
                    }
                }
                Err(err) => tracing::error!("Summary failed: {err:?}"),
            }
        }
        _ => {
            eprintln!("usage: matchmake | summary <group_id>");
        }
    }
}
