use domain::scheduled_publish::PublishDispatcher;
use domain::sync::SyncQueue;
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting channel_insights_rs in {} mode",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let sync_queue = SyncQueue::start(Arc::clone(&db), config.clone());
    let _dispatcher = PublishDispatcher::start(Arc::clone(&db), config.clone());

    let app_state = web::AppState::new(service::AppState::new(config, &db), sync_queue);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}
