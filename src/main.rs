use cloudclip::adapters::http;
use cloudclip::{Config, FsStorage, PrecisionPolicy, RealMediaExecutor, TaskService};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    let storage = Arc::new(FsStorage::new(
        config.storage_root.clone(),
        config.public_base_url.clone(),
    ));
    let media = Arc::new(RealMediaExecutor);
    let service = Arc::new(TaskService::new(
        storage,
        media,
        config.limits(),
        PrecisionPolicy::default(),
        Duration::from_secs(config.task_timeout_secs),
    ));

    let app = http::router(service);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
