use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing_subscriber::EnvFilter;

use tagging_service::config::{AppState, Config};
use tagging_service::routes;
use tagging_service::seeders;
use tagging_service::services::event_service::{NoopPublisher, SharedPublisher};
use tagging_service::services::redis_service::RedisEventBus;
use tagging_service::utils::object_locks::ObjectLocks;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Arc::new(Config::init());
    tracing::info!("Starting tagging service");

    // 1. Database Connection
    let db = Database::connect(&cfg.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connected");

    // 2. Migrations
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    // 3. Database Seeding
    if let Err(e) = seeders::run_seeders(&db).await {
        tracing::error!("Seeding failed: {}", e);
    }

    // 4. Event Bus
    let locks = ObjectLocks::new();
    let events: SharedPublisher = match &cfg.redis_url {
        Some(url) => {
            let bus = RedisEventBus::new(&cfg, url).expect("Invalid REDIS_URL");
            bus.check_connection().await.expect("Redis connection failed");
            tracing::info!("Event bus connected");

            tokio::spawn(bus.clone().run_consumer(db.clone(), locks.clone(), cfg.clone()));
            Arc::new(bus)
        }
        None => {
            tracing::warn!("REDIS_URL not set, events are disabled");
            Arc::new(NoopPublisher)
        }
    };

    // 5. Build App State
    let state = AppState {
        db,
        config: cfg.clone(),
        locks,
        events,
    };

    // 6. Initialize Router
    let app = routes::app(state);

    // 7. Start Server
    let addr: SocketAddr = format!("{}:{}", cfg.server_host, cfg.server_port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
