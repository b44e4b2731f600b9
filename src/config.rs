use std::env;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::event_service::SharedPublisher;
use crate::utils::object_locks::ObjectLocks;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub redis_url: Option<String>,
    pub origin_whitelist: Vec<String>,

    pub tagging_read_permission: String,
    pub tagging_write_permission: String,
    pub tagging_control_permission: String,

    pub object_deleted_event: String,
    pub status_changed_event: String,
    pub event_stream: String,
    pub event_consumer_group: String,
    pub event_consumer_name: String,
    /// Group whose relations are cascaded when an external object is deleted
    pub cascade_group_slug: String,
}

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub locks: ObjectLocks,
    pub events: SharedPublisher,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn init() -> Config {
        let server_host = var_or("HOST", "0.0.0.0");
        let server_port = var_or("PORT", "3001")
            .parse::<u16>()
            .expect("PORT must be a number");

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        let redis_url = env::var("REDIS_URL").ok().filter(|u| !u.is_empty());

        let origin_whitelist = env::var("ORIGIN_WHITELIST")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Config {
            server_host,
            server_port,
            database_url,
            jwt_secret,
            redis_url,
            origin_whitelist,
            tagging_read_permission: var_or("TAGGING_READ_PERMISSION", "tagging.read"),
            tagging_write_permission: var_or("TAGGING_WRITE_PERMISSION", "tagging.write"),
            tagging_control_permission: var_or("TAGGING_CONTROL_PERMISSION", "tagging.control"),
            object_deleted_event: var_or("OBJECT_DELETED_EVENT", "object.deleted"),
            status_changed_event: var_or("STATUS_CHANGED_EVENT", "collection.status.changed"),
            event_stream: var_or("EVENT_STREAM", "tagging-events"),
            event_consumer_group: var_or("EVENT_CONSUMER_GROUP", "tagging-service"),
            event_consumer_name: var_or("EVENT_CONSUMER_NAME", "tagging-service-1"),
            cascade_group_slug: var_or("CASCADE_GROUP_SLUG", "collections"),
        }
    }
}
