//! Event collaborator boundary: outbound notifications and the handler for
//! inbound "external object deleted" events. The transport lives in
//! `redis_service`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::tag_model::TagResponse;
use crate::repositories::tag_group_repository::TagGroupRepository;
use crate::services::relation_service::RelationService;
use crate::utils::app_error::AppError;
use crate::utils::object_locks::ObjectLocks;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_name: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: Event) -> Result<(), AppError>;
}

pub type SharedPublisher = Arc<dyn EventPublisher>;

/// Used when no bus is configured.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: Event) -> Result<(), AppError> {
        tracing::debug!("Event bus disabled, dropping {}", event.event_name);
        Ok(())
    }
}

/// Keeps published events in memory.
#[derive(Clone, Default)]
pub struct MemoryPublisher {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryPublisher {
    pub fn published(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryPublisher {
    async fn publish(&self, event: Event) -> Result<(), AppError> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Relation rows removed for the object
    Cascaded(u64),
    /// Not ours, or unusable. Safe to acknowledge.
    Ignored,
}

pub struct EventService;

impl EventService {
    /// Runs the cascade for an `object.deleted` event. An `Err` means the
    /// event must not be acknowledged.
    pub async fn handle_inbound(
        db: &DatabaseConnection,
        locks: &ObjectLocks,
        config: &Config,
        event: &Event,
    ) -> Result<InboundOutcome, AppError> {
        if event.event_name != config.object_deleted_event {
            tracing::debug!("Ignoring event {}", event.event_name);
            return Ok(InboundOutcome::Ignored);
        }

        let object_id = event
            .payload
            .get("objectId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty());
        let Some(object_id) = object_id else {
            tracing::warn!("Received {} without objectId", event.event_name);
            return Ok(InboundOutcome::Ignored);
        };

        let Some(group) = TagGroupRepository::find_by_slug(db, &config.cascade_group_slug).await? else {
            tracing::warn!("Cascade group {} does not exist", config.cascade_group_slug);
            return Ok(InboundOutcome::Ignored);
        };

        let deleted =
            RelationService::cascade_on_external_object_deletion(db, locks, object_id, group.id).await?;
        Ok(InboundOutcome::Cascaded(deleted))
    }

    /// Announces that a tag went inactive.
    pub async fn publish_status_changed(
        publisher: &dyn EventPublisher,
        config: &Config,
        tag: &TagResponse,
    ) -> Result<(), AppError> {
        let mut payload = serde_json::to_value(tag).map_err(|e| AppError::EventBus(e.to_string()))?;
        payload["status"] = serde_json::Value::from("inactive");

        publisher
            .publish(Event {
                event_name: config.status_changed_event.clone(),
                payload,
            })
            .await
    }
}
