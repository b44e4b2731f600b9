use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamPendingCountReply, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, RedisResult};
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::event_service::{Event, EventPublisher, EventService};
use crate::utils::app_error::AppError;
use crate::utils::object_locks::ObjectLocks;

const BLOCK_MS: usize = 5_000;
const BATCH_SIZE: usize = 16;
const RETRY_DELAY: Duration = Duration::from_secs(5);
/// Deliveries after which a failing entry is parked on the dead-letter stream
const MAX_DELIVERIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureAction {
    Retry,
    DeadLetter,
}

fn failure_action(times_delivered: usize) -> FailureAction {
    if times_delivered >= MAX_DELIVERIES {
        FailureAction::DeadLetter
    } else {
        FailureAction::Retry
    }
}

fn bus_err(e: redis::RedisError) -> AppError {
    AppError::EventBus(e.to_string())
}

/// Event bus over a Redis stream. Publishing is `XADD`; consuming uses a
/// consumer group so that an entry is only gone once it is `XACK`ed.
#[derive(Clone)]
pub struct RedisEventBus {
    client: Client,
    stream: String,
    dead_letter_stream: String,
    group: String,
    consumer: String,
}

impl RedisEventBus {
    pub fn new(config: &Config, redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url).map_err(bus_err)?;
        Ok(Self {
            client,
            stream: config.event_stream.clone(),
            dead_letter_stream: format!("{}.dead", config.event_stream),
            group: config.event_consumer_group.clone(),
            consumer: config.event_consumer_name.clone(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, AppError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(bus_err)
    }

    pub async fn check_connection(&self) -> Result<(), AppError> {
        let mut con = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await.map_err(bus_err)?;
        Ok(())
    }

    pub async fn ensure_group(&self) -> Result<(), AppError> {
        let mut con = self.connection().await?;
        let created: RedisResult<()> = con.xgroup_create_mkstream(&self.stream, &self.group, "0").await;
        match created {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(bus_err(e)),
        }
    }

    /// Entries as `(id, raw event json)`.
    async fn read(
        &self,
        con: &mut MultiplexedConnection,
        start: &str,
        block: Option<usize>,
    ) -> Result<Vec<(String, Option<String>)>, AppError> {
        let mut opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(BATCH_SIZE);
        if let Some(ms) = block {
            opts = opts.block(ms);
        }

        let reply: Option<StreamReadReply> = con
            .xread_options(&[&self.stream], &[start], &opts)
            .await
            .map_err(bus_err)?;

        Ok(reply
            .map(|r| r.keys)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|key| key.ids)
            .map(|entry| {
                let raw = entry.get::<String>("event");
                (entry.id, raw)
            })
            .collect())
    }

    async fn ack(&self, con: &mut MultiplexedConnection, id: &str) -> Result<(), AppError> {
        let _: i64 = con.xack(&self.stream, &self.group, &[id]).await.map_err(bus_err)?;
        Ok(())
    }

    async fn times_delivered(&self, con: &mut MultiplexedConnection, id: &str) -> Result<usize, AppError> {
        let reply: StreamPendingCountReply = con
            .xpending_consumer_count(&self.stream, &self.group, id, id, 1, &self.consumer)
            .await
            .map_err(bus_err)?;
        Ok(reply.ids.first().map(|p| p.times_delivered).unwrap_or(0))
    }

    async fn dead_letter(&self, con: &mut MultiplexedConnection, id: &str, raw: &str) -> Result<(), AppError> {
        let _: String = con
            .xadd(&self.dead_letter_stream, "*", &[("event", raw), ("sourceId", id)])
            .await
            .map_err(bus_err)?;
        self.ack(con, id).await
    }

    /// One pass: this consumer's pending entries, then new ones. Blocks for
    /// new entries only when nothing is pending. Entries whose handler fails
    /// stay pending until they have been delivered `MAX_DELIVERIES` times,
    /// then move to the dead-letter stream.
    async fn consume_once(
        &self,
        db: &DatabaseConnection,
        locks: &ObjectLocks,
        config: &Config,
    ) -> Result<usize, AppError> {
        let mut con = self.connection().await?;

        let mut entries = self.read(&mut con, "0", None).await?;
        let block = if entries.is_empty() { Some(BLOCK_MS) } else { None };
        entries.extend(self.read(&mut con, ">", block).await?);

        let mut failed = 0;
        for (id, raw) in entries {
            let event = match raw.as_deref().map(serde_json::from_str::<Event>) {
                Some(Ok(event)) => event,
                _ => {
                    tracing::warn!("Dropping malformed event {}", id);
                    self.ack(&mut con, &id).await?;
                    continue;
                }
            };

            tracing::info!("Received event {} ({})", event.event_name, id);
            match EventService::handle_inbound(db, locks, config, &event).await {
                Ok(outcome) => {
                    tracing::info!("Event {} handled: {:?}", id, outcome);
                    self.ack(&mut con, &id).await?;
                }
                Err(e) => {
                    let deliveries = self.times_delivered(&mut con, &id).await?;
                    match failure_action(deliveries) {
                        FailureAction::Retry => {
                            tracing::error!("Event {} left pending for redelivery: {}", id, e);
                            failed += 1;
                        }
                        FailureAction::DeadLetter => {
                            tracing::error!(
                                "Event {} failed {} times, moving to {}: {}",
                                id,
                                deliveries,
                                self.dead_letter_stream,
                                e
                            );
                            let raw = raw.unwrap_or_default();
                            self.dead_letter(&mut con, &id, &raw).await?;
                        }
                    }
                }
            }
        }

        Ok(failed)
    }

    pub async fn run_consumer(self, db: DatabaseConnection, locks: ObjectLocks, config: Arc<Config>) {
        if let Err(e) = self.ensure_group().await {
            tracing::error!("Cannot create consumer group {}: {}", self.group, e);
            return;
        }
        tracing::info!("Consuming {} as {}/{}", self.stream, self.group, self.consumer);

        loop {
            match self.consume_once(&db, &locks, &config).await {
                Ok(0) => {}
                Ok(_) => tokio::time::sleep(RETRY_DELAY).await,
                Err(e) => {
                    tracing::error!("Event consumer error: {}", e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventBus {
    async fn publish(&self, event: Event) -> Result<(), AppError> {
        let json = serde_json::to_string(&event).map_err(|e| AppError::EventBus(e.to_string()))?;
        let mut con = self.connection().await?;

        let _: String = con
            .xadd(&self.stream, "*", &[("event", json.as_str())])
            .await
            .map_err(bus_err)?;

        tracing::info!("Published event {}", event.event_name);
        Ok(())
    }
}
