use sea_orm::*;

use crate::config::Config;
use crate::entities::tag_group;
use crate::models::tag_model::CountCorrection;
use crate::repositories::tag_repository::TagRepository;
use crate::repositories::tagged_object_repository::TaggedObjectRepository;
use crate::services::event_service::{EventPublisher, EventService};
use crate::services::tag_service::TagService;
use crate::utils::app_error::AppError;

pub struct MaintenanceService;

impl MaintenanceService {
    /// Rewrites every cached count in the group from the relation rows.
    /// Counts are written as absolute values, so run this while the group
    /// is not being tagged.
    pub async fn reconcile_counts(
        db: &DatabaseConnection,
        tag_group_id: i64,
    ) -> Result<Vec<CountCorrection>, AppError> {
        let txn = db.begin().await?;

        let tags = TagRepository::find_all_in_group(&txn, tag_group_id).await?;
        let actual = TaggedObjectRepository::count_by_tag(&txn, tag_group_id).await?;

        let mut corrections = Vec::new();
        for tag in tags {
            let count = actual.get(&tag.id).copied().unwrap_or(0);
            if count == tag.tagged_objects_count {
                continue;
            }

            TagRepository::set_count(&txn, tag.id, count).await?;
            tracing::warn!(
                "Corrected count of tag {}: {} -> {}",
                tag.public_id,
                tag.tagged_objects_count,
                count
            );
            corrections.push(CountCorrection {
                tag_id: tag.public_id,
                stored: tag.tagged_objects_count,
                actual: count,
            });
        }

        txn.commit().await?;
        Ok(corrections)
    }

    /// Announces every non-system tag of the group that tags nothing.
    /// Returns how many were announced.
    pub async fn sweep_orphans(
        db: &DatabaseConnection,
        publisher: &dyn EventPublisher,
        config: &Config,
        group: &tag_group::Model,
    ) -> Result<usize, AppError> {
        let tags = TagRepository::find_all_in_group(db, group.id).await?;
        let counts = TaggedObjectRepository::count_by_tag(db, group.id).await?;

        let orphans: Vec<_> = tags
            .into_iter()
            .filter(|t| !t.is_system_tag && !counts.contains_key(&t.id))
            .collect();
        if orphans.is_empty() {
            return Ok(0);
        }

        let formatted = TagService::format_many(db, orphans, group.public_id).await?;
        for tag in &formatted {
            EventService::publish_status_changed(publisher, config, tag).await?;
        }

        tracing::info!("Announced {} orphan tags in {}", formatted.len(), group.slug);
        Ok(formatted.len())
    }
}
