//! Relation engine: the tag ↔ object relation table and the cached
//! per-tag counters that mirror it.
//!
//! Every read-diff-write on one `(object_id, tag_group_id)` pair runs under
//! [`ObjectLocks`] and inside a single transaction, so a pair is always
//! either fully at its old tag set or fully at its new one, counters
//! included. Counter moves go through `TagRepository::adjust_counts` only.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use sea_orm::*;
use uuid::Uuid;

use crate::models::auth_model::CurrentUser;
use crate::models::tag_model::{BatchFailure, BatchUpsertReport, TaggedObjectGroup, TaggedObjectInput};
use crate::repositories::tag_repository::TagRepository;
use crate::repositories::tagged_object_repository::TaggedObjectRepository;
use crate::services::ownership_service::OwnershipFilter;
use crate::utils::app_error::AppError;
use crate::utils::object_locks::ObjectLocks;

pub struct RelationService;

impl RelationService {
    /// Tag sets grouped by object. An empty `object_ids` means every object
    /// with at least one tag in the group.
    pub async fn list_by_object_ids<C>(
        db: &C,
        tag_group_id: i64,
        object_ids: &[String],
    ) -> Result<Vec<TaggedObjectGroup>, AppError>
    where
        C: ConnectionTrait,
    {
        let pairs = TaggedObjectRepository::find_pairs_in_group(db, tag_group_id, object_ids).await?;

        let mut grouped: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();
        for (object_id, tag_id) in pairs {
            grouped.entry(object_id).or_default().push(tag_id);
        }

        Ok(grouped
            .into_iter()
            .map(|(object_id, tags_ids)| TaggedObjectGroup { object_id, tags_ids })
            .collect())
    }

    /// Storage ids for `tag_ids`, or `None` unless every one of them exists
    /// in the group and is visible to the caller (owned or system).
    pub async fn resolve_tag_ids<C>(
        db: &C,
        caller: &CurrentUser,
        tag_ids: &HashSet<Uuid>,
        tag_group_id: i64,
    ) -> Result<Option<HashMap<Uuid, i64>>, AppError>
    where
        C: ConnectionTrait,
    {
        let filter = OwnershipFilter::for_caller(caller, None).with_system_tags();
        let found = TagRepository::find_by_public_ids(db, tag_group_id, tag_ids, &filter).await?;

        if found.len() != tag_ids.len() {
            return Ok(None);
        }
        Ok(Some(found.into_iter().map(|t| (t.public_id, t.id)).collect()))
    }

    /// Empty input is valid.
    pub async fn validate_tag_ids<C>(
        db: &C,
        caller: &CurrentUser,
        tag_ids: &HashSet<Uuid>,
        tag_group_id: i64,
    ) -> Result<bool, AppError>
    where
        C: ConnectionTrait,
    {
        Ok(Self::resolve_tag_ids(db, caller, tag_ids, tag_group_id).await?.is_some())
    }

    /// Replaces the object's tag set in the group with `requested` and
    /// moves counters by the difference. Returns the number of relation rows
    /// now present for the object.
    pub async fn upsert_object_tags(
        db: &DatabaseConnection,
        locks: &ObjectLocks,
        object_id: &str,
        tag_group_id: i64,
        requested: &BTreeSet<i64>,
    ) -> Result<u64, AppError> {
        let _guard = locks.acquire(object_id, tag_group_id).await;
        let txn = db.begin().await?;

        let old_rows = TaggedObjectRepository::find_by_object(&txn, object_id, tag_group_id).await?;
        let old: BTreeSet<i64> = old_rows.iter().map(|r| r.tag_id).collect();

        let to_add: Vec<i64> = requested.difference(&old).copied().collect();
        let to_remove: Vec<i64> = old.difference(requested).copied().collect();

        // Rows are rewritten wholesale; counters follow the diff, not the rows.
        if !old_rows.is_empty() {
            Self::remove_object_tags(&txn, object_id, tag_group_id).await?;
        }
        TaggedObjectRepository::insert_rows(&txn, object_id, tag_group_id, requested).await?;

        TagRepository::adjust_counts(&txn, &to_add, 1).await?;
        TagRepository::adjust_counts(&txn, &to_remove, -1).await?;

        txn.commit().await?;

        tracing::debug!(
            "Upserted {} in group {}: +{} -{}",
            object_id,
            tag_group_id,
            to_add.len(),
            to_remove.len()
        );
        Ok(requested.len() as u64)
    }

    /// Batch form of [`Self::upsert_object_tags`].
    ///
    /// Every referenced tag is checked up front; if any is invalid nothing
    /// is written. After that each object commits on its own: a failure
    /// stops the batch and is reported, earlier objects stay committed.
    /// Entries repeating an object id are merged into one tag set.
    pub async fn upsert_batch(
        db: &DatabaseConnection,
        locks: &ObjectLocks,
        caller: &CurrentUser,
        tag_group_id: i64,
        entries: Vec<TaggedObjectInput>,
    ) -> Result<BatchUpsertReport, AppError> {
        let mut order: Vec<String> = Vec::new();
        let mut requested: HashMap<String, BTreeSet<Uuid>> = HashMap::new();
        for entry in entries {
            if !requested.contains_key(&entry.object_id) {
                order.push(entry.object_id.clone());
            }
            requested.entry(entry.object_id).or_default().extend(entry.tags_ids);
        }

        let all_tags: HashSet<Uuid> = requested.values().flatten().copied().collect();
        let resolved = Self::resolve_tag_ids(db, caller, &all_tags, tag_group_id)
            .await?
            .ok_or_else(|| AppError::InvalidReference("Not all tagsIds are valid.".to_string()))?;

        let mut report = BatchUpsertReport::default();
        for object_id in order {
            let tag_ids: BTreeSet<i64> = requested
                .get(&object_id)
                .map(|ids| ids.iter().filter_map(|u| resolved.get(u).copied()).collect())
                .unwrap_or_default();

            match Self::upsert_object_tags(db, locks, &object_id, tag_group_id, &tag_ids).await {
                Ok(rows) => {
                    report.processed += rows;
                    report.objects += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Upsert stopped at {} after {} committed objects: {}",
                        object_id,
                        report.objects,
                        e
                    );
                    let message = e
                        .details()
                        .into_iter()
                        .next()
                        .map(|d| d.message)
                        .unwrap_or_else(|| e.to_string());
                    report.failure = Some(BatchFailure { object_id, message });
                    break;
                }
            }
        }

        Ok(report)
    }

    /// Deletes the object's rows in the group. Counters are the caller's
    /// business.
    pub async fn remove_object_tags<C>(db: &C, object_id: &str, tag_group_id: i64) -> Result<u64, AppError>
    where
        C: ConnectionTrait,
    {
        Ok(TaggedObjectRepository::delete_by_object(db, object_id, tag_group_id).await?)
    }

    /// Deletes every row pointing at a tag that is about to be deleted.
    pub async fn cascade_on_tag_deletion<C>(db: &C, tag_id: i64, tag_group_id: i64) -> Result<u64, AppError>
    where
        C: ConnectionTrait,
    {
        Ok(TaggedObjectRepository::delete_by_tag(db, tag_id, tag_group_id).await?)
    }

    /// Drops an external object's rows and decrements the tags it carried.
    /// The decrement comes from the rows read in the same transaction, so a
    /// redelivered event finds nothing and changes nothing.
    pub async fn cascade_on_external_object_deletion(
        db: &DatabaseConnection,
        locks: &ObjectLocks,
        object_id: &str,
        tag_group_id: i64,
    ) -> Result<u64, AppError> {
        let _guard = locks.acquire(object_id, tag_group_id).await;
        let txn = db.begin().await?;

        let rows = TaggedObjectRepository::find_by_object(&txn, object_id, tag_group_id).await?;
        if rows.is_empty() {
            txn.rollback().await?;
            return Ok(0);
        }

        let deleted = Self::remove_object_tags(&txn, object_id, tag_group_id).await?;
        let tag_ids: Vec<i64> = rows.iter().map(|r| r.tag_id).collect();
        TagRepository::adjust_counts(&txn, &tag_ids, -1).await?;

        txn.commit().await?;

        tracing::info!("Removed {} tagged objects of deleted object {}", deleted, object_id);
        Ok(deleted)
    }
}
