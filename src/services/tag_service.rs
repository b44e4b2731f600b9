use sea_orm::*;
use uuid::Uuid;
use chrono::Utc;

use crate::entities::{tag, tag_group, tag_owner::OwnerType};
use crate::models::auth_model::CurrentUser;
use crate::models::tag_model::*;
use crate::repositories::tag_repository::TagRepository;
use crate::services::ownership_service::OwnershipFilter;
use crate::services::relation_service::RelationService;
use crate::utils::app_error::AppError;
use crate::utils::validator_utils::ensure_valid;

pub struct TagService;

fn tag_not_found() -> AppError {
    AppError::not_found("TAG_NOT_FOUND", "No tag found")
}

impl TagService {
    /// Tags of a group the caller owns, plus system tags.
    pub async fn list_tags(
        db: &DatabaseConnection,
        caller: &CurrentUser,
        group: &tag_group::Model,
        params: TagFilterParams,
    ) -> Result<Vec<TagResponse>, AppError> {
        let filter = OwnershipFilter::for_caller(caller, None).with_system_tags();
        let tags = TagRepository::list(
            db,
            group.id,
            &filter,
            params.has_tagged_objects.unwrap_or(false),
            params.sort_by.unwrap_or_default(),
            params.sort_order.unwrap_or_default(),
        )
        .await?;

        Self::format_many(db, tags, group.public_id).await
    }

    pub async fn get_tag(
        db: &DatabaseConnection,
        caller: &CurrentUser,
        group: &tag_group::Model,
        public_id: Uuid,
    ) -> Result<TagResponse, AppError> {
        let filter = OwnershipFilter::for_caller(caller, Some(public_id));
        let tag = TagRepository::find_one(db, group.id, &filter)
            .await?
            .ok_or_else(tag_not_found)?;

        Self::format_one(db, tag, group.public_id).await
    }

    pub async fn create_tag(
        db: &DatabaseConnection,
        caller: &CurrentUser,
        group: &tag_group::Model,
        payload: CreateTagRequest,
    ) -> Result<TagResponse, AppError> {
        let is_system_tag = payload.is_system_tag.unwrap_or(false);
        if is_system_tag && !caller.is_admin {
            return Err(AppError::Forbidden("Only admins can create system tags".to_string()));
        }

        let mut owners = payload.owners.unwrap_or_default();
        if !owners.iter().any(|o| o.id == caller.id) {
            owners.push(TagOwnerDto { id: caller.id.clone(), owner_type: OwnerType::User });
        }

        let draft = TagDraft {
            name: payload.name.trim().to_string(),
            description: payload.description,
            logo: payload.logo,
            owners,
            is_system_tag,
        };
        ensure_valid(&draft)?;

        let txn = db.begin().await?;

        let saved = TagRepository::insert(
            &txn,
            tag::ActiveModel {
                id: NotSet,
                public_id: Set(Uuid::now_v7()),
                name: Set(draft.name),
                description: Set(draft.description),
                logo: Set(draft.logo),
                tag_group_id: Set(group.id),
                tagged_objects_count: Set(0),
                is_system_tag: Set(draft.is_system_tag),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            },
        )
        .await?;
        TagRepository::replace_owners(&txn, saved.id, &draft.owners).await?;

        txn.commit().await?;

        tracing::info!("Created tag {} in group {}", saved.public_id, group.slug);
        Ok(Self::format(saved, draft.owners, group.public_id))
    }

    /// Merges `patch` onto a tag the caller owns, re-validates the result,
    /// then persists it.
    pub async fn update_tag(
        db: &DatabaseConnection,
        caller: &CurrentUser,
        group: &tag_group::Model,
        public_id: Uuid,
        patch: UpdateTagRequest,
    ) -> Result<TagResponse, AppError> {
        let filter = OwnershipFilter::for_caller(caller, Some(public_id));
        let existing = TagRepository::find_one(db, group.id, &filter)
            .await?
            .ok_or_else(tag_not_found)?;

        if patch.is_system_tag.is_some_and(|v| v != existing.is_system_tag) && !caller.is_admin {
            return Err(AppError::Forbidden("Only admins can change isSystemTag".to_string()));
        }

        let mut owners = match patch.owners {
            Some(owners) => owners,
            None => TagRepository::owners_of(db, &[existing.id])
                .await?
                .remove(&existing.id)
                .unwrap_or_default(),
        };
        if !owners.iter().any(|o| o.id == caller.id) {
            owners.push(TagOwnerDto { id: caller.id.clone(), owner_type: OwnerType::User });
            if let Some(tenant) = &caller.tenant {
                if !owners.iter().any(|o| &o.id == tenant) {
                    owners.push(TagOwnerDto { id: tenant.clone(), owner_type: OwnerType::Tenant });
                }
            }
        }

        let draft = TagDraft {
            name: patch.name.map(|n| n.trim().to_string()).unwrap_or_else(|| existing.name.clone()),
            description: patch.description.unwrap_or_else(|| existing.description.clone()),
            logo: patch.logo.unwrap_or_else(|| existing.logo.clone()),
            owners,
            is_system_tag: patch.is_system_tag.unwrap_or(existing.is_system_tag),
        };
        ensure_valid(&draft)?;

        let txn = db.begin().await?;

        let mut active: tag::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.description = Set(draft.description);
        active.logo = Set(draft.logo);
        active.is_system_tag = Set(draft.is_system_tag);
        active.updated_at = Set(Utc::now());

        let updated = TagRepository::update(&txn, active).await?;
        TagRepository::replace_owners(&txn, updated.id, &draft.owners).await?;

        txn.commit().await?;

        Ok(Self::format(updated, draft.owners, group.public_id))
    }

    /// Removes the tag's relation rows first, then the tag, in one
    /// transaction.
    pub async fn delete_tag(
        db: &DatabaseConnection,
        caller: &CurrentUser,
        group: &tag_group::Model,
        public_id: Uuid,
    ) -> Result<TagResponse, AppError> {
        let filter = OwnershipFilter::for_caller(caller, Some(public_id));
        let tag = TagRepository::find_one(db, group.id, &filter)
            .await?
            .ok_or_else(tag_not_found)?;
        let owners = TagRepository::owners_of(db, &[tag.id])
            .await?
            .remove(&tag.id)
            .unwrap_or_default();

        let txn = db.begin().await?;
        let removed = RelationService::cascade_on_tag_deletion(&txn, tag.id, group.id).await?;
        TagRepository::delete(&txn, tag.id).await?;
        txn.commit().await?;

        tracing::info!("Deleted tag {} and {} tagged objects", tag.public_id, removed);
        Ok(Self::format(tag, owners, group.public_id))
    }

    pub async fn format_many<C>(
        db: &C,
        tags: Vec<tag::Model>,
        group_public_id: Uuid,
    ) -> Result<Vec<TagResponse>, AppError>
    where
        C: ConnectionTrait,
    {
        let ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        let mut owners = TagRepository::owners_of(db, &ids).await?;

        Ok(tags
            .into_iter()
            .map(|t| {
                let tag_owners = owners.remove(&t.id).unwrap_or_default();
                Self::format(t, tag_owners, group_public_id)
            })
            .collect())
    }

    async fn format_one(
        db: &DatabaseConnection,
        tag: tag::Model,
        group_public_id: Uuid,
    ) -> Result<TagResponse, AppError> {
        let mut formatted = Self::format_many(db, vec![tag], group_public_id).await?;
        formatted.pop().ok_or_else(tag_not_found)
    }

    /// Storage ids out, public ids in.
    pub fn format(model: tag::Model, owners: Vec<TagOwnerDto>, group_public_id: Uuid) -> TagResponse {
        TagResponse {
            id: model.public_id,
            name: model.name,
            description: model.description,
            logo: model.logo,
            owners,
            tags_group_id: group_public_id,
            tagged_objects_count: model.tagged_objects_count,
            is_system_tag: model.is_system_tag,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
