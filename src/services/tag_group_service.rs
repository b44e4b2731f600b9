use sea_orm::*;
use slug::slugify;

use crate::entities::tag_group::{self, TagGroupLevel, TagGroupType};
use crate::models::tag_model::{CreateTagGroupRequest, TagGroupResponse};
use crate::repositories::tag_group_repository::TagGroupRepository;
use crate::utils::app_error::{AppError, FieldError};

pub struct TagGroupService;

impl TagGroupService {
    /// Unknown slugs are a distinct `NotFound`, never an empty group.
    pub async fn find_by_slug<C>(db: &C, slug: &str) -> Result<tag_group::Model, AppError>
    where
        C: ConnectionTrait,
    {
        TagGroupRepository::find_by_slug(db, slug)
            .await?
            .ok_or_else(|| AppError::not_found("TAG_GROUP_NOT_FOUND", "No slug found"))
    }

    pub async fn create_group(
        db: &DatabaseConnection,
        payload: CreateTagGroupRequest,
    ) -> Result<TagGroupResponse, AppError> {
        let name = payload.name.trim().to_string();
        let slug = payload.slug.unwrap_or_else(|| slugify(&name));

        if slug.is_empty() || slug.len() > 30 {
            return Err(AppError::Validation(vec![FieldError {
                field: "slug".to_string(),
                code: "length".to_string(),
                message: "Slug must be 1 to 30 chars".to_string(),
            }]));
        }

        if TagGroupRepository::find_by_slug(db, &slug).await?.is_some() {
            return Err(AppError::Conflict(format!("Tag group '{}' already exists", slug)));
        }

        let saved = TagGroupRepository::create(
            db,
            name,
            slug,
            payload.level.unwrap_or(TagGroupLevel::System),
            payload.group_type.unwrap_or(TagGroupType::Simple),
        )
        .await?;

        tracing::info!("Created tag group {}", saved.slug);
        Ok(Self::format(saved))
    }

    pub fn format(model: tag_group::Model) -> TagGroupResponse {
        TagGroupResponse {
            id: model.public_id,
            name: model.name,
            slug: model.slug,
            level: model.level,
            group_type: model.group_type,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
