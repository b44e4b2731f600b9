use sea_orm::*;
use chrono::Utc;
use uuid::Uuid;
use crate::entities::{tag_group, tag_group::Entity as TagGroup};
use crate::entities::tag_group::{TagGroupLevel, TagGroupType};

pub struct TagGroupRepository;

impl TagGroupRepository {
    pub async fn find_by_slug<C>(db: &C, slug: &str) -> Result<Option<tag_group::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        TagGroup::find()
            .filter(tag_group::Column::Slug.eq(slug))
            .one(db)
            .await
    }

    pub async fn create<C>(
        db: &C,
        name: String,
        slug: String,
        level: TagGroupLevel,
        group_type: TagGroupType,
    ) -> Result<tag_group::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        let new_group = tag_group::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::now_v7()),
            name: Set(name),
            slug: Set(slug),
            level: Set(level),
            group_type: Set(group_type),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        new_group.insert(db).await
    }
}
