use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter};
use uuid::Uuid;
use chrono::Utc;
use crate::entities::tag;
use crate::entities::tag_group::{TagGroupLevel, TagGroupType};
use crate::repositories::tag_group_repository::TagGroupRepository;
use crate::repositories::tag_repository::TagRepository;

pub const SYSTEM_TAG_GROUP: &str = "sections";

const TAG_GROUPS: [(&str, &str); 2] = [("Collections", "collections"), ("Sections", "sections")];

const SYSTEM_TAGS: [&str; 4] = ["Featured", "New", "Recommended", "Most popular"];

pub async fn seed_tag_groups(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, slug) in TAG_GROUPS {
        if TagGroupRepository::find_by_slug(db, slug).await?.is_none() {
            TagGroupRepository::create(
                db,
                name.to_string(),
                slug.to_string(),
                TagGroupLevel::System,
                TagGroupType::Simple,
            )
            .await?;
            tracing::info!("Seeded tag group: {}", slug);
        }
    }

    Ok(())
}

pub async fn seed_system_tags(db: &DatabaseConnection) -> Result<(), DbErr> {
    let Some(group) = TagGroupRepository::find_by_slug(db, SYSTEM_TAG_GROUP).await? else {
        return Err(DbErr::RecordNotFound(format!("tag group {}", SYSTEM_TAG_GROUP)));
    };

    for name in SYSTEM_TAGS {
        let exists = tag::Entity::find()
            .filter(tag::Column::TagGroupId.eq(group.id))
            .filter(tag::Column::Name.eq(name))
            .one(db)
            .await?;

        if exists.is_none() {
            let new_tag = tag::ActiveModel {
                id: NotSet,
                public_id: Set(Uuid::now_v7()),
                name: Set(name.to_string()),
                description: Set(None),
                logo: Set(None),
                tag_group_id: Set(group.id),
                tagged_objects_count: Set(0),
                is_system_tag: Set(true),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            TagRepository::insert(db, new_tag).await?;
            tracing::info!("Seeded system tag: {}", name);
        }
    }

    Ok(())
}
