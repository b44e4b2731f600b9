use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i64,
    #[sea_orm(unique, index)]
    pub public_id: Uuid,

    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub tag_group_id: i64,

    // Cache over tagged_objects rows. Moved by TagRepository::adjust_counts, repaired by reconcile.
    pub tagged_objects_count: i64,
    pub is_system_tag: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tag_group::Entity",
        from = "Column::TagGroupId",
        to = "super::tag_group::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TagGroup,
    #[sea_orm(has_many = "super::tag_owner::Entity")]
    TagOwner,
    #[sea_orm(has_many = "super::tagged_object::Entity")]
    TaggedObject,
}

impl Related<super::tag_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagGroup.def()
    }
}

impl Related<super::tag_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagOwner.def()
    }
}

impl Related<super::tagged_object::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TaggedObject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
