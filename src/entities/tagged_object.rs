use sea_orm::entity::prelude::*;

/// One "object X carries tag T within group G" assertion.
/// `(object_id, tag_group_id, tag_id)` is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tagged_objects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub tag_id: i64,
    pub object_id: String,
    pub tag_group_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Tag,
    #[sea_orm(
        belongs_to = "super::tag_group::Entity",
        from = "Column::TagGroupId",
        to = "super::tag_group::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TagGroup,
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl Related<super::tag_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
