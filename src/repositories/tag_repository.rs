use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entities::{tag, tag::Entity as Tag, tag_owner};
use crate::models::tag_model::{SortOrder, TagOwnerDto, TagSortField};
use crate::services::ownership_service::OwnershipFilter;

pub struct TagRepository;

impl TagRepository {
    pub async fn list<C>(
        db: &C,
        tag_group_id: i64,
        filter: &OwnershipFilter,
        only_tagged: bool,
        sort_by: TagSortField,
        sort_order: SortOrder,
    ) -> Result<Vec<tag::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = Tag::find()
            .filter(tag::Column::TagGroupId.eq(tag_group_id))
            .filter(filter.condition());

        if only_tagged {
            query = query.filter(tag::Column::TaggedObjectsCount.gt(0));
        }

        let column = match sort_by {
            TagSortField::Name => tag::Column::Name,
            TagSortField::CreatedAt => tag::Column::CreatedAt,
            TagSortField::UpdatedAt => tag::Column::UpdatedAt,
            TagSortField::TaggedObjectsCount => tag::Column::TaggedObjectsCount,
        };
        let order = match sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        // Secondary key keeps equal sort values stable
        query
            .order_by(column, order)
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await
    }

    pub async fn find_one<C>(
        db: &C,
        tag_group_id: i64,
        filter: &OwnershipFilter,
    ) -> Result<Option<tag::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Tag::find()
            .filter(tag::Column::TagGroupId.eq(tag_group_id))
            .filter(filter.condition())
            .one(db)
            .await
    }

    pub async fn find_by_public_ids<C>(
        db: &C,
        tag_group_id: i64,
        public_ids: &HashSet<Uuid>,
        filter: &OwnershipFilter,
    ) -> Result<Vec<tag::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        if public_ids.is_empty() {
            return Ok(Vec::new());
        }

        Tag::find()
            .filter(tag::Column::TagGroupId.eq(tag_group_id))
            .filter(tag::Column::PublicId.is_in(public_ids.iter().copied()))
            .filter(filter.condition())
            .all(db)
            .await
    }

    pub async fn find_all_in_group<C>(db: &C, tag_group_id: i64) -> Result<Vec<tag::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        Tag::find()
            .filter(tag::Column::TagGroupId.eq(tag_group_id))
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await
    }

    /// Owner lists keyed by tag id, each in stored order.
    pub async fn owners_of<C>(db: &C, tag_ids: &[i64]) -> Result<HashMap<i64, Vec<TagOwnerDto>>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut owners: HashMap<i64, Vec<TagOwnerDto>> = HashMap::new();
        if tag_ids.is_empty() {
            return Ok(owners);
        }

        let rows = tag_owner::Entity::find()
            .filter(tag_owner::Column::TagId.is_in(tag_ids.iter().copied()))
            .order_by_asc(tag_owner::Column::TagId)
            .order_by_asc(tag_owner::Column::Position)
            .all(db)
            .await?;

        for row in rows {
            owners.entry(row.tag_id).or_default().push(TagOwnerDto {
                id: row.owner_id,
                owner_type: row.owner_type,
            });
        }
        Ok(owners)
    }

    pub async fn insert<C>(db: &C, model: tag::ActiveModel) -> Result<tag::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        model.insert(db).await
    }

    pub async fn update<C>(db: &C, model: tag::ActiveModel) -> Result<tag::Model, DbErr>
    where
        C: ConnectionTrait,
    {
        model.update(db).await
    }

    pub async fn replace_owners<C>(db: &C, tag_id: i64, owners: &[TagOwnerDto]) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        tag_owner::Entity::delete_many()
            .filter(tag_owner::Column::TagId.eq(tag_id))
            .exec(db)
            .await?;

        if owners.is_empty() {
            return Ok(());
        }

        let rows = owners.iter().enumerate().map(|(position, owner)| tag_owner::ActiveModel {
            tag_id: Set(tag_id),
            position: Set(position as i32),
            owner_id: Set(owner.id.clone()),
            owner_type: Set(owner.owner_type),
        });
        tag_owner::Entity::insert_many(rows).exec_without_returning(db).await?;
        Ok(())
    }

    pub async fn delete<C>(db: &C, tag_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        tag_owner::Entity::delete_many()
            .filter(tag_owner::Column::TagId.eq(tag_id))
            .exec(db)
            .await?;

        let res = Tag::delete_by_id(tag_id).exec(db).await?;
        Ok(res.rows_affected)
    }

    /// Adds `delta` to the cached count of every listed tag in one statement
    /// (`SET tagged_objects_count = tagged_objects_count + delta`), so
    /// concurrent adjustments never overwrite each other.
    pub async fn adjust_counts<C>(db: &C, tag_ids: &[i64], delta: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        if tag_ids.is_empty() || delta == 0 {
            return Ok(0);
        }

        let res = Tag::update_many()
            .col_expr(
                tag::Column::TaggedObjectsCount,
                Expr::col(tag::Column::TaggedObjectsCount).add(delta),
            )
            .filter(tag::Column::Id.is_in(tag_ids.iter().copied()))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Overwrites a cached count. Maintenance only.
    pub async fn set_count<C>(db: &C, tag_id: i64, value: i64) -> Result<(), DbErr>
    where
        C: ConnectionTrait,
    {
        Tag::update_many()
            .col_expr(tag::Column::TaggedObjectsCount, Expr::value(value))
            .filter(tag::Column::Id.eq(tag_id))
            .exec(db)
            .await?;
        Ok(())
    }
}
