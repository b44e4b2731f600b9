use std::collections::{BTreeSet, HashMap};

use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::entities::{tag, tagged_object, tagged_object::Entity as TaggedObject};

pub struct TaggedObjectRepository;

impl TaggedObjectRepository {
    pub async fn find_by_object<C>(
        db: &C,
        object_id: &str,
        tag_group_id: i64,
    ) -> Result<Vec<tagged_object::Model>, DbErr>
    where
        C: ConnectionTrait,
    {
        TaggedObject::find()
            .filter(tagged_object::Column::ObjectId.eq(object_id))
            .filter(tagged_object::Column::TagGroupId.eq(tag_group_id))
            .all(db)
            .await
    }

    /// `(object_id, tag public id)` pairs of a group, optionally limited to
    /// some objects.
    pub async fn find_pairs_in_group<C>(
        db: &C,
        tag_group_id: i64,
        object_ids: &[String],
    ) -> Result<Vec<(String, Uuid)>, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut query = TaggedObject::find()
            .select_only()
            .column(tagged_object::Column::ObjectId)
            .column(tag::Column::PublicId)
            .join(JoinType::InnerJoin, tagged_object::Relation::Tag.def())
            .filter(tagged_object::Column::TagGroupId.eq(tag_group_id));

        if !object_ids.is_empty() {
            query = query.filter(tagged_object::Column::ObjectId.is_in(object_ids.iter().cloned()));
        }

        query
            .order_by_asc(tagged_object::Column::ObjectId)
            .into_tuple::<(String, Uuid)>()
            .all(db)
            .await
    }

    pub async fn insert_rows<C>(
        db: &C,
        object_id: &str,
        tag_group_id: i64,
        tag_ids: &BTreeSet<i64>,
    ) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        if tag_ids.is_empty() {
            return Ok(0);
        }

        let rows = tag_ids.iter().map(|tag_id| tagged_object::ActiveModel {
            id: NotSet,
            tag_id: Set(*tag_id),
            object_id: Set(object_id.to_string()),
            tag_group_id: Set(tag_group_id),
        });

        TaggedObject::insert_many(rows).exec_without_returning(db).await
    }

    pub async fn delete_by_object<C>(db: &C, object_id: &str, tag_group_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let res = TaggedObject::delete_many()
            .filter(tagged_object::Column::ObjectId.eq(object_id))
            .filter(tagged_object::Column::TagGroupId.eq(tag_group_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_by_tag<C>(db: &C, tag_id: i64, tag_group_id: i64) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let res = TaggedObject::delete_many()
            .filter(tagged_object::Column::TagId.eq(tag_id))
            .filter(tagged_object::Column::TagGroupId.eq(tag_group_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// Relation rows per tag id within a group. Tags without rows are absent.
    pub async fn count_by_tag<C>(db: &C, tag_group_id: i64) -> Result<HashMap<i64, i64>, DbErr>
    where
        C: ConnectionTrait,
    {
        let rows = TaggedObject::find()
            .select_only()
            .column(tagged_object::Column::TagId)
            .column_as(Expr::col(tagged_object::Column::Id).count(), "row_count")
            .filter(tagged_object::Column::TagGroupId.eq(tag_group_id))
            .group_by(tagged_object::Column::TagId)
            .into_tuple::<(i64, i64)>()
            .all(db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}
