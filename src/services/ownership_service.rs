//! Ownership filter: which tags a caller may see, as a query predicate.
//!
//! The predicate is a plain value built once per call and threaded into
//! every store query that needs it. It never touches the database itself.

use std::collections::BTreeSet;

use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, Condition};
use uuid::Uuid;

use crate::entities::{tag, tag_owner};
use crate::models::auth_model::CurrentUser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Admins see everything
    All,
    /// Tags with at least one owner id in the set
    Owners(BTreeSet<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipFilter {
    pub visibility: Visibility,
    pub target: Option<Uuid>,
    pub include_system_tags: bool,
}

impl OwnershipFilter {
    /// Restrict to tags the caller owns, by subject or tenant id, and to
    /// `target` when given.
    pub fn for_caller(caller: &CurrentUser, target: Option<Uuid>) -> Self {
        let visibility = if caller.is_admin {
            Visibility::All
        } else {
            let mut owners = BTreeSet::new();
            owners.insert(caller.id.clone());
            if let Some(tenant) = &caller.tenant {
                owners.insert(tenant.clone());
            }
            Visibility::Owners(owners)
        };

        Self {
            visibility,
            target,
            include_system_tags: false,
        }
    }

    /// Also admit system tags regardless of their owners.
    pub fn with_system_tags(mut self) -> Self {
        self.include_system_tags = true;
        self
    }

    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(target) = self.target {
            cond = cond.add(tag::Column::PublicId.eq(target));
        }

        if let Visibility::Owners(ids) = &self.visibility {
            let owned_by = Query::select()
                .column(tag_owner::Column::TagId)
                .from(tag_owner::Entity)
                .and_where(tag_owner::Column::OwnerId.is_in(ids.iter().cloned()))
                .to_owned();
            let owned = tag::Column::Id.in_subquery(owned_by);

            cond = if self.include_system_tags {
                cond.add(
                    Condition::any()
                        .add(owned)
                        .add(tag::Column::IsSystemTag.eq(true)),
                )
            } else {
                cond.add(owned)
            };
        }

        cond
    }
}
