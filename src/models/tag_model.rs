use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::tag_group::{TagGroupLevel, TagGroupType};
use crate::entities::tag_owner::OwnerType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOwnerDto {
    pub id: String,
    #[serde(rename = "type")]
    pub owner_type: OwnerType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    pub owners: Vec<TagOwnerDto>,
    pub tags_group_id: Uuid,
    pub tagged_objects_count: i64,
    pub is_system_tag: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagGroupResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub level: TagGroupLevel,
    #[serde(rename = "type")]
    pub group_type: TagGroupType,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Name is required and must be at most 50 chars"))]
    pub name: String,
    #[validate(length(max = 300, message = "Description must be at most 300 chars"))]
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owners: Option<Vec<TagOwnerDto>>,
    pub is_system_tag: Option<bool>,
}

/// `null` in a PATCH body is `Some(None)`, an absent field is `None`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Merged onto the stored tag. Absent fields keep their value; `null`
/// clears `description` and `logo`. The merged result is validated as a
/// whole before it is stored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 50, message = "Name is required and must be at most 50 chars"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo: Option<Option<String>>,
    pub owners: Option<Vec<TagOwnerDto>>,
    pub is_system_tag: Option<bool>,
}

/// The stored shape of a tag, validated before every write.
#[derive(Debug, Clone, Validate)]
pub struct TagDraft {
    #[validate(length(min = 1, max = 50, message = "Name is required and must be at most 50 chars"))]
    pub name: String,
    #[validate(length(max = 300, message = "Description must be at most 300 chars"))]
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owners: Vec<TagOwnerDto>,
    pub is_system_tag: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TagSortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
    TaggedObjectsCount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagFilterParams {
    pub has_tagged_objects: Option<bool>,
    pub sort_by: Option<TagSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedObjectGroup {
    pub object_id: String,
    pub tags_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaggedObjectInput {
    #[validate(length(min = 1, max = 128, message = "objectId must be 1 to 128 chars"))]
    pub object_id: String,
    pub tags_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertTaggedObjectsRequest {
    #[validate(nested)]
    pub tagged_objects: Vec<TaggedObjectInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub object_id: String,
    pub message: String,
}

/// Outcome of a batch upsert. Objects are committed one by one, so a
/// failure leaves the ones before it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpsertReport {
    /// Relation rows now present for the committed objects
    pub processed: u64,
    /// Objects committed
    pub objects: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<BatchFailure>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagGroupRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Name is required and must be at most 50 chars"))]
    pub name: String,
    #[validate(length(min = 1, max = 30, message = "Slug must be 1 to 30 chars"))]
    pub slug: Option<String>,
    pub level: Option<TagGroupLevel>,
    #[serde(rename = "type")]
    pub group_type: Option<TagGroupType>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDeletedRequest {
    #[validate(length(min = 1, max = 128, message = "objectId must be 1 to 128 chars"))]
    pub object_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountCorrection {
    pub tag_id: Uuid,
    pub stored: i64,
    pub actual: i64,
}
