use axum::{
    extract::{rejection::QueryRejection, Path, Query, RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Extension,
};
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::tag_group;
use crate::models::{auth_model::CurrentUser, tag_model::*};
use crate::services::relation_service::RelationService;
use crate::services::tag_group_service::TagGroupService;
use crate::services::tag_service::TagService;
use crate::utils::api_response::{ErrorDetail, ResponseBuilder};
use crate::utils::app_error::AppError;
use crate::utils::validated_wrapper::ValidatedJson;

async fn load_group(state: &AppState, slug: &str) -> Result<tag_group::Model, AppError> {
    TagGroupService::find_by_slug(&state.db, slug).await
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId("Invalid id".to_string()))
}

/// Every `objectId` key of the query string, in order. Repeating the key
/// selects several objects.
fn object_ids_from_query(query: Option<&str>) -> Vec<String> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .filter(|(key, value)| key == "objectId" && !value.is_empty())
                .map(|(_, value)| value.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn list_tags_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    params: Result<Query<TagFilterParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_read_permission)?;
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let group = load_group(&state, &slug).await?;
    let tags = TagService::list_tags(&state.db, &user, &group, params).await?;
    Ok(ResponseBuilder::success(tags))
}

pub async fn create_tag_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    ValidatedJson(payload): ValidatedJson<CreateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_write_permission)?;

    let group = load_group(&state, &slug).await?;
    let tag = TagService::create_tag(&state.db, &user, &group, payload).await?;
    Ok(ResponseBuilder::created(tag))
}

pub async fn get_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_read_permission)?;

    let group = load_group(&state, &slug).await?;
    Ok(ResponseBuilder::success(TagGroupService::format(group)))
}

pub async fn list_tagged_objects_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_read_permission)?;

    let group = load_group(&state, &slug).await?;
    let object_ids = object_ids_from_query(query.as_deref());
    let grouped = RelationService::list_by_object_ids(&state.db, group.id, &object_ids).await?;
    Ok(ResponseBuilder::success(grouped))
}

pub async fn upsert_tagged_objects_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpsertTaggedObjectsRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_write_permission)?;

    let group = load_group(&state, &slug).await?;
    let report = RelationService::upsert_batch(
        &state.db,
        &state.locks,
        &user,
        group.id,
        payload.tagged_objects,
    )
    .await?;

    let response = match &report.failure {
        None => ResponseBuilder::success(report).into_response(),
        Some(failure) => {
            let mut detail = ErrorDetail::new("UPSERT_FAILED", &failure.message);
            detail.field = Some(failure.object_id.clone());
            ResponseBuilder::fail_with_data(StatusCode::INTERNAL_SERVER_ERROR, vec![detail], report)
                .into_response()
        }
    };
    Ok(response)
}

pub async fn get_tag_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_read_permission)?;
    let id = parse_id(&id)?;

    let group = load_group(&state, &slug).await?;
    let tag = TagService::get_tag(&state.db, &user, &group, id).await?;
    Ok(ResponseBuilder::success(tag))
}

pub async fn update_tag_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((slug, id)): Path<(String, String)>,
    ValidatedJson(payload): ValidatedJson<UpdateTagRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_write_permission)?;
    let id = parse_id(&id)?;

    let group = load_group(&state, &slug).await?;
    let tag = TagService::update_tag(&state.db, &user, &group, id, payload).await?;
    Ok(ResponseBuilder::success(tag))
}

pub async fn delete_tag_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_write_permission)?;
    let id = parse_id(&id)?;

    let group = load_group(&state, &slug).await?;
    let tag = TagService::delete_tag(&state.db, &user, &group, id).await?;
    Ok(ResponseBuilder::success(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_repeated_object_ids() {
        let ids = object_ids_from_query(Some("objectId=a&objectId=b%20c&other=x&objectId="));
        assert_eq!(ids, vec!["a".to_string(), "b c".to_string()]);
    }

    #[test]
    fn missing_query_selects_nothing() {
        assert!(object_ids_from_query(None).is_empty());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(matches!(parse_id("not-a-uuid"), Err(AppError::InvalidId(_))));
        assert!(parse_id("0192e7a4-5b7c-7c3e-8a1d-3f2b6c9d4e10").is_ok());
    }
}
