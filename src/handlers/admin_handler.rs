use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension,
};
use serde_json::json;

use crate::config::AppState;
use crate::models::{auth_model::CurrentUser, tag_model::*};
use crate::services::maintenance_service::MaintenanceService;
use crate::services::relation_service::RelationService;
use crate::services::tag_group_service::TagGroupService;
use crate::utils::api_response::ResponseBuilder;
use crate::utils::app_error::AppError;
use crate::utils::validated_wrapper::ValidatedJson;

// 1. Tag groups
pub async fn create_tag_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateTagGroupRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_control_permission)?;

    let group = TagGroupService::create_group(&state.db, payload).await?;
    Ok(ResponseBuilder::created(group))
}

// 2. Counter reconciliation
pub async fn reconcile_counts_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_control_permission)?;

    let group = TagGroupService::find_by_slug(&state.db, &slug).await?;
    let corrections = MaintenanceService::reconcile_counts(&state.db, group.id).await?;
    tracing::info!("Reconciled {}: {} corrections", slug, corrections.len());
    Ok(ResponseBuilder::success(corrections))
}

// 3. Orphan sweep
pub async fn sweep_orphans_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_control_permission)?;

    let group = TagGroupService::find_by_slug(&state.db, &slug).await?;
    let published =
        MaintenanceService::sweep_orphans(&state.db, state.events.as_ref(), &state.config, &group).await?;
    Ok(ResponseBuilder::success(json!({ "published": published })))
}

// 4. Manual object deletion cascade, for deployments without a bus
pub async fn object_deleted_handler(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(slug): Path<String>,
    ValidatedJson(payload): ValidatedJson<ObjectDeletedRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&state.config.tagging_control_permission)?;

    let group = TagGroupService::find_by_slug(&state.db, &slug).await?;
    let deleted = RelationService::cascade_on_external_object_deletion(
        &state.db,
        &state.locks,
        &payload.object_id,
        group.id,
    )
    .await?;
    Ok(ResponseBuilder::success(json!({ "deleted": deleted })))
}
