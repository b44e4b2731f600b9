#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use uuid::Uuid;

use tagging_service::config::{AppState, Config};
use tagging_service::entities::tag_group::{self, TagGroupLevel, TagGroupType};
use tagging_service::entities::tag_owner::OwnerType;
use tagging_service::models::auth_model::CurrentUser;
use tagging_service::models::tag_model::{CreateTagRequest, TagOwnerDto, TagResponse, TaggedObjectInput};
use tagging_service::repositories::tag_group_repository::TagGroupRepository;
use tagging_service::repositories::tag_repository::TagRepository;
use tagging_service::repositories::tagged_object_repository::TaggedObjectRepository;
use tagging_service::services::event_service::SharedPublisher;
use tagging_service::services::relation_service::RelationService;
use tagging_service::services::tag_service::TagService;
use tagging_service::utils::jwt_utils::JwtUtils;
use tagging_service::utils::object_locks::ObjectLocks;

pub const SECRET: &str = "test-secret";
pub const READ: &str = "tagging.read";
pub const WRITE: &str = "tagging.write";
pub const CONTROL: &str = "tagging.control";

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    db
}

pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        redis_url: None,
        origin_whitelist: Vec::new(),
        tagging_read_permission: READ.to_string(),
        tagging_write_permission: WRITE.to_string(),
        tagging_control_permission: CONTROL.to_string(),
        object_deleted_event: "object.deleted".to_string(),
        status_changed_event: "collection.status.changed".to_string(),
        event_stream: "tagging-events".to_string(),
        event_consumer_group: "tagging-service".to_string(),
        event_consumer_name: "test".to_string(),
        cascade_group_slug: "collections".to_string(),
    }
}

pub fn test_state(db: DatabaseConnection, events: SharedPublisher) -> AppState {
    AppState {
        db,
        config: Arc::new(test_config()),
        locks: ObjectLocks::new(),
        events,
    }
}

pub fn user(id: &str) -> CurrentUser {
    CurrentUser {
        id: id.to_string(),
        tenant: None,
        is_admin: false,
        permissions: vec![READ.to_string(), WRITE.to_string()],
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser {
        id: "admin-1".to_string(),
        tenant: None,
        is_admin: true,
        permissions: Vec::new(),
    }
}

pub fn token(subject: &str, roles: &[&str], permissions: &[&str]) -> String {
    JwtUtils::generate_jwt(
        subject,
        None,
        roles.iter().map(|r| r.to_string()).collect(),
        permissions.iter().map(|p| p.to_string()).collect(),
        10,
        SECRET,
    )
    .unwrap()
}

pub async fn create_group(db: &DatabaseConnection, slug: &str) -> tag_group::Model {
    TagGroupRepository::create(
        db,
        slug.to_string(),
        slug.to_string(),
        TagGroupLevel::System,
        TagGroupType::Simple,
    )
    .await
    .unwrap()
}

pub fn tag_request(name: &str) -> CreateTagRequest {
    CreateTagRequest {
        name: name.to_string(),
        description: None,
        logo: None,
        owners: None,
        is_system_tag: None,
    }
}

pub async fn create_tag(
    db: &DatabaseConnection,
    caller: &CurrentUser,
    group: &tag_group::Model,
    name: &str,
) -> TagResponse {
    TagService::create_tag(db, caller, group, tag_request(name)).await.unwrap()
}

pub async fn create_system_tag(db: &DatabaseConnection, group: &tag_group::Model, name: &str) -> TagResponse {
    let mut req = tag_request(name);
    req.is_system_tag = Some(true);
    req.owners = Some(vec![]);
    TagService::create_tag(db, &admin(), group, req).await.unwrap()
}

pub fn tenant_owner(id: &str) -> TagOwnerDto {
    TagOwnerDto {
        id: id.to_string(),
        owner_type: OwnerType::Tenant,
    }
}

pub fn input(object_id: &str, tags: &[Uuid]) -> TaggedObjectInput {
    TaggedObjectInput {
        object_id: object_id.to_string(),
        tags_ids: tags.to_vec(),
    }
}

pub async fn stored_count(db: &DatabaseConnection, group: &tag_group::Model, tag_id: Uuid) -> i64 {
    TagRepository::find_all_in_group(db, group.id)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.public_id == tag_id)
        .map(|t| t.tagged_objects_count)
        .expect("tag exists")
}

pub async fn tags_of(db: &DatabaseConnection, group: &tag_group::Model, object_id: &str) -> BTreeSet<Uuid> {
    RelationService::list_by_object_ids(db, group.id, &[object_id.to_string()])
        .await
        .unwrap()
        .into_iter()
        .flat_map(|g| g.tags_ids)
        .collect()
}

/// Every cached count equals the number of relation rows for its tag.
pub async fn assert_counts_consistent(db: &DatabaseConnection, group: &tag_group::Model) {
    let actual = TaggedObjectRepository::count_by_tag(db, group.id).await.unwrap();
    for tag in TagRepository::find_all_in_group(db, group.id).await.unwrap() {
        assert_eq!(
            tag.tagged_objects_count,
            actual.get(&tag.id).copied().unwrap_or(0),
            "count drift on {}",
            tag.name
        );
    }
}

/// Makes every relation insert for `object_id` fail inside the store.
pub async fn reject_inserts_for(db: &DatabaseConnection, object_id: &str) {
    db.execute_unprepared(&format!(
        "CREATE TRIGGER reject_{0} BEFORE INSERT ON tagged_objects \
         WHEN NEW.object_id = '{0}' \
         BEGIN SELECT RAISE(ABORT, 'insert rejected'); END;",
        object_id
    ))
    .await
    .unwrap();
}
