mod common;

use common::*;
use tagging_service::models::tag_model::{
    CreateTagGroupRequest, SortOrder, TagFilterParams, TagSortField, UpdateTagRequest,
};
use tagging_service::services::relation_service::RelationService;
use tagging_service::services::tag_group_service::TagGroupService;
use tagging_service::services::tag_service::TagService;
use tagging_service::utils::app_error::AppError;
use tagging_service::utils::object_locks::ObjectLocks;

fn names(tags: &[tagging_service::models::tag_model::TagResponse]) -> Vec<&str> {
    tags.iter().map(|t| t.name.as_str()).collect()
}

#[tokio::test]
async fn test_create_tag_appends_caller_as_owner() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");

    let mut req = tag_request("  Summer  ");
    req.owners = Some(vec![tenant_owner("tenant-9")]);
    let tag = TagService::create_tag(&db, &caller, &group, req).await.unwrap();

    assert_eq!(tag.name, "Summer");
    assert_eq!(tag.tags_group_id, group.public_id);
    assert_eq!(tag.tagged_objects_count, 0);
    assert!(!tag.is_system_tag);
    let owners: Vec<&str> = tag.owners.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(owners, vec!["tenant-9", "user-1"]);
}

#[tokio::test]
async fn test_create_tag_validates_fields() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");

    let blank = TagService::create_tag(&db, &caller, &group, tag_request("   ")).await;
    match blank {
        Err(AppError::Validation(fields)) => assert_eq!(fields[0].field, "name"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let mut long = tag_request("Ok");
    long.description = Some("x".repeat(301));
    let result = TagService::create_tag(&db, &caller, &group, long).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let too_long = TagService::create_tag(&db, &caller, &group, tag_request(&"n".repeat(51))).await;
    assert!(matches!(too_long, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_only_admins_create_system_tags() {
    let db = setup_test_db().await;
    let group = create_group(&db, "sections").await;

    let mut req = tag_request("Featured");
    req.is_system_tag = Some(true);
    let result = TagService::create_tag(&db, &user("user-1"), &group, req).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let tag = create_system_tag(&db, &group, "Featured").await;
    assert!(tag.is_system_tag);
}

#[tokio::test]
async fn test_list_shows_owned_and_system_tags() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let alice = user("alice");
    let bob = user("bob");

    create_tag(&db, &alice, &group, "Beta").await;
    create_tag(&db, &alice, &group, "Alpha").await;
    create_tag(&db, &bob, &group, "Bobs").await;
    create_system_tag(&db, &group, "Featured").await;

    let listed = TagService::list_tags(&db, &alice, &group, TagFilterParams::default())
        .await
        .unwrap();
    assert_eq!(names(&listed), vec!["Alpha", "Beta", "Featured"]);

    let everything = TagService::list_tags(&db, &admin(), &group, TagFilterParams::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 4);
}

#[tokio::test]
async fn test_tenant_members_see_tenant_tags() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;

    let mut req = tag_request("Shared");
    req.owners = Some(vec![tenant_owner("tenant-1")]);
    TagService::create_tag(&db, &admin(), &group, req).await.unwrap();

    let mut member = user("member");
    member.tenant = Some("tenant-1".to_string());
    let outsider = user("outsider");

    let seen = TagService::list_tags(&db, &member, &group, TagFilterParams::default())
        .await
        .unwrap();
    assert_eq!(names(&seen), vec!["Shared"]);

    let unseen = TagService::list_tags(&db, &outsider, &group, TagFilterParams::default())
        .await
        .unwrap();
    assert!(unseen.is_empty());
}

#[tokio::test]
async fn test_list_filters_and_sorts_by_count() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();

    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;
    create_tag(&db, &caller, &group, "C").await;

    RelationService::upsert_batch(
        &db,
        &locks,
        &caller,
        group.id,
        vec![input("obj1", &[a, b]), input("obj2", &[b])],
    )
    .await
    .unwrap();

    let params = TagFilterParams {
        has_tagged_objects: Some(true),
        sort_by: Some(TagSortField::TaggedObjectsCount),
        sort_order: Some(SortOrder::Desc),
    };
    let listed = TagService::list_tags(&db, &caller, &group, params).await.unwrap();
    assert_eq!(names(&listed), vec!["B", "A"]);
    assert_eq!(listed[0].tagged_objects_count, 2);

    let params = TagFilterParams {
        sort_order: Some(SortOrder::Desc),
        ..Default::default()
    };
    let listed = TagService::list_tags(&db, &caller, &group, params).await.unwrap();
    assert_eq!(names(&listed), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn test_update_merges_onto_stored_tag() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let owner = user("user-1");

    let mut req = tag_request("Original");
    req.description = Some("first".to_string());
    let tag = TagService::create_tag(&db, &owner, &group, req).await.unwrap();

    let patch = UpdateTagRequest {
        logo: Some(Some("https://cdn.example.com/logo.png".to_string())),
        ..Default::default()
    };
    let updated = TagService::update_tag(&db, &owner, &group, tag.id, patch).await.unwrap();

    assert_eq!(updated.name, "Original");
    assert_eq!(updated.description.as_deref(), Some("first"));
    assert_eq!(updated.logo.as_deref(), Some("https://cdn.example.com/logo.png"));
    assert_eq!(updated.owners, tag.owners);

    let blank = UpdateTagRequest {
        name: Some(" ".to_string()),
        ..Default::default()
    };
    let result = TagService::update_tag(&db, &owner, &group, tag.id, blank).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let fetched = TagService::get_tag(&db, &owner, &group, tag.id).await.unwrap();
    assert_eq!(fetched.name, "Original");
}

#[tokio::test]
async fn test_update_can_clear_optional_fields() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let owner = user("user-1");

    let mut req = tag_request("Branded");
    req.description = Some("about".to_string());
    req.logo = Some("logo.png".to_string());
    let tag = TagService::create_tag(&db, &owner, &group, req).await.unwrap();

    let patch = UpdateTagRequest {
        description: Some(None),
        ..Default::default()
    };
    let updated = TagService::update_tag(&db, &owner, &group, tag.id, patch).await.unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.logo.as_deref(), Some("logo.png"));

    let fetched = TagService::get_tag(&db, &owner, &group, tag.id).await.unwrap();
    assert_eq!(fetched.description, None);
}

#[tokio::test]
async fn test_non_owner_cannot_touch_tag() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let other_group = create_group(&db, "sections").await;
    let owner = user("user-1");
    let stranger = user("user-2");
    let tag = create_tag(&db, &owner, &group, "Private").await;

    let get = TagService::get_tag(&db, &stranger, &group, tag.id).await;
    assert!(matches!(get, Err(AppError::NotFound { code: "TAG_NOT_FOUND", .. })));

    let update = TagService::update_tag(&db, &stranger, &group, tag.id, UpdateTagRequest::default()).await;
    assert!(matches!(update, Err(AppError::NotFound { .. })));

    let delete = TagService::delete_tag(&db, &stranger, &group, tag.id).await;
    assert!(matches!(delete, Err(AppError::NotFound { .. })));

    // Same id looked up through another group
    let wrong_group = TagService::get_tag(&db, &owner, &other_group, tag.id).await;
    assert!(matches!(wrong_group, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn test_system_tags_are_not_editable_by_users() {
    let db = setup_test_db().await;
    let group = create_group(&db, "sections").await;
    let system = create_system_tag(&db, &group, "Featured").await;

    let patch = UpdateTagRequest {
        name: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let result = TagService::update_tag(&db, &user("user-1"), &group, system.id, patch).await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[tokio::test]
async fn test_tag_groups() {
    let db = setup_test_db().await;

    let missing = TagGroupService::find_by_slug(&db, "nope").await;
    match missing {
        Err(e @ AppError::NotFound { .. }) => {
            assert_eq!(e.code(), "TAG_GROUP_NOT_FOUND");
            assert_eq!(e.to_string(), "No slug found");
        }
        other => panic!("expected not found, got {:?}", other),
    }

    let created = TagGroupService::create_group(
        &db,
        CreateTagGroupRequest {
            name: "Product Lines".to_string(),
            slug: None,
            level: None,
            group_type: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.slug, "product-lines");

    let duplicate = TagGroupService::create_group(
        &db,
        CreateTagGroupRequest {
            name: "Other".to_string(),
            slug: Some("product-lines".to_string()),
            level: None,
            group_type: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let found = TagGroupService::find_by_slug(&db, "product-lines").await.unwrap();
    assert_eq!(found.public_id, created.id);
}
