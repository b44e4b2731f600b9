mod common;

use std::collections::{BTreeSet, HashSet};

use common::*;
use tagging_service::models::auth_model::CurrentUser;
use tagging_service::services::relation_service::RelationService;
use tagging_service::services::tag_service::TagService;
use tagging_service::utils::app_error::AppError;
use tagging_service::utils::object_locks::ObjectLocks;
use uuid::Uuid;

#[tokio::test]
async fn test_upsert_moves_counts_by_difference() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();

    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;
    let c = create_tag(&db, &caller, &group, "C").await.id;

    RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[a, b])])
        .await
        .unwrap();
    assert_eq!(stored_count(&db, &group, a).await, 1);
    assert_eq!(stored_count(&db, &group, b).await, 1);
    assert_eq!(stored_count(&db, &group, c).await, 0);

    let report = RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[b, c])])
        .await
        .unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.objects, 1);
    assert!(report.failure.is_none());

    assert_eq!(tags_of(&db, &group, "obj1").await, BTreeSet::from([b, c]));
    assert_eq!(stored_count(&db, &group, a).await, 0);
    assert_eq!(stored_count(&db, &group, b).await, 1);
    assert_eq!(stored_count(&db, &group, c).await, 1);
    assert_counts_consistent(&db, &group).await;
}

#[tokio::test]
async fn test_empty_tag_set_clears_object() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;

    RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[a])])
        .await
        .unwrap();
    let report = RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[])])
        .await
        .unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.objects, 1);
    assert!(tags_of(&db, &group, "obj1").await.is_empty());
    assert_eq!(stored_count(&db, &group, a).await, 0);
}

#[tokio::test]
async fn test_repeated_upsert_is_idempotent() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;

    for _ in 0..3 {
        RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[a, b])])
            .await
            .unwrap();
    }

    assert_eq!(tags_of(&db, &group, "obj1").await, BTreeSet::from([a, b]));
    assert_eq!(stored_count(&db, &group, a).await, 1);
    assert_eq!(stored_count(&db, &group, b).await, 1);
    assert_counts_consistent(&db, &group).await;
}

#[tokio::test]
async fn test_unknown_tag_rejects_whole_batch() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;

    let result = RelationService::upsert_batch(
        &db,
        &locks,
        &caller,
        group.id,
        vec![input("obj1", &[a]), input("obj2", &[Uuid::now_v7()])],
    )
    .await;

    assert!(matches!(result, Err(AppError::InvalidReference(_))));
    assert!(tags_of(&db, &group, "obj1").await.is_empty());
    assert_eq!(stored_count(&db, &group, a).await, 0);
}

#[tokio::test]
async fn test_validate_tag_ids() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let other_group = create_group(&db, "sections").await;
    let owner = user("user-1");
    let stranger = user("user-2");

    let mine = create_tag(&db, &owner, &group, "Mine").await.id;
    let elsewhere = create_tag(&db, &owner, &other_group, "Elsewhere").await.id;
    let system = create_system_tag(&db, &group, "Featured").await.id;

    let check = |caller: CurrentUser, ids: &[Uuid]| {
        let ids: HashSet<Uuid> = ids.iter().copied().collect();
        let db = db.clone();
        let group_id = group.id;
        async move { RelationService::validate_tag_ids(&db, &caller, &ids, group_id).await.unwrap() }
    };

    assert!(check(owner.clone(), &[]).await);
    assert!(check(owner.clone(), &[mine, system]).await);
    assert!(!check(owner.clone(), &[mine, Uuid::now_v7()]).await);
    // Tags of another group are unknown here
    assert!(!check(owner.clone(), &[elsewhere]).await);
    // Owned by someone else, but system tags are open to all
    assert!(!check(stranger.clone(), &[mine]).await);
    assert!(check(stranger.clone(), &[system]).await);
    assert!(check(admin(), &[mine]).await);
}

#[tokio::test]
async fn test_duplicate_entries_are_merged() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;
    let c = create_tag(&db, &caller, &group, "C").await.id;

    let report = RelationService::upsert_batch(
        &db,
        &locks,
        &caller,
        group.id,
        vec![input("obj1", &[a]), input("obj2", &[b]), input("obj1", &[c, a])],
    )
    .await
    .unwrap();

    assert_eq!(report.objects, 2);
    assert_eq!(report.processed, 3);
    assert_eq!(tags_of(&db, &group, "obj1").await, BTreeSet::from([a, c]));
    assert_eq!(tags_of(&db, &group, "obj2").await, BTreeSet::from([b]));
    assert_eq!(stored_count(&db, &group, a).await, 1);
    assert_counts_consistent(&db, &group).await;
}

#[tokio::test]
async fn test_list_by_object_ids_is_group_scoped() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let other_group = create_group(&db, "sections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let x = create_tag(&db, &caller, &other_group, "X").await.id;

    RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[a]), input("obj2", &[a])])
        .await
        .unwrap();
    RelationService::upsert_batch(&db, &locks, &caller, other_group.id, vec![input("obj1", &[x])])
        .await
        .unwrap();

    let all = RelationService::list_by_object_ids(&db, group.id, &[]).await.unwrap();
    let objects: Vec<&str> = all.iter().map(|g| g.object_id.as_str()).collect();
    assert_eq!(objects, vec!["obj1", "obj2"]);
    assert_eq!(all[0].tags_ids, vec![a]);

    let none = RelationService::list_by_object_ids(&db, group.id, &["missing".to_string()])
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_deleting_tag_cascades_relations() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;

    RelationService::upsert_batch(
        &db,
        &locks,
        &caller,
        group.id,
        vec![input("obj1", &[a, b]), input("obj2", &[a])],
    )
    .await
    .unwrap();

    let deleted = TagService::delete_tag(&db, &caller, &group, a).await.unwrap();
    assert_eq!(deleted.id, a);

    assert_eq!(tags_of(&db, &group, "obj1").await, BTreeSet::from([b]));
    assert!(tags_of(&db, &group, "obj2").await.is_empty());
    assert_eq!(stored_count(&db, &group, b).await, 1);
    assert_counts_consistent(&db, &group).await;

    let again = TagService::delete_tag(&db, &caller, &group, a).await;
    assert!(matches!(again, Err(AppError::NotFound { code: "TAG_NOT_FOUND", .. })));
}

#[tokio::test]
async fn test_external_deletion_decrements_once() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;

    RelationService::upsert_batch(&db, &locks, &caller, group.id, vec![input("obj1", &[a, b]), input("obj2", &[b])])
        .await
        .unwrap();

    let first = RelationService::cascade_on_external_object_deletion(&db, &locks, "obj1", group.id)
        .await
        .unwrap();
    let redelivered = RelationService::cascade_on_external_object_deletion(&db, &locks, "obj1", group.id)
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(redelivered, 0);
    assert_eq!(stored_count(&db, &group, a).await, 0);
    assert_eq!(stored_count(&db, &group, b).await, 1);
    assert_counts_consistent(&db, &group).await;
    assert!(locks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_keep_counts_consistent() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();

    let mut tags = Vec::new();
    for name in ["A", "B", "C", "D"] {
        tags.push(create_tag(&db, &caller, &group, name).await.id);
    }

    let mut handles = Vec::new();
    for i in 0..12 {
        let db = db.clone();
        let locks = locks.clone();
        let caller = caller.clone();
        let group_id = group.id;
        let object_id = if i % 3 == 0 { "obj2" } else { "obj1" };
        let wanted = vec![tags[i % 4], tags[(i + 1) % 4]];

        handles.push(tokio::spawn(async move {
            RelationService::upsert_batch(&db, &locks, &caller, group_id, vec![input(object_id, &wanted)])
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let report = handle.await.unwrap();
        assert!(report.failure.is_none());
    }

    assert_eq!(tags_of(&db, &group, "obj1").await.len(), 2);
    assert_eq!(tags_of(&db, &group, "obj2").await.len(), 2);
    assert_counts_consistent(&db, &group).await;
    assert!(locks.is_empty());
}

#[tokio::test]
async fn test_batch_stops_at_first_failed_object() {
    let db = setup_test_db().await;
    let group = create_group(&db, "collections").await;
    let caller = user("user-1");
    let locks = ObjectLocks::new();
    let a = create_tag(&db, &caller, &group, "A").await.id;
    let b = create_tag(&db, &caller, &group, "B").await.id;
    let c = create_tag(&db, &caller, &group, "C").await.id;
    reject_inserts_for(&db, "obj2").await;

    let report = RelationService::upsert_batch(
        &db,
        &locks,
        &caller,
        group.id,
        vec![input("obj1", &[a]), input("obj2", &[b]), input("obj3", &[c])],
    )
    .await
    .unwrap();

    assert_eq!(report.objects, 1);
    assert_eq!(report.processed, 1);
    let failure = report.failure.expect("obj2 fails");
    assert_eq!(failure.object_id, "obj2");
    assert_eq!(failure.message, "Database error");

    // Earlier objects stay committed, later ones are never attempted
    assert_eq!(tags_of(&db, &group, "obj1").await, BTreeSet::from([a]));
    assert!(tags_of(&db, &group, "obj2").await.is_empty());
    assert!(tags_of(&db, &group, "obj3").await.is_empty());
    assert_eq!(stored_count(&db, &group, a).await, 1);
    assert_eq!(stored_count(&db, &group, b).await, 0);
    assert_eq!(stored_count(&db, &group, c).await, 0);
    assert_counts_consistent(&db, &group).await;
    assert!(locks.is_empty());
}
