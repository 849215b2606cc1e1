use postplan_core::db::open_db_in_memory;
use postplan_core::{
    PostId, PostService, PostServiceError, PostStatus, RepoError, SqlitePostRepository,
};
use rusqlite::{params, Connection};
use serde_json::{json, Map, Value};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object payload, got {other}"),
    }
}

#[test]
fn create_and_get_roundtrip_stores_normalized_values() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "title": "   ",
            "body": "note update announcement\nwith link",
            "tags": "a, b ,,c",
            "status": "bogus",
            "purpose": "LEARN",
        })))
        .unwrap();

    assert_eq!(created.title, None);
    assert_eq!(created.body, "note update announcement\nwith link");
    assert_eq!(created.tags, "a,b,c");
    assert_eq!(created.status, PostStatus::Draft);
    assert_eq!(created.purpose.as_str(), "LEARN");
    assert_eq!(created.scheduled_at, None);
    assert_eq!(created.posted_at, None);
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = service.get_post(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn create_without_body_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let err = service.create_post(&payload(json!({}))).unwrap_err();
    assert!(matches!(err, PostServiceError::Validation(_)));

    let err = service
        .create_post(&payload(json!({"body": "   "})))
        .unwrap_err();
    assert!(matches!(err, PostServiceError::Validation(_)));
}

#[test]
fn scheduled_create_stores_only_the_scheduled_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "body": "hi",
            "status": "SCHEDULED",
            "scheduledAt": "2025-01-01T00:00",
            "postedAt": "2025-01-02T00:00",
        })))
        .unwrap();

    assert_eq!(created.status, PostStatus::Scheduled);
    assert!(created.scheduled_at.is_some());
    assert_eq!(created.posted_at, None);
}

#[test]
fn update_applies_three_way_patch_semantics() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "title": "keep me",
            "body": "original body",
            "tags": "one,two",
        })))
        .unwrap();

    // title cleared, tags replaced, body untouched.
    let updated = service
        .update_post(
            created.id,
            &payload(json!({"title": null, "tags": " x , y"})),
        )
        .unwrap();
    assert_eq!(updated.title, None);
    assert_eq!(updated.tags, "x,y");
    assert_eq!(updated.body, "original body");

    // absent keys keep everything.
    let unchanged = service.update_post(created.id, &payload(json!({}))).unwrap();
    assert_eq!(unchanged.title, None);
    assert_eq!(unchanged.tags, "x,y");
    assert_eq!(unchanged.body, "original body");
}

#[test]
fn update_bumps_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let id = {
        let repo = SqlitePostRepository::try_new(&conn).unwrap();
        let service = PostService::new(repo);
        service
            .create_post(&payload(json!({"body": "hi"})))
            .unwrap()
            .id
    };

    conn.execute(
        "UPDATE posts SET updated_at = 1000 WHERE id = ?1;",
        params![id.to_string()],
    )
    .unwrap();

    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);
    let updated = service.update_post(id, &payload(json!({}))).unwrap();
    assert_ne!(updated.updated_at, 1000);
}

#[test]
fn update_to_posted_clears_scheduled_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "body": "hi",
            "status": "SCHEDULED",
            "scheduledAt": "2025-01-01T00:00",
        })))
        .unwrap();
    assert!(created.scheduled_at.is_some());

    let posted = service
        .update_post(
            created.id,
            &payload(json!({"status": "POSTED", "postedAt": "2025-02-01T12:00"})),
        )
        .unwrap();
    assert_eq!(posted.status, PostStatus::Posted);
    assert_eq!(posted.scheduled_at, None);
    assert!(posted.posted_at.is_some());
}

#[test]
fn update_back_to_draft_clears_both_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "body": "hi",
            "status": "SCHEDULED",
            "scheduledAt": "2025-01-01T00:00",
        })))
        .unwrap();

    let drafted = service
        .update_post(created.id, &payload(json!({"status": "DRAFT"})))
        .unwrap();
    assert_eq!(drafted.status, PostStatus::Draft);
    assert_eq!(drafted.scheduled_at, None);
    assert_eq!(drafted.posted_at, None);
}

#[test]
fn update_with_unparseable_date_leaves_stored_value_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({
            "body": "hi",
            "status": "SCHEDULED",
            "scheduledAt": "2025-01-01T00:00",
        })))
        .unwrap();
    let original = created.scheduled_at;

    let updated = service
        .update_post(created.id, &payload(json!({"scheduledAt": "garbage"})))
        .unwrap();
    assert_eq!(updated.scheduled_at, original);
}

#[test]
fn update_with_blank_body_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({"body": "hi"})))
        .unwrap();
    let err = service
        .update_post(created.id, &payload(json!({"body": "  "})))
        .unwrap_err();
    assert!(matches!(err, PostServiceError::Validation(_)));
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let missing = PostId::new_v4();
    let err = service
        .update_post(missing, &payload(json!({"body": "hi"})))
        .unwrap_err();
    assert!(matches!(err, PostServiceError::PostNotFound(id) if id == missing));
}

#[test]
fn delete_removes_row_and_second_delete_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let created = service
        .create_post(&payload(json!({"body": "hi"})))
        .unwrap();
    service.delete_post(created.id).unwrap();
    assert!(service.get_post(created.id).unwrap().is_none());

    let err = service.delete_post(created.id).unwrap_err();
    assert!(matches!(err, PostServiceError::PostNotFound(_)));
}

#[test]
fn list_orders_by_recency_and_supports_status_filter() {
    let conn = open_db_in_memory().unwrap();
    let (first_id, second_id) = {
        let repo = SqlitePostRepository::try_new(&conn).unwrap();
        let service = PostService::new(repo);
        let first = service
            .create_post(&payload(json!({"body": "first"})))
            .unwrap();
        let second = service
            .create_post(&payload(json!({
                "body": "second",
                "status": "SCHEDULED",
                "scheduledAt": "2025-03-01T00:00",
            })))
            .unwrap();
        (first.id.to_string(), second.id.to_string())
    };

    conn.execute(
        "UPDATE posts SET updated_at = 2000 WHERE id = ?1;",
        params![first_id],
    )
    .unwrap();
    conn.execute(
        "UPDATE posts SET updated_at = 1000 WHERE id = ?1;",
        params![second_id],
    )
    .unwrap();

    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);

    let listed = service.list_posts(None, Some(10), 0).unwrap();
    assert_eq!(listed.items.len(), 2);
    assert_eq!(listed.items[0].id.to_string(), first_id);
    assert_eq!(listed.items[1].id.to_string(), second_id);

    let scheduled_only = service
        .list_posts(Some(PostStatus::Scheduled), Some(10), 0)
        .unwrap();
    assert_eq!(scheduled_only.items.len(), 1);
    assert_eq!(scheduled_only.items[0].id.to_string(), second_id);
}

#[test]
fn list_limit_defaults_to_50_and_caps_at_200() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);
    for idx in 0..60 {
        service
            .create_post(&payload(json!({"body": format!("post {idx}")})))
            .unwrap();
    }

    let defaulted = service.list_posts(None, None, 0).unwrap();
    assert_eq!(defaulted.applied_limit, 50);
    assert_eq!(defaulted.items.len(), 50);

    let zero = service.list_posts(None, Some(0), 0).unwrap();
    assert_eq!(zero.applied_limit, 50);

    let capped = service.list_posts(None, Some(500), 0).unwrap();
    assert_eq!(capped.applied_limit, 200);
    assert_eq!(capped.items.len(), 60);
}

#[test]
fn list_pagination_with_limit_and_offset_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo);
    for idx in 0..3 {
        service
            .create_post(&payload(json!({"body": format!("post {idx}")})))
            .unwrap();
    }

    conn.execute("UPDATE posts SET updated_at = 1234567890000;", [])
        .unwrap();

    let mut ordered_ids: Vec<String> = conn
        .prepare("SELECT id FROM posts ORDER BY updated_at DESC, id ASC;")
        .unwrap()
        .query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();

    let page = service.list_posts(None, Some(2), 1).unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id.to_string(), ordered_ids.remove(1));
    assert_eq!(page.items[1].id.to_string(), ordered_ids.remove(1));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqlitePostRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_posts_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        postplan_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqlitePostRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("posts"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_posts_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE posts (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT,
            body TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!(
        "PRAGMA user_version = {};",
        postplan_core::db::migrations::latest_version()
    ))
    .unwrap();

    let result = SqlitePostRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "posts",
            column: "status"
        })
    ));
}
