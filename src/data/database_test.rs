//! Database tests

use super::*;
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn new_user(github_id: &str, username: &str) -> NewUser {
    NewUser {
        github_id: github_id.to_string(),
        username: username.to_string(),
        name: username.to_string(),
        email: None,
        avatar_url: None,
        profile_url: format!("https://github.com/{username}"),
    }
}

async fn create_user(db: &Database, github_id: &str, username: &str) -> User {
    db.insert_user_if_absent(&new_user(github_id, username), Utc::now())
        .await
        .unwrap();
    db.get_user_by_github_id(github_id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_database_connection() {
    let (db, _temp_dir) = create_test_db().await;

    let now = db.current_time().await.unwrap();
    assert!((Utc::now() - now).num_seconds().abs() < 60);
}

#[tokio::test]
async fn test_insert_user_if_absent_is_idempotent() {
    let (db, _temp_dir) = create_test_db().await;
    let user = new_user("1001", "octocat");

    assert!(db.insert_user_if_absent(&user, Utc::now()).await.unwrap());
    assert!(!db.insert_user_if_absent(&user, Utc::now()).await.unwrap());

    let stored = db.get_user_by_github_id("1001").await.unwrap().unwrap();
    assert_eq!(stored.username, "octocat");
    assert_eq!(db.get_user(stored.id).await.unwrap().unwrap().github_id, "1001");
}

#[tokio::test]
async fn test_auth_token_lookup() {
    let (db, _temp_dir) = create_test_db().await;
    let user = create_user(&db, "1001", "octocat").await;

    assert!(db.set_user_auth_token(user.id, "first").await.unwrap());
    assert!(db.set_user_auth_token(user.id, "second").await.unwrap());

    // Overwritten token no longer resolves
    assert!(db.get_user_by_auth_token("first").await.unwrap().is_none());

    let found = db.get_user_by_auth_token("second").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_ne!(found.auth_token.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_attendance_open_and_close() {
    let (db, _temp_dir) = create_test_db().await;
    let user = create_user(&db, "1001", "octocat").await;
    let check_in = Utc::now();

    let opened = db
        .insert_attendance(user.id, "lab-1", Some("arrived"), check_in)
        .await
        .unwrap();
    assert!(opened.is_open());
    assert_eq!(opened.notes.as_deref(), Some("arrived"));

    let open = db.get_open_attendance(user.id, "lab-1").await.unwrap();
    assert_eq!(open.as_ref().map(|r| r.id), Some(opened.id));

    // Absent notes keep the stored ones
    let closed = db
        .close_open_attendance(user.id, "lab-1", None, check_in + Duration::minutes(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(closed.id, opened.id);
    assert!(!closed.is_open());
    assert_eq!(closed.notes.as_deref(), Some("arrived"));

    assert!(db.get_open_attendance(user.id, "lab-1").await.unwrap().is_none());
    assert!(
        db.close_open_attendance(user.id, "lab-1", None, Utc::now())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_second_open_record_is_rejected() {
    let (db, _temp_dir) = create_test_db().await;
    let user = create_user(&db, "1001", "octocat").await;

    db.insert_attendance(user.id, "lab-1", None, Utc::now())
        .await
        .unwrap();

    let error = db
        .insert_attendance(user.id, "lab-1", None, Utc::now())
        .await
        .expect_err("partial unique index must reject a second open record");
    assert!(error.is_unique_violation());

    // Other labs are independent
    db.insert_attendance(user.id, "lab-2", None, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_attendance_is_scoped_and_ordered() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = create_user(&db, "1", "alice").await;
    let bob = create_user(&db, "2", "bob").await;
    let start = Utc::now() - Duration::hours(3);

    db.insert_attendance(alice.id, "lab-1", None, start)
        .await
        .unwrap();
    db.close_open_attendance(alice.id, "lab-1", None, start + Duration::hours(1))
        .await
        .unwrap();
    db.insert_attendance(alice.id, "lab-1", None, start + Duration::hours(2))
        .await
        .unwrap();
    db.insert_attendance(bob.id, "lab-1", None, start).await.unwrap();

    let records = db.list_attendance(alice.id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].check_in > records[1].check_in);
    assert!(records.iter().all(|r| r.user_id == alice.id));
}
