/// End-to-end flow tests
///
/// These need a real PostgreSQL database (set `DATABASE_URL`), so they are
/// `#[ignore]`d by default:
///
/// ```bash
/// DATABASE_URL=postgresql://localhost/taskdeck_test cargo test -p taskdeck-web -- --ignored
/// ```
///
/// They run with CSRF verification disabled, which per the configuration
/// contract must not change any handler behavior.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, db_app, get, post_form, redirect_target, session_cookie};
use uuid::Uuid;

/// Registers a fresh user and returns (email, session cookie)
async fn register_user(app: &Router, name: &str) -> (String, String) {
    let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
    let body = format!(
        "name={}&email={}&password=pass123&confirm_password=pass123",
        name,
        email.replace('@', "%40"),
    );

    let response = post_form(app, "/auth/register", &body, None).await;
    assert_eq!(redirect_target(&response), "/tasks");
    let cookie = session_cookie(&response).expect("session cookie after register");

    (email, cookie)
}

/// Creates a task through the form endpoint
async fn create_task(app: &Router, cookie: &str, title: &str, status: &str, priority: u8) {
    let body = format!(
        "title={}&description=&status={}&priority={}&due_date=&tags=",
        title.replace(' ', "+"),
        status,
        priority,
    );

    let response = post_form(app, "/tasks", &body, Some(cookie)).await;
    assert_eq!(redirect_target(&response), "/tasks");
}

/// Fetches the rendered task list data bag
async fn list_tasks(app: &Router, cookie: &str, query: &str) -> serde_json::Value {
    let response = get(app, &format!("/tasks{}", query), Some(cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_register_stores_hash_and_login_verifies() {
    let (app, pool) = db_app(true).await.unwrap();

    let (email, cookie) = register_user(&app, "Alice").await;

    // The stored record never contains the plaintext
    let (hash,): (String,) =
        sqlx::query_as("SELECT password_hash FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_ne!(hash, "pass123");
    assert!(hash.starts_with("$argon2id$"));

    // Auto-login after registration
    let listing = get(&app, "/tasks", Some(&cookie)).await;
    assert_eq!(listing.status(), StatusCode::OK);

    // Wrong password: generic failure, back to the login page
    let bad = post_form(
        &app,
        "/auth/login",
        &format!("email={}&password=wrong", email.replace('@', "%40")),
        None,
    )
    .await;
    assert_eq!(redirect_target(&bad), "/auth/login");

    // Correct password succeeds
    let good = post_form(
        &app,
        "/auth/login",
        &format!("email={}&password=pass123", email.replace('@', "%40")),
        None,
    )
    .await;
    assert_eq!(redirect_target(&good), "/tasks");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_duplicate_email_rejected() {
    let (app, _pool) = db_app(true).await.unwrap();

    let (email, _) = register_user(&app, "Alice").await;

    let body = format!(
        "name=Impostor&email={}&password=pass123&confirm_password=pass123",
        email.replace('@', "%40"),
    );
    let response = post_form(&app, "/auth/register", &body, None).await;
    assert_eq!(redirect_target(&response), "/auth/register");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_owner_isolation_under_filters() {
    let (app, _pool) = db_app(true).await.unwrap();

    let (_, alice) = register_user(&app, "Alice").await;
    let (_, bob) = register_user(&app, "Bob").await;

    create_task(&app, &alice, "Buy milk", "pending", 3).await;

    // Bob's unfiltered list does not include Alice's task
    let bob_list = list_tasks(&app, &bob, "").await;
    let titles: Vec<String> = bob_list["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert!(!titles.contains(&"Buy milk".to_string()));

    // Even when every filter value matches Alice's task
    let bob_filtered =
        list_tasks(&app, &bob, "?search=milk&status=pending&priority=3").await;
    assert!(bob_filtered["data"]["tasks"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_status_filter_and_priority_sort() {
    let (app, _pool) = db_app(true).await.unwrap();
    let (_, cookie) = register_user(&app, "Carol").await;

    create_task(&app, &cookie, "one", "pending", 2).await;
    create_task(&app, &cookie, "two", "completed", 1).await;
    create_task(&app, &cookie, "three", "in-progress", 4).await;
    create_task(&app, &cookie, "four", "completed", 5).await;
    create_task(&app, &cookie, "five", "completed", 3).await;

    let listing = list_tasks(&app, &cookie, "?status=completed&sort=priority-high").await;
    let tasks = listing["data"]["tasks"].as_array().unwrap();

    assert_eq!(tasks.len(), 3);
    let priorities: Vec<i64> = tasks
        .iter()
        .map(|t| t["priority"].as_i64().unwrap())
        .collect();
    assert_eq!(priorities, vec![5, 3, 1]);
    assert!(tasks.iter().all(|t| t["status"] == "completed"));

    // Counts cover the full set, not just the filtered rows
    assert_eq!(listing["data"]["counts"]["pending"], 1);
    assert_eq!(listing["data"]["counts"]["in-progress"], 1);
    assert_eq!(listing["data"]["counts"]["completed"], 3);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_is_completed_tracks_status_across_updates() {
    let (app, pool) = db_app(true).await.unwrap();
    let (_, cookie) = register_user(&app, "Dave").await;

    create_task(&app, &cookie, "flagged", "completed", 3).await;

    let (id, is_completed): (Uuid, bool) =
        sqlx::query_as("SELECT id, is_completed FROM tasks WHERE title = 'flagged'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(is_completed);

    let body = "title=flagged&description=&status=pending&priority=3&due_date=&tags=";
    let response = post_form(&app, &format!("/tasks/update/{}", id), body, Some(&cookie)).await;
    assert_eq!(redirect_target(&response), "/tasks");

    let (is_completed,): (bool,) =
        sqlx::query_as("SELECT is_completed FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!is_completed);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_delete_outcomes_are_indistinguishable() {
    let (app, pool) = db_app(true).await.unwrap();

    let (_, alice) = register_user(&app, "Alice").await;
    let (_, bob) = register_user(&app, "Bob").await;

    create_task(&app, &alice, "private", "pending", 3).await;
    let (task_id,): (Uuid,) = sqlx::query_as("SELECT id FROM tasks WHERE title = 'private'")
        .fetch_one(&pool)
        .await
        .unwrap();

    // Bob deleting Alice's task, Bob deleting a bogus id, and Alice deleting
    // twice all land on the same redirect with the same flash
    let foreign = post_form(&app, &format!("/tasks/delete/{}", task_id), "", Some(&bob)).await;
    assert_eq!(redirect_target(&foreign), "/tasks");

    let bogus = post_form(
        &app,
        &format!("/tasks/delete/{}", Uuid::new_v4()),
        "",
        Some(&bob),
    )
    .await;
    assert_eq!(redirect_target(&bogus), "/tasks");

    let first = post_form(&app, &format!("/tasks/delete/{}", task_id), "", Some(&alice)).await;
    assert_eq!(redirect_target(&first), "/tasks");

    let second = post_form(&app, &format!("/tasks/delete/{}", task_id), "", Some(&alice)).await;
    assert_eq!(redirect_target(&second), "/tasks");

    let listing = list_tasks(&app, &bob, "").await;
    let flashes = listing["data"]["flashes"].as_array().unwrap();
    assert!(flashes
        .iter()
        .any(|f| f["message"].as_str().unwrap().contains("not found")));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_title_boundaries_via_form() {
    let (app, _pool) = db_app(true).await.unwrap();
    let (_, cookie) = register_user(&app, "Erin").await;

    // 3 and 100 characters accepted
    for len in [3usize, 100] {
        let body = format!(
            "title={}&description=&status=pending&priority=3&due_date=&tags=",
            "x".repeat(len)
        );
        let response = post_form(&app, "/tasks", &body, Some(&cookie)).await;
        assert_eq!(redirect_target(&response), "/tasks", "length {}", len);
    }

    // 2 and 101 characters rejected with a re-render
    for len in [2usize, 101] {
        let body = format!(
            "title={}&description=&status=pending&priority=3&due_date=&tags=",
            "x".repeat(len)
        );
        let response = post_form(&app, "/tasks", &body, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "length {}", len);
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database via DATABASE_URL"]
async fn test_login_honors_return_to_once() {
    let (app, _pool) = db_app(true).await.unwrap();
    let (email, _) = register_user(&app, "Frank").await;

    // Anonymous hit on a gated page captures the target
    let gated = get(&app, "/tasks/new", None).await;
    assert_eq!(redirect_target(&gated), "/auth/login");
    let cookie = session_cookie(&gated).expect("session cookie");

    // Login replays it...
    let login = post_form(
        &app,
        "/auth/login",
        &format!("email={}&password=pass123", email.replace('@', "%40")),
        Some(&cookie),
    )
    .await;
    assert_eq!(redirect_target(&login), "/tasks/new");
    let cookie = session_cookie(&login).unwrap_or(cookie);

    // ...exactly once: after logout, a fresh login lands on the default
    let logout = get(&app, "/auth/logout", Some(&cookie)).await;
    assert_eq!(redirect_target(&logout), "/?logged_out=true");

    let relogin = post_form(
        &app,
        "/auth/login",
        &format!("email={}&password=pass123", email.replace('@', "%40")),
        None,
    )
    .await;
    assert_eq!(redirect_target(&relogin), "/tasks");
}
