//! End-to-end tests of the request layer over file-backed storage.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use seven_core::{ManualClock, TaskCatalog, Time};
use seven_server::{serve_lines, Api, ApiResponse, ServerConfig};
use seven_storage::JsonStorage;

fn t0() -> Time {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

async fn setup(seed: bool) -> (Api, ManualClock, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage = JsonStorage::new(dir.path()).await.unwrap();
    if seed {
        storage.seed_catalog(&TaskCatalog::sample()).await.unwrap();
    }
    let clock = ManualClock::new(t0());
    let api = Api::new(Arc::new(storage), ServerConfig::default()).with_clock(Arc::new(clock.clone()));
    (api, clock, dir)
}

async fn call(api: &Api, request: Value) -> ApiResponse {
    api.handle_line(&request.to_string()).await
}

#[tokio::test]
async fn test_full_challenge_flow() {
    let (api, clock, dir) = setup(true).await;

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["currentDay"], 1);
    assert_eq!(response.body["isLocked"], false);
    assert_eq!(response.body["startTime"], 1_700_000_000_000i64);
    assert_eq!(response.body["completedDays"], json!([]));

    let response = call(&api, json!({"route": "get_tasks", "day": 1})).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["tasks"][0], "Complete 20 pushups");

    clock.advance(Duration::milliseconds(1000));
    let response = call(
        &api,
        json!({"route": "complete_day", "userId": "u1", "day": 1, "note": "did it"}),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["currentDay"], 2);
    assert_eq!(response.body["challengeComplete"], false);
    assert_eq!(response.body["nextUnlockTime"], 1_700_000_000_000i64 + 72_000_000);

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.body["isLocked"], true);
    assert_eq!(response.body["nextUnlockTime"], 1_700_000_000_000i64 + 72_000_000);
    assert_eq!(response.body["dayNotes"]["1"], "did it");

    let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
    let stored: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored["u1"]["currentDay"], 2);
    assert_eq!(stored["u1"]["lastCompletedTime"], 1_700_000_001_000i64);

    for day in 2..=7 {
        clock.advance(Duration::hours(9));
        let response = call(&api, json!({"route": "complete_day", "userId": "u1", "day": day})).await;
        assert_eq!(response.status, 200, "day {}", day);
    }

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.body["currentDay"], 8);
    assert_eq!(response.body["challengeComplete"], true);
}

#[tokio::test]
async fn test_replayed_completion_is_bad_request() {
    let (api, _clock, _dir) = setup(true).await;
    call(&api, json!({"route": "get_user", "userId": "u1"})).await;

    let first = call(&api, json!({"route": "complete_day", "userId": "u1", "day": 1})).await;
    assert!(first.is_success());

    let second = call(&api, json!({"route": "complete_day", "userId": "u1", "day": 1})).await;
    assert!(!second.is_success());
    assert_eq!(second.status, 400);
    assert_eq!(second.body["error"], "Invalid day completion");
}

#[tokio::test]
async fn test_completion_for_unknown_user_is_not_found() {
    let (api, _clock, _dir) = setup(true).await;
    let response = call(&api, json!({"route": "complete_day", "userId": "ghost", "day": 1})).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "User not found");
}

#[tokio::test]
async fn test_stale_user_is_reset_on_read() {
    let (api, clock, _dir) = setup(true).await;
    call(&api, json!({"route": "get_user", "userId": "u1"})).await;

    clock.advance(Duration::hours(71));
    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.body["currentDay"], 1);
    assert_eq!(
        response.body["startTime"],
        (t0() + Duration::hours(71)).timestamp_millis()
    );
}

#[tokio::test]
async fn test_reset_route() {
    let (api, clock, _dir) = setup(true).await;
    call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    call(&api, json!({"route": "complete_day", "userId": "u1", "day": 1})).await;

    clock.advance(Duration::hours(1));
    let response = call(&api, json!({"route": "reset", "userId": "u1"})).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["success"], true);

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.body["currentDay"], 1);
    assert_eq!(response.body["isLocked"], false);
    assert_eq!(
        response.body["startTime"],
        (t0() + Duration::hours(1)).timestamp_millis()
    );
}

#[tokio::test]
async fn test_catalog_routes() {
    let (api, _clock, _dir) = setup(false).await;

    let response = call(&api, json!({"route": "get_tasks", "day": 3})).await;
    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "Tasks not found for this day");

    let response = call(&api, json!({"route": "put_tasks", "tasks": {"3": ["a", "b"]}})).await;
    assert_eq!(response.status, 200);

    let response = call(&api, json!({"route": "get_tasks", "day": 3})).await;
    assert_eq!(response.body["tasks"], json!(["a", "b"]));

    let response = call(&api, json!({"route": "list_tasks"})).await;
    assert_eq!(response.body, json!({"day3": ["a", "b"]}));
}

#[tokio::test]
async fn test_malformed_requests_are_rejected() {
    let (api, _clock, _dir) = setup(true).await;

    let response = api.handle_line("not json").await;
    assert_eq!(response.status, 400);

    let response = call(&api, json!({"route": "complete_day", "userId": "u1", "day": "1"})).await;
    assert_eq!(response.status, 400);

    let response = call(&api, json!({"route": "complete_day", "userId": "u1", "day": -1})).await;
    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_origin_allow_list() {
    let (api, _clock, _dir) = setup(true).await;

    let response = call(
        &api,
        json!({"route": "health", "origin": "http://localhost:5173"}),
    )
    .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.body["status"], "ok");

    let response = call(
        &api,
        json!({"route": "get_user", "userId": "u1", "origin": "https://evil.example"}),
    )
    .await;
    assert_eq!(response.status, 403);
}

#[tokio::test]
async fn test_serve_lines_answers_each_request() {
    let (api, _clock, _dir) = setup(true).await;

    let input = concat!(
        r#"{"id":1,"route":"get_user","userId":"u1"}"#,
        "\n\n",
        r#"{"id":2,"route":"complete_day","userId":"u1","day":5}"#,
        "\n",
    );
    let mut output = Vec::new();
    serve_lines(&api, input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<ApiResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].id, Some(json!(1)));
    assert_eq!(responses[0].status, 200);
    assert_eq!(responses[1].id, Some(json!(2)));
    assert_eq!(responses[1].status, 400);
}

#[tokio::test]
async fn test_late_completion_restarts_attempt() {
    let (api, clock, _dir) = setup(true).await;
    call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    for day in 1..=6 {
        let response = call(&api, json!({"route": "complete_day", "userId": "u1", "day": day})).await;
        assert!(response.is_success(), "day {}", day);
    }

    clock.set(t0() + Duration::hours(75));
    let response = call(&api, json!({"route": "complete_day", "userId": "u1", "day": 7})).await;
    assert_eq!(response.status, 400);

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.body["currentDay"], 1);
    assert_eq!(response.body["challengeComplete"], false);
}

#[tokio::test]
async fn test_corrupt_record_is_server_error() {
    let (api, _clock, dir) = setup(true).await;
    std::fs::write(
        dir.path().join("users.json"),
        r#"{"u1":{"currentDay":4000000000,"startTime":1700000000000,"lastCompletedTime":1700000000000}}"#,
    )
    .unwrap();

    let response = call(&api, json!({"route": "get_user", "userId": "u1"})).await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body["error"], "Server error");

    let response = call(&api, json!({"route": "health"})).await;
    assert!(response.is_success());
}
