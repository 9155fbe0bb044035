use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use roster_api::app::{build_app_with, services};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = build_app_with(Arc::new(services::build_in_memory_services()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn harry_payload() -> serde_json::Value {
    json!({
        "name": "Harry Potter",
        "email": "harry@potter.com",
        "age": 53,
        "gender": "male",
        "house": "gryffindor",
        "blood_status": "pure_blood",
    })
}

async fn create_user(
    client: &reqwest::Client,
    base_url: &str,
    payload: &serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/users/", base_url))
        .json(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

/// The update path is intentionally asynchronous (enqueue now, apply later).
/// Poll the task until it leaves `pending`.
async fn poll_task_to_terminal(
    client: &reqwest::Client,
    base_url: &str,
    task_id: &str,
) -> serde_json::Value {
    for _ in 0..200 {
        let res = client
            .get(format!("{}/tasks/{}", base_url, task_id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: serde_json::Value = res.json().await.unwrap();
        if body["status"] != "pending" {
            return body;
        }

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    panic!("task did not reach a terminal state within timeout");
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_user_sanity() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let data = create_user(&client, &srv.base_url, &harry_payload()).await;

    assert_eq!(data["name"], "Harry Potter");
    assert_eq!(data["email"], "harry@potter.com");
    assert_eq!(data["age"], 53);
    assert_eq!(data["gender"], "male");
    assert_eq!(data["house"], "gryffindor");
    assert_eq!(data["blood_status"], "pure_blood");
    assert!(!data["id"].is_null());
}

#[tokio::test]
async fn create_user_age_is_optional() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut payload = harry_payload();
    payload.as_object_mut().unwrap().remove("age");
    let data = create_user(&client, &srv.base_url, &payload).await;

    assert!(data["age"].is_null());
    assert!(!data["id"].is_null());
}

#[tokio::test]
async fn create_user_rejects_out_of_enum_values() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for (field, value) in [
        ("gender", "maleasdfasdfljasdflkjasdf"),
        ("house", "gryffindor2"),
        ("blood_status", "pure_blood123"),
    ] {
        let mut payload = harry_payload();
        payload[field] = json!(value);

        let res = client
            .post(format!("{}/users/", srv.base_url))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(
            res.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "expected 422 for invalid {field}"
        );
    }
}

#[tokio::test]
async fn create_user_rejects_missing_required_field() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut payload = harry_payload();
    payload.as_object_mut().unwrap().remove("name");

    let res = client
        .post(format!("{}/users/", srv.base_url))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_users_returns_everything_up_to_the_cap() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for _ in 0..100 {
        create_user(&client, &srv.base_url, &harry_payload()).await;
    }

    let res = client
        .get(format!("{}/users/", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let data: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(data.len(), 100);
}

#[tokio::test]
async fn list_users_pagination_is_stable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for _ in 0..20 {
        ids.push(create_user(&client, &srv.base_url, &harry_payload()).await["id"].clone());
    }

    let res = client
        .get(format!("{}/users/?limit=5&offset=5", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let page: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(page.len(), 5);
    // Starts right after the first five insertion-ordered records.
    let page_ids: Vec<serde_json::Value> = page.iter().map(|u| u["id"].clone()).collect();
    assert_eq!(page_ids, ids[5..10].to_vec());
}

#[tokio::test]
async fn list_users_rejects_limits_above_the_cap() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for bad in ["101", "0", "100000"] {
        let res = client
            .get(format!("{}/users/?limit={}", srv.base_url, bad))
            .send()
            .await
            .unwrap();
        assert_eq!(
            res.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "expected 422 for limit={bad}"
        );
    }
}

#[tokio::test]
async fn read_user_round_trips_the_created_record() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;

    let res = client
        .get(format!("{}/users/{}", srv.base_url, created["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let read: serde_json::Value = res.json().await.unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn read_unknown_user_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/users/424242", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_user_tombstones_the_record() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;
    let id = &created["id"];

    let res = client
        .delete(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({"ok": true}));

    // Gone from direct reads.
    let res = client
        .get(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Gone from listings.
    let res = client
        .get(format!("{}/users/", srv.base_url))
        .send()
        .await
        .unwrap();
    let data: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(data.is_empty());

    // Repeat deletes fail, they don't silently succeed.
    let res = client
        .delete(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_merges_only_submitted_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;

    let res = client
        .patch(format!("{}/users/{}", srv.base_url, created["id"]))
        .json(&json!({"house": "slytherin", "age": 54}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let task_id = body["task_id"].as_str().expect("task_id in response");

    let task = poll_task_to_terminal(&client, &srv.base_url, task_id).await;
    assert_eq!(task["status"], "success");
    assert_eq!(task["id"], task_id);

    // Submitted fields changed; omitted fields kept their prior values.
    let result = &task["result"];
    assert_eq!(result["house"], "slytherin");
    assert_eq!(result["age"], 54);
    assert_eq!(result["name"], "Harry Potter");
    assert_eq!(result["email"], "harry@potter.com");
    assert_eq!(result["gender"], "male");
    assert_eq!(result["blood_status"], "pure_blood");

    // The store agrees with the task's snapshot.
    let read: serde_json::Value = client
        .get(format!("{}/users/{}", srv.base_url, created["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(read, *result);
}

#[tokio::test]
async fn partial_update_can_null_out_age() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;

    let res = client
        .patch(format!("{}/users/{}", srv.base_url, created["id"]))
        .json(&json!({"age": null}))
        .send()
        .await
        .unwrap();
    let task_id = res.json::<serde_json::Value>().await.unwrap()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let task = poll_task_to_terminal(&client, &srv.base_url, &task_id).await;
    assert_eq!(task["status"], "success");
    assert!(task["result"]["age"].is_null());
    assert_eq!(task["result"]["name"], "Harry Potter");
}

#[tokio::test]
async fn partial_update_rejects_out_of_enum_values() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;

    let res = client
        .patch(format!("{}/users/{}", srv.base_url, created["id"]))
        .json(&json!({"house": "durmstrang"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_of_unknown_user_resolves_to_failure() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .patch(format!("{}/users/424242", srv.base_url))
        .json(&json!({"age": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let task_id = res.json::<serde_json::Value>().await.unwrap()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let task = poll_task_to_terminal(&client, &srv.base_url, &task_id).await;
    assert_eq!(task["status"], "failure");
    assert_eq!(task["result"]["error"], "user not found");
}

#[tokio::test]
async fn update_of_deleted_user_resolves_to_failure() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_user(&client, &srv.base_url, &harry_payload()).await;
    let id = &created["id"];

    let res = client
        .delete(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .patch(format!("{}/users/{}", srv.base_url, id))
        .json(&json!({"name": "Tom Riddle"}))
        .send()
        .await
        .unwrap();
    let task_id = res.json::<serde_json::Value>().await.unwrap()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    let task = poll_task_to_terminal(&client, &srv.base_url, &task_id).await;
    assert_eq!(task["status"], "failure");
}

#[tokio::test]
async fn unknown_task_id_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // A well-formed but never-issued id, and a malformed one.
    for id in ["00000000-0000-7000-8000-000000000000", "not-a-task-id"] {
        let res = client
            .get(format!("{}/tasks/{}", srv.base_url, id))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "task id {id}");

        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"], "task_not_found");
    }
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Create → read back identical payload plus id.
    let created = create_user(&client, &srv.base_url, &harry_payload()).await;
    let id = created["id"].clone();

    let read: serde_json::Value = client
        .get(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(read, created);

    // Delete → ok, then both read paths exclude it.
    let res = client
        .delete(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/users/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let listed: Vec<serde_json::Value> = client
        .get(format!("{}/users/", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.iter().all(|u| u["id"] != id));
}
