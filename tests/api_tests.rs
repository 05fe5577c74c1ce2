// tests/api_tests.rs

use quiz_authoring::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    spawn_app_with(16, 1800).await
}

async fn spawn_app_with(max_sessions: usize, session_ttl_secs: u64) -> String {
    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        max_sessions,
        session_ttl_secs,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    let app = routes::create_router(AppState::new(config));

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn open_session(client: &reqwest::Client, address: &str) -> String {
    let response = client
        .post(format!("{}/api/editor/sessions", address))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to open session");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

async fn add_short_answer(
    client: &reqwest::Client,
    base: &str,
    prompt: &str,
    points: u32,
) -> String {
    let response = client
        .post(format!("{}/questions", base))
        .json(&json!({
            "question": prompt,
            "type": "short_answer",
            "correct_answer": "42",
            "points": points
        }))
        .send()
        .await
        .expect("Failed to add question");
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

fn prompts(view: &Value) -> Vec<String> {
    view["quiz"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["question"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn new_session_starts_with_empty_quiz() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;

    let view: Value = client
        .get(format!("{}/api/editor/sessions/{}", address, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(view["question_count"], 0);
    assert_eq!(view["total_points"], 0);
    assert_eq!(view["quiz"]["passing_score"], 70);
    assert_eq!(view["quiz"]["allowed_attempts"], -1);
    assert_eq!(view["dialog"]["status"], "closed");
}

#[tokio::test]
async fn save_is_blocked_until_quiz_is_complete() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;
    let base = format!("{}/api/editor/sessions/{}", address, session_id);

    // Empty title and no questions
    let response = client.post(format!("{}/save", base)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["questions", "title"]);

    // Title but still no questions
    client
        .patch(&base)
        .json(&json!({ "title": "Quiz A", "time_limit": 20 }))
        .send()
        .await
        .unwrap();
    let response = client.post(format!("{}/save", base)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Nothing reached the library
    let library: Value = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(library.as_array().unwrap().len(), 0);

    // Session survived the rejected saves
    add_short_answer(&client, &base, "Answer to everything?", 10).await;
    let response = client.post(format!("{}/save", base)).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let saved: Value = response.json().await.unwrap();
    assert_eq!(saved["revision"], 1);
    assert_eq!(saved["quiz"]["title"], "Quiz A");
    assert_eq!(saved["quiz"]["time_limit"], 20);

    // Saving ends the session
    let response = client.get(&base).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn reorder_and_delete_keep_order_dense() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;
    let base = format!("{}/api/editor/sessions/{}", address, session_id);

    let q1 = add_short_answer(&client, &base, "Q1", 10).await;
    let q2 = add_short_answer(&client, &base, "Q2", 5).await;
    let q3 = add_short_answer(&client, &base, "Q3", 1).await;

    // First question cannot move up
    let moved: Value = client
        .post(format!("{}/questions/{}/move", base, q1))
        .json(&json!({ "direction": "up" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moved["moved"], false);

    let moved: Value = client
        .post(format!("{}/questions/{}/move", base, q3))
        .json(&json!({ "direction": "up" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(moved["moved"], true);

    // Unconfirmed delete is refused
    let response = client
        .delete(format!("{}/questions/{}", base, q2))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .delete(format!("{}/questions/{}?confirm=true", base, q1))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let view: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(prompts(&view), vec!["Q3", "Q2"]);
    let orders: Vec<i64> = view["quiz"]["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(view["total_points"], 6);

    // Unknown question id
    let response = client
        .put(format!("{}/questions/{}", base, uuid::Uuid::new_v4()))
        .json(&json!({ "points": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn dialog_blocks_answer_outside_options() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;
    let dialog = format!("{}/api/editor/sessions/{}/dialog", address, session_id);

    let state: Value = client
        .post(&dialog)
        .json(&json!({}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["status"], "open");
    assert_eq!(state["form"]["type"], "multiple_choice");
    assert_eq!(state["form"]["options"].as_array().unwrap().len(), 4);

    let mut commands = vec![json!({ "action": "set_question", "text": "Capital of France?" })];
    for (i, city) in ["Paris", "London", "Berlin", "Madrid"].iter().enumerate() {
        commands.push(json!({ "action": "set_option", "index": i, "text": city }));
    }
    commands.push(json!({ "action": "set_correct_answer", "value": "Rome" }));
    for command in commands {
        let response = client.patch(&dialog).json(&command).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = client
        .post(format!("{}/submit", dialog))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["code"], "not_an_option");

    client
        .patch(&dialog)
        .json(&json!({ "action": "set_correct_answer", "value": "Paris" }))
        .send()
        .await
        .unwrap();
    let response = client
        .post(format!("{}/submit", dialog))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let question: Value = response.json().await.unwrap();
    assert_eq!(question["order"], 1);
    assert_eq!(question["correct_answer"], "Paris");

    let state: Value = client.get(&dialog).send().await.unwrap().json().await.unwrap();
    assert_eq!(state["status"], "closed");
}

#[tokio::test]
async fn dialog_true_false_ignores_previous_options() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;
    let dialog = format!("{}/api/editor/sessions/{}/dialog", address, session_id);

    client.post(&dialog).json(&json!({})).send().await.unwrap();
    for command in [
        json!({ "action": "set_option", "index": 0, "text": "Paris" }),
        json!({ "action": "set_type", "question_type": "true_false" }),
        json!({ "action": "set_question", "text": "Rust has a garbage collector" }),
        json!({ "action": "set_correct_answer", "value": "false" }),
    ] {
        client.patch(&dialog).json(&command).send().await.unwrap();
    }

    // Options cannot be edited on a true/false question
    let response = client
        .patch(&dialog)
        .json(&json!({ "action": "add_option" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let question: Value = client
        .post(format!("{}/submit", dialog))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(question["type"], "true_false");
    assert_eq!(question["correct_answer"], "false");
    assert!(question.get("options").is_none());
}

#[tokio::test]
async fn cancel_discards_and_library_reopens() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Save one quiz
    let session_id = open_session(&client, &address).await;
    let base = format!("{}/api/editor/sessions/{}", address, session_id);
    client
        .patch(&base)
        .json(&json!({ "title": "Ownership" }))
        .send()
        .await
        .unwrap();
    add_short_answer(&client, &base, "Who owns it?", 10).await;
    let saved: Value = client
        .post(format!("{}/save", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = saved["quiz"]["id"].as_str().unwrap().to_string();

    // Reopen, edit, cancel: library keeps the saved version
    let view: Value = client
        .post(format!("{}/api/quizzes/{}/edit", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prompts(&view), vec!["Who owns it?"]);
    let edit_base = format!(
        "{}/api/editor/sessions/{}",
        address,
        view["session_id"].as_str().unwrap()
    );
    client
        .patch(&edit_base)
        .json(&json!({ "title": "Borrowing" }))
        .send()
        .await
        .unwrap();
    let response = client
        .post(format!("{}/cancel", edit_base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let stored: Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["quiz"]["title"], "Ownership");
    assert_eq!(stored["revision"], 1);
}

#[tokio::test]
async fn session_limit_is_enforced() {
    let address = spawn_app_with(1, 1800).await;
    let client = reqwest::Client::new();
    open_session(&client, &address).await;

    let response = client
        .post(format!("{}/api/editor/sessions", address))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn idle_session_frees_its_slot() {
    // Arrange: one slot, one second of allowed idleness
    let address = spawn_app_with(1, 1).await;
    let client = reqwest::Client::new();
    let stale = open_session(&client, &address).await;

    // Act
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    let fresh = open_session(&client, &address).await;

    // Assert
    assert_ne!(stale, fresh);
    let response = client
        .get(format!("{}/api/editor/sessions/{}", address, stale))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn question_update_takes_flat_answer_fields() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, &address).await;
    let base = format!("{}/api/editor/sessions/{}", address, session_id);

    let response = client
        .post(format!("{}/questions", base))
        .json(&json!({
            "question": "Capital of France?",
            "type": "multiple_choice",
            "options": ["Paris", "London"],
            "correct_answer": "Paris"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let question: Value = response.json().await.unwrap();
    let id = question["id"].as_str().unwrap().to_string();

    // Same shape the question was created with
    let response = client
        .put(format!("{}/questions/{}", base, id))
        .json(&json!({
            "type": "multiple_choice",
            "options": ["Paris", "Lyon", "Nice"],
            "correct_answer": "Lyon"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["correct_answer"], "Lyon");
    assert_eq!(updated["options"].as_array().unwrap().len(), 3);

    // Answer fields without a type are refused, not ignored
    let response = client
        .put(format!("{}/questions/{}", base, id))
        .json(&json!({ "correct_answer": "Nice" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // Two equal options are refused
    let response = client
        .put(format!("{}/questions/{}", base, id))
        .json(&json!({
            "type": "multiple_choice",
            "options": ["Paris", "Paris"],
            "correct_answer": "Paris"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["details"][0]["code"], "duplicate_option");

    let view: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(view["quiz"]["questions"][0]["correct_answer"], "Lyon");
}
