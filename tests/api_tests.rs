// tests/api_tests.rs

use quizhub::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Each test needs a running Postgres pointed to by DATABASE_URL.
/// Without one the tests skip instead of failing, so the pure-logic unit
/// suites still run everywhere.
macro_rules! require_db {
    () => {
        match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("skipping: DATABASE_URL not set");
                return;
            }
        }
    };
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(database_url: &str) -> String {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_email: None,
        admin_password: None,
    };

    let state = AppState::new(pool, config);
    let app = routes::create_router(state);

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

/// Registers a fresh user and logs them in; returns (token, user_id).
async fn register_and_login(client: &reqwest::Client, address: &str) -> (String, String) {
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];
    let username = format!("u{}", suffix);
    let email = format!("{}@example.com", username);

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(response.status().as_u16(), 201);

    let login = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to login")
        .json::<serde_json::Value>()
        .await
        .unwrap();

    let token = login["token"].as_str().unwrap().to_string();
    let user_id = login["user"]["id"].as_str().unwrap().to_string();
    (token, user_id)
}

fn quiz_payload(title: &str, is_public: bool) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Two easy questions",
        "timeLimit": 5,
        "category": "General",
        "isPublic": is_public,
        "questions": [
            {
                "text": "Pick B",
                "options": ["A", "B"],
                "correctAnswer": 1,
                "points": 1
            },
            {
                "text": "Pick A",
                "options": ["A", "B"],
                "correctAnswer": 0,
                "points": 1
            }
        ]
    })
}

async fn create_quiz(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    payload: &serde_json::Value,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(token)
        .json(payload)
        .send()
        .await
        .expect("Failed to create quiz");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn submit_answers(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    quiz_id: &str,
    selected: &[i64],
) -> reqwest::Response {
    let answers: Vec<_> = selected
        .iter()
        .enumerate()
        .map(|(i, s)| serde_json::json!({ "questionIndex": i, "selectedOption": s }))
        .collect();
    client
        .post(format!("{}/api/attempts/{}", address, quiz_id))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "answers": answers,
            "timeSpent": 42,
            "forcedSubmit": false
        }))
        .send()
        .await
        .expect("Failed to submit attempt")
}

#[tokio::test]
async fn health_check_works() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    // Username too short and not an email
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "username": "yo",
            "email": "not-an-email",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/quizzes", address))
        .json(&quiz_payload("No auth", true))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Even middleware rejections carry the standard error body.
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let response = client
        .get(format!("{}/api/auth/profile", address))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn quiz_crud_and_privacy_flow() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, owner_id) = register_and_login(&client, &address).await;
    let (other_token, _) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Private quiz", false)).await;
    let quiz_id = quiz["id"].as_str().unwrap();
    assert_eq!(quiz["createdBy"]["id"].as_str().unwrap(), owner_id);

    // Owner sees the correct answers.
    let own_view = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(own_view.status().as_u16(), 200);
    let own_view: serde_json::Value = own_view.json().await.unwrap();
    assert_eq!(own_view["questions"][0]["correctAnswer"], 1);

    // A private quiz is invisible to everyone else.
    let other_view = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(other_view.status().as_u16(), 403);

    // Non-owners cannot update...
    let update = client
        .put(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&other_token)
        .json(&quiz_payload("Hijacked", true))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status().as_u16(), 403);

    // ...but the owner can.
    let update = client
        .put(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&owner_token)
        .json(&quiz_payload("Now public", true))
        .send()
        .await
        .unwrap();
    assert_eq!(update.status().as_u16(), 200);
    let updated: serde_json::Value = update.json().await.unwrap();
    assert_eq!(updated["title"], "Now public");
    assert_eq!(updated["isPublic"], true);

    // Once public, other users see it with answers withheld.
    let other_view: serde_json::Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(other_view["questions"][0].get("correctAnswer").is_none());
    assert_eq!(other_view["questions"][0]["options"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_ids_yield_400_not_500() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &address).await;

    for path in ["/api/quizzes/not-hex", "/api/attempts/user/short"] {
        let response = client
            .get(format!("{}{}", address, path))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "path {}", path);
    }
}

#[tokio::test]
async fn quiz_validation_rejects_out_of_bounds_answer_index() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &address).await;

    let mut payload = quiz_payload("Broken", true);
    payload["questions"][0]["correctAnswer"] = serde_json::json!(5);

    let response = client
        .post(format!("{}/api/quizzes", address))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn attempt_submission_is_scored_server_side() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let (taker_token, taker_id) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Scored", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    // Correct answers are [1, 0] with one point each.
    let cases: &[(&[i64], i64)] = &[(&[1, 0], 2), (&[1, 1], 1), (&[-1, -1], 0)];
    for (selected, expected_score) in cases {
        let response = submit_answers(&client, &address, &taker_token, quiz_id, selected).await;
        assert_eq!(response.status().as_u16(), 201);
        let attempt: serde_json::Value = response.json().await.unwrap();
        assert_eq!(attempt["score"].as_i64().unwrap(), *expected_score);
        assert_eq!(attempt["totalPoints"].as_i64().unwrap(), 2);
        assert_eq!(attempt["quizTitle"], "Scored");
        assert_eq!(attempt["userId"].as_str().unwrap(), taker_id);
    }

    // The sentinel submission graded every answer incorrect.
    let response = submit_answers(&client, &address, &taker_token, quiz_id, &[-1, -1]).await;
    let attempt: serde_json::Value = response.json().await.unwrap();
    for answer in attempt["answers"].as_array().unwrap() {
        assert_eq!(answer["isCorrect"], false);
        assert_eq!(answer["points"], 0);
    }
}

#[tokio::test]
async fn owner_cannot_attempt_their_own_quiz() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Own quiz", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let response = submit_answers(&client, &address, &owner_token, quiz_id, &[1, 0]).await;
    assert_eq!(response.status().as_u16(), 403);

    // No attempt row was created.
    let list: serde_json::Value = client
        .get(format!("{}/api/attempts/quiz/{}", address, quiz_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["totalAttempts"].as_i64().unwrap(), 0);
    assert_eq!(list["totalPages"].as_i64().unwrap(), 0);
}

#[tokio::test]
async fn attempt_visibility_rules() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let (taker_token, _) = register_and_login(&client, &address).await;
    let (stranger_token, _) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Visible", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let attempt: serde_json::Value = submit_answers(&client, &address, &taker_token, quiz_id, &[1, 0])
        .await
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap();

    // Attempt owner and quiz owner can read it; a third party cannot.
    for (token, expected) in [
        (&taker_token, 200),
        (&owner_token, 200),
        (&stranger_token, 403),
    ] {
        let response = client
            .get(format!("{}/api/attempts/{}", address, attempt_id))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }

    // Only the quiz owner may list all attempts on the quiz.
    let response = client
        .get(format!("{}/api/attempts/quiz/{}", address, quiz_id))
        .bearer_auth(&taker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn pagination_limits_and_counts() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let (taker_token, _) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Paged", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    for _ in 0..5 {
        let response = submit_answers(&client, &address, &taker_token, quiz_id, &[1, 0]).await;
        assert_eq!(response.status().as_u16(), 201);
    }

    let page: serde_json::Value = client
        .get(format!("{}/api/attempts/user/{}?page=2&limit=2", address, quiz_id))
        .bearer_auth(&taker_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(page["attempts"].as_array().unwrap().len(), 2);
    assert_eq!(page["currentPage"].as_i64().unwrap(), 2);
    assert_eq!(page["totalAttempts"].as_i64().unwrap(), 5);
    // ceil(5 / 2)
    assert_eq!(page["totalPages"].as_i64().unwrap(), 3);
}

#[tokio::test]
async fn quiz_stats_aggregate_attempts() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let (taker_token, _) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Stats", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    // One full-score and one zero-score attempt.
    submit_answers(&client, &address, &taker_token, quiz_id, &[1, 0]).await;
    submit_answers(&client, &address, &taker_token, quiz_id, &[-1, -1]).await;

    let stats: serde_json::Value = client
        .get(format!("{}/api/attempts/quiz/{}/stats", address, quiz_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["totalAttempts"].as_i64().unwrap(), 2);
    assert!((stats["averageScorePercent"].as_f64().unwrap() - 50.0).abs() < 1e-9);
    assert_eq!(stats["forcedSubmissions"].as_i64().unwrap(), 0);

    // Takers cannot see the owner's analytics.
    let response = client
        .get(format!("{}/api/attempts/quiz/{}/stats", address, quiz_id))
        .bearer_auth(&taker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn deleting_a_quiz_cascades_to_its_attempts() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    let (taker_token, _) = register_and_login(&client, &address).await;

    let quiz = create_quiz(&client, &address, &owner_token, &quiz_payload("Doomed", true)).await;
    let quiz_id = quiz["id"].as_str().unwrap();

    let attempt: serde_json::Value = submit_answers(&client, &address, &taker_token, quiz_id, &[1, 0])
        .await
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap();

    // A non-owner cannot delete the quiz.
    let response = client
        .delete(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&taker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .delete(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Quiz and attempt are both gone.
    let response = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .get(format!("{}/api/attempts/{}", address, attempt_id))
        .bearer_auth(&taker_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn public_quiz_listing_is_paginated_and_redacted() {
    let database_url = require_db!();
    let address = spawn_app(&database_url).await;
    let client = reqwest::Client::new();

    let (owner_token, _) = register_and_login(&client, &address).await;
    for i in 0..3 {
        create_quiz(&client, &address, &owner_token, &quiz_payload(&format!("Listed {i}"), true)).await;
    }
    create_quiz(&client, &address, &owner_token, &quiz_payload("Hidden", false)).await;

    // The public listing needs no session at all.
    let listing: serde_json::Value = client
        .get(format!("{}/api/quizzes?page=1&limit=2", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let quizzes = listing["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 2);
    assert!(listing["totalQuizzes"].as_i64().unwrap() >= 3);
    for quiz in quizzes {
        assert_eq!(quiz["isPublic"], true);
        for question in quiz["questions"].as_array().unwrap() {
            assert!(question.get("correctAnswer").is_none());
        }
    }

    // The owner's listing keeps answers and includes the private quiz.
    let mine: serde_json::Value = client
        .get(format!("{}/api/quizzes/user?limit=100", address))
        .bearer_auth(&owner_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine["totalQuizzes"].as_i64().unwrap(), 4);
    assert_eq!(mine["quizzes"][0]["questions"][0]["correctAnswer"], 1);
}
