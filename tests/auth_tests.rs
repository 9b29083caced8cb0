// tests/auth_tests.rs

use backend::{config::Config, routes, state::AppState, store::Store};
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        port: 0,
        allowed_origin: "http://localhost:5173".to_string(),
        app_env: "development".to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        store: Store::new(pool),
        config,
    };

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

/// Client with a cookie jar, so the session cookie round-trips like a browser.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

fn unique_email() -> String {
    format!("u_{}@test.io", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn register_sets_cookie_and_me_works() {
    let address = spawn_app().await;
    let client = client();
    let email = unique_email();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": email,
            "password": "secret12"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.as_str());
    assert!(body["user"].get("password").is_none());

    // The cookie jar now holds the session token.
    let me = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();

    assert_eq!(me.status().as_u16(), 200);
    let me_body: serde_json::Value = me.json().await.unwrap();
    assert_eq!(me_body["user"]["email"], email.as_str());
    assert_eq!(me_body["user"]["favorites"], serde_json::json!([]));
    assert_eq!(me_body["user"]["adoptionRequests"], serde_json::json!([]));
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let address = spawn_app().await;
    let client = client();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "name": "NoEmail", "password": "secret12" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Please provide all required fields");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let address = spawn_app().await;
    let email = unique_email();

    for (i, name) in ["Ada", "A2"].iter().enumerate() {
        let response = client()
            .post(format!("{}/api/auth/register", address))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": "secret12"
            }))
            .send()
            .await
            .unwrap();

        if i == 0 {
            assert_eq!(response.status().as_u16(), 201);
        } else {
            assert_eq!(response.status().as_u16(), 400);
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "User already exists");
        }
    }
}

#[tokio::test]
async fn email_is_normalized_on_register_and_login() {
    let address = spawn_app().await;
    let slug = &uuid::Uuid::new_v4().to_string()[..8];
    let messy = format!("  U_{}@Example.COM  ", slug);
    let normalized = format!("u_{}@example.com", slug);

    let response = client()
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Alice",
            "email": messy,
            "password": "secret12"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], normalized.as_str());

    let login = client()
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "email": normalized,
            "password": "secret12"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(login.status().as_u16(), 200);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let address = spawn_app().await;
    let email = unique_email();

    client()
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": email,
            "password": "secret12"
        }))
        .send()
        .await
        .unwrap();

    // Wrong password and unknown email must be indistinguishable.
    for payload in [
        serde_json::json!({ "email": email, "password": "wrong_password" }),
        serde_json::json!({ "email": unique_email(), "password": "secret12" }),
    ] {
        let response = client()
            .post(format!("{}/api/auth/login", address))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn login_rejects_non_string_types() {
    let address = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": "a@b.io", "password": 12345 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid input types");
}

#[tokio::test]
async fn login_rejects_blank_credentials() {
    let address = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": "   ", "password": "  " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email and password cannot be empty");
}

#[tokio::test]
async fn protected_route_without_cookie_is_401() {
    let address = spawn_app().await;

    let response = reqwest::Client::new()
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let address = spawn_app().await;
    let client = client();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": unique_email(),
            "password": "secret12"
        }))
        .send()
        .await
        .unwrap();

    let logout = client
        .post(format!("{}/api/auth/logout", address))
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status().as_u16(), 200);

    // The clearing Set-Cookie wiped the jar; /me is unauthenticated again.
    let me = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 401);
}

#[tokio::test]
async fn reset_password_replaces_the_credential() {
    let address = spawn_app().await;
    let email = unique_email();

    client()
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Ada",
            "email": email,
            "password": "secret12"
        }))
        .send()
        .await
        .unwrap();

    let reset = client()
        .post(format!("{}/api/auth/reset-password", address))
        .json(&serde_json::json!({ "email": email, "newPassword": "changed99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status().as_u16(), 200);

    // Old password no longer works; the new one does.
    let old = client()
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "secret12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status().as_u16(), 400);

    let new = client()
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "changed99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(new.status().as_u16(), 200);
}

#[tokio::test]
async fn reset_password_unknown_email_is_404() {
    let address = spawn_app().await;

    let response = client()
        .post(format!("{}/api/auth/reset-password", address))
        .json(&serde_json::json!({ "email": unique_email(), "newPassword": "changed99" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User not found");
}
