use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

use chirpy::auth::{CredentialHasher, SessionPolicy, SessionService, SigningSecret};
use chirpy::chirps::ChirpService;
use chirpy::configuration::Platform;
use chirpy::metrics::HitCounter;
use chirpy::startup::{run, AppState};
use chirpy::storage::InMemoryStore;

const PASSWORD: &str = "ValidPassword123";

struct TestApp {
    address: String,
    client: reqwest::Client,
}

fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let store = Arc::new(InMemoryStore::new());
    let sessions = SessionService::new(
        store.clone(),
        store.clone(),
        SigningSecret::new("chirps-test-secret").unwrap(),
        CredentialHasher::new(4),
        SessionPolicy::default(),
    );
    let state = AppState {
        sessions: Arc::new(sessions),
        chirps: Arc::new(ChirpService::new(store)),
        hits: Arc::new(HitCounter::new()),
        platform: Platform::Dev,
    };

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    /// Register `email` and return its access token.
    async fn access_token_for(&self, email: &str) -> String {
        let credentials = json!({ "email": email, "password": PASSWORD });
        let created = self
            .client
            .post(&format!("{}/api/users", self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(201, created.status().as_u16());

        let login: Value = self
            .client
            .post(&format!("{}/api/login", self.address))
            .json(&credentials)
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Failed to parse response");
        login["access_token"].as_str().unwrap().to_string()
    }

    async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/chirps", self.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn delete_chirp(&self, token: &str, id: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}/api/chirps/{}", self.address, id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

#[tokio::test]
async fn create_chirp_returns_201_with_author() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;

    let response = app.post_chirp(&token, "I'm the one who knocks").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["body"], "I'm the one who knocks");
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert!(Uuid::parse_str(body["user_id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn create_chirp_enforces_length_limit() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;

    let at_limit = app.post_chirp(&token, &"a".repeat(140)).await;
    assert_eq!(201, at_limit.status().as_u16());

    let over_limit = app.post_chirp(&token, &"a".repeat(141)).await;
    assert_eq!(400, over_limit.status().as_u16());
}

#[tokio::test]
async fn create_chirp_masks_profane_words() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;

    let response = app
        .post_chirp(&token, "This is a kerfuffle opinion I need to share with the Fornax")
        .await;
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["body"], "This is a **** opinion I need to share with the ****");
}

#[tokio::test]
async fn create_chirp_requires_access_token() {
    let app = spawn_app();

    let missing = app
        .client
        .post(&format!("{}/api/chirps", app.address))
        .json(&json!({ "body": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing.status().as_u16());

    let invalid = app.post_chirp("not.a.token", "hello").await;
    assert_eq!(401, invalid.status().as_u16());
}

#[tokio::test]
async fn chirps_can_be_listed_and_fetched() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;

    let first: Value = app.post_chirp(&token, "first").await.json().await.unwrap();
    let second: Value = app.post_chirp(&token, "second").await.json().await.unwrap();

    let listed: Value = app.get("/api/chirps").await.json().await.unwrap();
    let bodies: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);

    let fetched = app
        .get(&format!("/api/chirps/{}", second["id"].as_str().unwrap()))
        .await;
    assert_eq!(200, fetched.status().as_u16());
    let fetched: Value = fetched.json().await.unwrap();
    assert_eq!(fetched["id"], second["id"]);
    assert_ne!(fetched["id"], first["id"]);
}

#[tokio::test]
async fn get_unknown_chirp_returns_404() {
    let app = spawn_app();

    let unknown = app.get(&format!("/api/chirps/{}", Uuid::new_v4())).await;
    assert_eq!(404, unknown.status().as_u16());

    let malformed = app.get("/api/chirps/not-a-uuid").await;
    assert_eq!(404, malformed.status().as_u16());
}

#[tokio::test]
async fn only_the_author_can_delete_a_chirp() {
    let app = spawn_app();
    let walt = app.access_token_for("walt@example.com").await;
    let jesse = app.access_token_for("jesse@example.com").await;

    let chirp: Value = app.post_chirp(&walt, "say my name").await.json().await.unwrap();
    let id = chirp["id"].as_str().unwrap();

    let forbidden = app.delete_chirp(&jesse, id).await;
    assert_eq!(403, forbidden.status().as_u16());
    assert_eq!(200, app.get(&format!("/api/chirps/{}", id)).await.status().as_u16());

    let deleted = app.delete_chirp(&walt, id).await;
    assert_eq!(204, deleted.status().as_u16());
    assert_eq!(404, app.get(&format!("/api/chirps/{}", id)).await.status().as_u16());
}

#[tokio::test]
async fn delete_unknown_chirp_returns_404() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;

    let response = app.delete_chirp(&token, &Uuid::new_v4().to_string()).await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn reset_removes_chirps_with_their_authors() {
    let app = spawn_app();
    let token = app.access_token_for("walt@example.com").await;
    app.post_chirp(&token, "soon gone").await;

    let reset = app
        .client
        .post(&format!("{}/admin/reset", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(200, reset.status().as_u16());

    let listed: Value = app.get("/api/chirps").await.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());

    // The access token is still well-signed, but its author is gone
    let orphan = app.post_chirp(&token, "still here?").await;
    assert_eq!(401, orphan.status().as_u16());
}
