use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use uuid::Uuid;

use chirpy::auth::{decode_claims, CredentialHasher, SessionPolicy, SessionService, SigningSecret};
use chirpy::chirps::ChirpService;
use chirpy::configuration::Platform;
use chirpy::metrics::HitCounter;
use chirpy::startup::{run, AppState};
use chirpy::storage::InMemoryStore;

const EMAIL: &str = "walt@breakingbad.com";
const PASSWORD: &str = "Heisenberg123";

pub struct TestApp {
    pub address: String,
    pub secret: SigningSecret,
    pub client: reqwest::Client,
}

fn spawn_app_with(policy: SessionPolicy) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let secret = SigningSecret::new("integration-test-secret").unwrap();
    let store = Arc::new(InMemoryStore::new());
    let sessions = SessionService::new(
        store.clone(),
        store.clone(),
        secret.clone(),
        CredentialHasher::new(4),
        policy,
    );
    let state = AppState {
        sessions: Arc::new(sessions),
        chirps: Arc::new(ChirpService::new(store)),
        hits: Arc::new(HitCounter::new()),
        platform: Platform::Production,
    };

    let server = run(listener, state).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        secret,
        client: reqwest::Client::new(),
    }
}

fn spawn_app() -> TestApp {
    spawn_app_with(SessionPolicy::default())
}

impl TestApp {
    async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", &self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_with_bearer(&self, path: &str, header: Option<&str>) -> reqwest::Response {
        let mut request = self.client.post(&format!("{}{}", &self.address, path));
        if let Some(header) = header {
            request = request.header("Authorization", header);
        }
        request.send().await.expect("Failed to execute request.")
    }

    async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.post_with_bearer("/api/refresh", Some(&format!("Bearer {}", refresh_token)))
            .await
    }

    async fn revoke(&self, refresh_token: &str) -> reqwest::Response {
        self.post_with_bearer("/api/revoke", Some(&format!("Bearer {}", refresh_token)))
            .await
    }

    /// Register the default user and log in, returning the login body.
    async fn logged_in(&self) -> Value {
        assert_eq!(201, self.create_user(EMAIL, PASSWORD).await.status().as_u16());
        let response = self
            .login(json!({ "email": EMAIL, "password": PASSWORD }))
            .await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }
}

// --- Registration ---

#[tokio::test]
async fn create_user_returns_201_with_profile() {
    let app = spawn_app();

    let response = app.create_user(EMAIL, PASSWORD).await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], EMAIL);
    assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn create_user_returns_400_for_weak_password() {
    let app = spawn_app();
    let long_password = "a".repeat(129);

    for (password, reason) in [
        ("short", "too short"),
        ("nouppercase123", "no uppercase"),
        ("NOLOWERCASE123", "no lowercase"),
        ("NoDigitsHere", "no digits"),
        (long_password.as_str(), "too long"),
    ] {
        let response = app.create_user(EMAIL, password).await;
        assert_eq!(400, response.status().as_u16(), "Should reject password: {}", reason);
    }
}

#[tokio::test]
async fn create_user_returns_400_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.create_user(EMAIL, PASSWORD).await.status().as_u16());
    assert_eq!(400, app.create_user(EMAIL, PASSWORD).await.status().as_u16());
}

#[tokio::test]
async fn create_user_returns_400_for_malformed_body() {
    let app = spawn_app();

    for body in [json!({}), json!({ "email": EMAIL }), json!({ "password": PASSWORD })] {
        let response = app
            .client
            .post(&format!("{}/api/users", &app.address))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(400, response.status().as_u16(), "body: {}", body);
    }
}

// --- Login ---

#[tokio::test]
async fn login_returns_profile_and_token_pair() {
    let app = spawn_app();
    let body = app.logged_in().await;

    assert_eq!(body["email"], EMAIL);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let access_token = body["access_token"].as_str().unwrap();
    let claims = decode_claims(access_token, &app.secret).expect("access token should validate");
    assert_eq!(claims.sub, body["id"].as_str().unwrap());
    assert!(claims.lifetime_seconds() <= 3600);

    let refresh_token = body["refresh_token"].as_str().unwrap();
    assert_eq!(refresh_token.len(), 64);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.create_user(EMAIL, PASSWORD).await;

    let wrong_password = app
        .login(json!({ "email": EMAIL, "password": "WrongPassword1" }))
        .await;
    let unknown_email = app
        .login(json!({ "email": "jesse@breakingbad.com", "password": PASSWORD }))
        .await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn login_clamps_requested_lifetime_to_ceiling() {
    let app = spawn_app();
    app.create_user(EMAIL, PASSWORD).await;

    for requested in [999_999, 0] {
        let response = app
            .login(json!({ "email": EMAIL, "password": PASSWORD, "expires_in_seconds": requested }))
            .await;
        let body: Value = response.json().await.unwrap();

        let claims = decode_claims(body["access_token"].as_str().unwrap(), &app.secret).unwrap();
        assert_eq!(claims.lifetime_seconds(), 3600, "requested {}", requested);
        assert_eq!(body["expires_in"], 3600);
    }
}

#[tokio::test]
async fn login_honours_shorter_lifetime() {
    let app = spawn_app();
    app.create_user(EMAIL, PASSWORD).await;

    let response = app
        .login(json!({ "email": EMAIL, "password": PASSWORD, "expires_in": 120 }))
        .await;
    let body: Value = response.json().await.unwrap();

    let claims = decode_claims(body["access_token"].as_str().unwrap(), &app.secret).unwrap();
    assert_eq!(claims.lifetime_seconds(), 120);
}

// --- Refresh / revoke ---

#[tokio::test]
async fn refresh_returns_new_access_token() {
    let app = spawn_app();
    let login = app.logged_in().await;
    let original = decode_claims(login["access_token"].as_str().unwrap(), &app.secret).unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = app.refresh(login["refresh_token"].as_str().unwrap()).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert!(body.get("refresh_token").is_none());

    let refreshed = decode_claims(body["access_token"].as_str().unwrap(), &app.secret).unwrap();
    assert_eq!(refreshed.sub, original.sub);
    assert!(refreshed.iat > original.iat);
    assert_eq!(refreshed.lifetime_seconds(), 3600);
}

#[tokio::test]
async fn refresh_returns_400_for_missing_or_malformed_header() {
    let app = spawn_app();

    for header in [None, Some("bearer abc123"), Some("Bearer   "), Some("Basic dXNlcjpwYXNz")] {
        let response = app.post_with_bearer("/api/refresh", header).await;
        assert_eq!(400, response.status().as_u16(), "header: {:?}", header);
    }
}

#[tokio::test]
async fn refresh_returns_401_for_unknown_token() {
    let app = spawn_app();
    let response = app.refresh("not-a-real-refresh-token").await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn access_token_is_not_a_refresh_token() {
    let app = spawn_app();
    let login = app.logged_in().await;

    let response = app.refresh(login["access_token"].as_str().unwrap()).await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn revoked_token_cannot_refresh() {
    let app = spawn_app();
    let login = app.logged_in().await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    assert_eq!(204, app.revoke(refresh_token).await.status().as_u16());
    assert_eq!(204, app.revoke(refresh_token).await.status().as_u16());

    let response = app.refresh(refresh_token).await;
    assert_eq!(401, response.status().as_u16());

    let unknown = app.refresh("not-a-real-refresh-token").await;
    let revoked: Value = response.json().await.unwrap();
    let unknown: Value = unknown.json().await.unwrap();
    assert_eq!(revoked["message"], unknown["message"]);
}

#[tokio::test]
async fn revoke_returns_400_without_header() {
    let app = spawn_app();
    let response = app.post_with_bearer("/api/revoke", None).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn full_session_lifecycle() {
    let app = spawn_app();
    let login = app.logged_in().await;
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let refreshed = app.refresh(refresh_token).await;
    assert_eq!(200, refreshed.status().as_u16());
    let refreshed: Value = refreshed.json().await.unwrap();
    let claims = decode_claims(refreshed["access_token"].as_str().unwrap(), &app.secret).unwrap();
    assert_eq!(claims.sub, login["id"].as_str().unwrap());

    assert_eq!(204, app.revoke(refresh_token).await.status().as_u16());
    assert_eq!(401, app.refresh(refresh_token).await.status().as_u16());
}

#[tokio::test]
async fn rotation_replaces_refresh_token_when_enabled() {
    let app = spawn_app_with(SessionPolicy {
        rotate_refresh_tokens: true,
    });
    let login = app.logged_in().await;
    let original = login["refresh_token"].as_str().unwrap();

    let response = app.refresh(original).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    let rotated = body["refresh_token"].as_str().expect("rotated token returned");

    assert_ne!(rotated, original);
    assert_eq!(401, app.refresh(original).await.status().as_u16());
    assert_eq!(200, app.refresh(rotated).await.status().as_u16());
}

// --- Credential change ---

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = spawn_app();
    let login = app.logged_in().await;
    let access_token = login["access_token"].as_str().unwrap();

    let response = app
        .client
        .put(&format!("{}/api/users", &app.address))
        .header("Authorization", format!("Bearer {}", access_token))
        .json(&json!({ "email": "heisenberg@breakingbad.com", "password": "BlueSky9999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "heisenberg@breakingbad.com");
    assert_eq!(body["id"], login["id"]);

    let old = app.login(json!({ "email": EMAIL, "password": PASSWORD })).await;
    assert_eq!(401, old.status().as_u16());
    let new = app
        .login(json!({ "email": "heisenberg@breakingbad.com", "password": "BlueSky9999" }))
        .await;
    assert_eq!(200, new.status().as_u16());
}

#[tokio::test]
async fn update_user_requires_valid_access_token() {
    let app = spawn_app();
    let login = app.logged_in().await;
    let body = json!({ "email": "x@breakingbad.com", "password": "BlueSky9999" });

    let missing = app
        .client
        .put(&format!("{}/api/users", &app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(400, missing.status().as_u16());

    for token in [login["refresh_token"].as_str().unwrap(), "invalid.token.here"] {
        let response = app
            .client
            .put(&format!("{}/api/users", &app.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(401, response.status().as_u16());
    }
}
