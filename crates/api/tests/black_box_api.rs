use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

use shopdesk_api::app::{build_app, AppServices};
use shopdesk_api::cookies::CookiePolicy;
use shopdesk_auth::{hash_password, Identity, Role, TokenCodec, TokenLifetimes};
use shopdesk_core::UserId;
use shopdesk_infra::store::NewUser;
use shopdesk_infra::{InMemoryStore, UserStore};

const SECRET: &str = "black-box-secret";
const PASSWORD: &str = "correct horse battery";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over a seeded in-memory store, on an ephemeral port.
    async fn spawn() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let hash = hash_password(PASSWORD).unwrap();
        for (name, role) in [("admin", Role::Admin), ("editor", Role::Editor), ("viewer", Role::Viewer)] {
            store
                .create_user(NewUser {
                    username: name.to_string(),
                    email: format!("{name}@shop.test"),
                    password_hash: hash.clone(),
                    role,
                })
                .await
                .unwrap();
        }

        let services = Arc::new(AppServices::from_store(
            store.clone(),
            TokenCodec::new(SECRET).unwrap(),
            TokenLifetimes::default(),
            CookiePolicy::default(),
        ));
        let app = build_app(services, &[]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Cookies a browser would hold for this client.
#[derive(Debug, Clone, Default)]
struct Jar(HashMap<String, String>);

impl Jar {
    fn with(pairs: &[(&str, &str)]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    fn absorb(&mut self, res: &reqwest::Response) {
        self.0.extend(set_cookies(res));
    }

    fn header(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// `name -> value` for every `Set-Cookie` on the response.
fn set_cookies(res: &reqwest::Response) -> HashMap<String, String> {
    raw_set_cookies(res)
        .iter()
        .filter_map(|raw| {
            let pair = raw.split(';').next()?;
            let (name, value) = pair.split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

fn raw_set_cookies(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn login_as(client: &reqwest::Client, srv: &TestServer, who: &str) -> (Jar, Value) {
    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": format!("{who}@shop.test"), "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "login as {who}");

    let mut jar = Jar::default();
    jar.absorb(&res);
    let body: Value = res.json().await.unwrap();
    (jar, body)
}

async fn error_of(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

fn mint(identity: Identity, ttl: Duration, issued_at: chrono::DateTime<Utc>) -> String {
    TokenCodec::new(SECRET)
        .unwrap()
        .issue(identity, ttl, issued_at)
        .unwrap()
        .token
}

// ─────────────────────────────────────────────────────────────────────────────
// System
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_and_health_are_public() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "API is running");

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Login / logout
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_sets_both_cookies_and_returns_the_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "admin@shop.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let raw = raw_set_cookies(&res);
    let access = raw.iter().find(|c| c.starts_with("accessToken=")).unwrap();
    let refresh = raw.iter().find(|c| c.starts_with("refreshToken=")).unwrap();
    assert!(access.contains("Max-Age=900"));
    assert!(refresh.contains("Max-Age=604800"));
    for cookie in [access, refresh] {
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }

    let jar = set_cookies(&res);
    assert_ne!(jar["accessToken"], jar["refreshToken"]);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["email"], "admin@shop.test");
    assert!(body["user"]["id"].is_i64());
    assert!(body["user"].get("created_at").is_none());
}

#[tokio::test]
async fn login_failures_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        (json!({ "email": "admin@shop.test" }), "Email and password are required"),
        (json!({ "email": "nobody@shop.test", "password": "x" }), "User not found"),
        (json!({ "email": "admin@shop.test", "password": "wrong" }), "Invalid password"),
    ];

    for (body, expected) in cases {
        let res = client
            .post(srv.url("/api/auth/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
        assert!(raw_set_cookies(&res).is_empty());
        assert_eq!(error_of(res).await, expected);
    }
}

#[tokio::test]
async fn unreadable_login_bodies_answer_in_json() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No body and no content type reads as no credentials.
    let res = client.post(srv.url("/api/auth/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Email and password are required");

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": 5, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_body");
    assert!(body["error"].is_string());

    let res = client
        .post(srv.url("/api/auth/login"))
        .header(CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_body");
}

#[tokio::test]
async fn account_with_bcrypt_hash_logs_in() {
    let srv = TestServer::spawn().await;
    srv.store
        .create_user(NewUser {
            username: "veteran".into(),
            email: "veteran@shop.test".into(),
            // bcrypt, cost 4, of PASSWORD
            password_hash: "$2b$04$N9qo8uLOickgx2ZMRZoMye9COBKsOPKEJDHJoe/BuRouJin6Qswhq".into(),
            role: Role::Editor,
        })
        .await
        .unwrap();

    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "veteran@shop.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(set_cookies(&res).len(), 2);
}

#[tokio::test]
async fn account_without_password_cannot_log_in() {
    let srv = TestServer::spawn().await;
    srv.store
        .insert_user_without_password("legacy", "legacy@shop.test", Role::Viewer)
        .unwrap();

    let res = reqwest::Client::new()
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "legacy@shop.test", "password": "anything" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_of(res).await, "User has no password set. Contact admin.");
}

#[tokio::test]
async fn logout_clears_cookies_and_locks_out_protected_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (mut jar, _) = login_as(&client, &srv, "admin").await;

    let res = client
        .get(srv.url("/api/customers"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/auth/logout"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    for raw in raw_set_cookies(&res) {
        assert!(raw.contains("Max-Age=0"), "{raw}");
    }
    jar.absorb(&res);
    assert_eq!(jar.get("accessToken"), Some(""));
    assert_eq!(jar.get("refreshToken"), Some(""));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");

    let res = client
        .get(srv.url("/api/customers"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(res).await, "Access token missing. Please log in.");

    // Idempotent.
    let res = client.post(srv.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication middleware
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn protected_routes_reject_missing_expired_and_forged_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/api/orders")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(res).await, "Access token missing. Please log in.");

    let identity = Identity {
        id: UserId::new(1),
        role: Role::Admin,
    };
    let expired = mint(identity, Duration::minutes(15), Utc::now() - Duration::minutes(20));
    let res = client
        .get(srv.url("/api/orders"))
        .header(COOKIE, format!("accessToken={expired}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(res).await, "Access token expired");

    let forged = TokenCodec::new("some-other-secret")
        .unwrap()
        .issue(identity, Duration::minutes(15), Utc::now())
        .unwrap()
        .token;
    let res = client
        .get(srv.url("/api/orders"))
        .header(COOKIE, format!("accessToken={forged}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(res).await, "Invalid token");
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile and refresh
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_returns_the_callers_row() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (jar, _) = login_as(&client, &srv, "editor").await;

    let res = client
        .get(srv.url("/api/auth/profile"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(raw_set_cookies(&res).is_empty());

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "editor");
    assert_eq!(body["role"], "editor");
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn profile_recovers_from_access_token_expired_a_second_ago() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (_, login) = login_as(&client, &srv, "admin").await;
    let identity = Identity {
        id: UserId::new(login["user"]["id"].as_i64().unwrap()),
        role: Role::Admin,
    };

    let now = Utc::now();
    let access = mint(identity, Duration::minutes(15), now - Duration::minutes(15) - Duration::seconds(1));
    let refresh = mint(identity, Duration::days(7), now);
    let mut jar = Jar::with(&[("accessToken", access.as_str()), ("refreshToken", refresh.as_str())]);

    let res = client
        .get(srv.url("/api/auth/profile"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let renewed = set_cookies(&res);
    assert!(renewed.contains_key("accessToken"));
    assert!(!renewed.contains_key("refreshToken"));
    assert_ne!(renewed["accessToken"], access);
    jar.absorb(&res);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], "admin@shop.test");

    // The renewed access token works on protected routes.
    let res = client
        .get(srv.url("/api/users"))
        .header(COOKIE, jar.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_with_both_tokens_expired_requires_login() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let identity = Identity {
        id: UserId::new(1),
        role: Role::Admin,
    };
    let long_ago = Utc::now() - Duration::days(8);
    let access = mint(identity, Duration::minutes(15), long_ago);

    // An expired refresh cookie has already been dropped by the client.
    let res = client
        .get(srv.url("/api/auth/profile"))
        .header(COOKIE, format!("accessToken={access}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(raw_set_cookies(&res).is_empty());
    assert_eq!(error_of(res).await, "Session expired, please log in again");

    // Presented anyway, it is rejected without minting anything.
    let refresh = mint(identity, Duration::days(7), long_ago);
    let res = client
        .get(srv.url("/api/auth/profile"))
        .header(COOKIE, format!("accessToken={access}; refreshToken={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(raw_set_cookies(&res).is_empty());
    assert_eq!(error_of(res).await, "Invalid or expired refresh token");
}

#[tokio::test]
async fn profile_with_tampered_access_token_does_not_refresh() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (jar, _) = login_as(&client, &srv, "admin").await;

    let access = jar.get("accessToken").unwrap();
    let (signed, signature) = access.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{signed}.{flipped}{}", &signature[1..]);
    let refresh = jar.get("refreshToken").unwrap();

    let res = client
        .get(srv.url("/api/auth/profile"))
        .header(COOKIE, format!("accessToken={tampered}; refreshToken={refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(raw_set_cookies(&res).is_empty());
    assert_eq!(error_of(res).await, "Invalid token");
}

#[tokio::test]
async fn profile_without_any_cookie_is_unauthorized() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(srv.url("/api/auth/profile"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_endpoint_reissues_access_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.post(srv.url("/api/auth/refresh")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/api/auth/refresh"))
        .header(COOKIE, "refreshToken=not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(res).await, "Invalid or expired refresh token");

    let (jar, _) = login_as(&client, &srv, "viewer").await;
    let res = client
        .post(srv.url("/api/auth/refresh"))
        .header(COOKIE, format!("refreshToken={}", jar.get("refreshToken").unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let renewed = set_cookies(&res);
    assert!(renewed.contains_key("accessToken"));
    assert!(!renewed.contains_key("refreshToken"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Token refreshed");
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn registration_creates_a_viewer_once() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let body = json!({ "username": "newbie", "email": "newbie@shop.test", "password": "pw-123" });

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["message"], "User registered successfully");
    assert_eq!(created["user"]["role"], "viewer");

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Email already registered");

    let res = client
        .post(srv.url("/api/auth/register"))
        .json(&json!({ "username": "x", "email": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "All fields are required");

    // The new account can log in.
    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({ "email": "newbie@shop.test", "password": "pw-123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ─────────────────────────────────────────────────────────────────────────────
// Role gating and resources
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn viewer_cannot_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (viewer, _) = login_as(&client, &srv, "viewer").await;

    for path in ["/api/customers/1", "/api/orders/1", "/api/products/1", "/api/users/1"] {
        let res = client
            .delete(srv.url(path))
            .header(COOKIE, viewer.header())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{path}");
        assert_eq!(error_of(res).await, "Access denied. Insufficient privileges.");
    }
}

#[tokio::test]
async fn malformed_resource_bodies_are_json_errors_after_the_role_check() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (viewer, _) = login_as(&client, &srv, "viewer").await;
    let (editor, _) = login_as(&client, &srv, "editor").await;

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, viewer.header())
        .json(&json!({ "name": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(res).await, "Access denied. Insufficient privileges.");

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, editor.header())
        .json(&json!({ "name": 5, "email": "x@y.z", "phone": "1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_body");

    let res = client
        .post(srv.url("/api/products"))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_body");
}

#[tokio::test]
async fn customer_lifecycle_follows_role_sets() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (admin, _) = login_as(&client, &srv, "admin").await;
    let (editor, _) = login_as(&client, &srv, "editor").await;
    let (viewer, _) = login_as(&client, &srv, "viewer").await;

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, viewer.header())
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "phone": "555" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, editor.header())
        .json(&json!({ "name": "Ada", "email": "ada@example.com", "phone": "555" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let customer: Value = res.json().await.unwrap();
    let id = customer["id"].as_i64().unwrap();

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, editor.header())
        .json(&json!({ "name": "Bob" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "All fields are required");

    let res = client
        .get(srv.url("/api/customers?search=ADA"))
        .header(COOKIE, viewer.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);

    let update = json!({ "name": "Ada L.", "email": "ada@example.com", "phone": "556" });
    let res = client
        .put(srv.url(&format!("/api/customers/{id}")))
        .header(COOKIE, editor.header())
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url(&format!("/api/customers/{id}")))
        .header(COOKIE, admin.header())
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Ada L.");

    let res = client
        .put(srv.url("/api/customers/9999"))
        .header(COOKIE, admin.header())
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(res).await, "Customer not found");

    let res = client
        .delete(srv.url(&format!("/api/customers/{id}")))
        .header(COOKIE, admin.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let deleted: Value = res.json().await.unwrap();
    assert_eq!(deleted["message"], "Customer deleted successfully");
    assert_eq!(deleted["customer"]["id"], id);

    let res = client
        .delete(srv.url("/api/customers/abc"))
        .header(COOKIE, admin.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_list_with_customer_and_summed_total() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (editor, _) = login_as(&client, &srv, "editor").await;

    let res = client
        .post(srv.url("/api/customers"))
        .header(COOKIE, editor.header())
        .json(&json!({ "name": "Grace", "email": "grace@example.com", "phone": "1" }))
        .send()
        .await
        .unwrap();
    let customer: Value = res.json().await.unwrap();

    let res = client
        .post(srv.url("/api/orders"))
        .header(COOKIE, editor.header())
        .json(&json!({ "customer_id": customer["id"], "status": "pending", "total": 30.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["order_id"].as_i64().unwrap();

    srv.store
        .insert_order_item(shopdesk_core::OrderId::new(order_id), 2, 7.5)
        .unwrap();

    let res = client
        .get(srv.url("/api/orders?search=grace&status=pending"))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Vec<Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["customer_name"], "Grace");
    assert_eq!(listed[0]["total"], 15.0);

    let res = client
        .put(srv.url(&format!("/api/orders/{order_id}")))
        .header(COOKIE, editor.header())
        .json(&json!({ "status": "shipped", "total": 15.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/api/orders"))
        .header(COOKIE, editor.header())
        .json(&json!({ "customer_id": 4242, "status": "pending", "total": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn products_join_categories_and_keep_images() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (editor, _) = login_as(&client, &srv, "editor").await;
    let lamps = srv.store.insert_category("Lamps").unwrap();
    srv.store.insert_category("Chairs").unwrap();

    let res = client
        .get(srv.url("/api/products/categories"))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    let categories: Vec<Value> = res.json().await.unwrap();
    assert_eq!(categories[0]["name"], "Chairs");
    assert_eq!(categories[1]["name"], "Lamps");

    let res = client
        .post(srv.url("/api/products"))
        .header(COOKIE, editor.header())
        .json(&json!({
            "name": "Desk lamp",
            "price": 24.0,
            "category_id": lamps.id,
            "image_url": "/uploads/lamp.png",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: Value = res.json().await.unwrap();
    let id = product["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/api/products/{id}")))
        .header(COOKIE, editor.header())
        .json(&json!({ "name": "Desk lamp", "price": 19.0, "category_id": lamps.id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["image_url"], "/uploads/lamp.png");

    let res = client
        .get(srv.url(&format!("/api/products?category={}", lamps.id)))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    let listed: Vec<Value> = res.json().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["category"], "Lamps");
    assert_eq!(listed[0]["price"], 19.0);

    let res = client
        .delete(srv.url(&format!("/api/products/{id}")))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn user_administration_is_admin_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (admin, _) = login_as(&client, &srv, "admin").await;
    let (editor, _) = login_as(&client, &srv, "editor").await;

    let res = client
        .get(srv.url("/api/users"))
        .header(COOKIE, editor.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/api/users?role=viewer"))
        .header(COOKIE, admin.header())
        .send()
        .await
        .unwrap();
    let viewers: Vec<Value> = res.json().await.unwrap();
    assert_eq!(viewers.len(), 1);
    assert!(viewers[0].get("password_hash").is_none());

    let res = client
        .post(srv.url("/api/users"))
        .header(COOKIE, admin.header())
        .json(&json!({
            "username": "ops",
            "email": "ops@shop.test",
            "password": "ops-pass",
            "role": "editor",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/api/users/{id}")))
        .header(COOKIE, admin.header())
        .json(&json!({ "username": "ops", "email": "ops@shop.test", "role": "viewer" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["role"], "viewer");

    let res = client
        .delete(srv.url(&format!("/api/users/{id}")))
        .header(COOKIE, admin.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap()["message"],
        "User deleted successfully"
    );

    let res = client
        .delete(srv.url(&format!("/api/users/{id}")))
        .header(COOKIE, admin.header())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(res).await, "User not found");
}
