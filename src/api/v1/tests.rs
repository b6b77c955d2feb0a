use super::{ApiErrorCode, recover_error, routes};
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::{MemoryMemberRepo, MemoryRevocationStore};
use crate::server::Server;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use warp::Filter;
use warp::http::StatusCode;
use warp::http::header::SET_COOKIE;
use warp::hyper::body::Bytes;

const EMAIL: &str = "kim@b.com";
const PASSWORD: &str = "Passw0rd!";
const NAME: &str = "Kim";
const PHONE: &str = "010-1234-5678";

/// Memory store whose writes can be switched off mid-test.
#[derive(Default)]
struct SwitchableStore {
    inner: MemoryRevocationStore,
    fail_puts: AtomicBool,
}

#[async_trait::async_trait]
impl RevocationStore for SwitchableStore {
    async fn put(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        self.inner.put(key, value, ttl_secs).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }
}

fn server(store: Arc<SwitchableStore>) -> Arc<Server> {
    let members = Arc::new(MemoryMemberRepo::new());
    let codec = Arc::new(JwtHs256Codec::new(JwtConfig {
        issuer: "tokenkeeper.test".to_string(),
        audience: "tokenkeeper-client".to_string(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(3600),
        signing_key: b"http-test-key".to_vec(),
    }));
    let policy = CredentialPolicy::new(&PasswordPolicyConfig {
        pattern: r"^[A-Za-z\d@$!%*?&]{8,20}$".to_string(),
        required_classes: vec![
            r"[A-Za-z]".to_string(),
            r"\d".to_string(),
            r"[@$!%*?&]".to_string(),
        ],
        temp_password_length: 12,
    })
    .unwrap();

    let auth_service = Arc::new(RealAuthService::new(
        members.clone(),
        Arc::new(Argon2PasswordHasher),
        codec.clone(),
        store.clone(),
        Vec::new(),
        Arc::new(policy),
    ));
    let auth_gate = Arc::new(RealAuthGate::new(members, codec, store, true));
    Arc::new(Server::new(auth_service, auth_gate))
}

fn body_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn set_cookie(resp: &warp::http::Response<Bytes>) -> Option<String> {
    resp.headers()
        .get(SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .unwrap()
        .to_string()
}

struct Session {
    access_token: String,
    refresh_token: String,
}

async fn signup<F>(api: &F)
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: warp::Reply + Send,
{
    let resp = warp::test::request()
        .method("POST")
        .path("/signup")
        .json(&json!({
            "email": EMAIL,
            "password": PASSWORD,
            "name": NAME,
            "phone_number": PHONE,
        }))
        .reply(api)
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

async fn login<F>(api: &F, password: &str) -> warp::http::Response<Bytes>
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: warp::Reply + Send,
{
    warp::test::request()
        .method("POST")
        .path("/login")
        .json(&json!({ "email": EMAIL, "password": password }))
        .reply(api)
        .await
}

async fn session<F>(api: &F) -> Session
where
    F: Filter + Clone + Send + Sync + 'static,
    F::Extract: warp::Reply + Send,
{
    let resp = login(api, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp).unwrap();
    let body = body_json(resp.body());
    Session {
        access_token: body["data"]["access_token"].as_str().unwrap().to_string(),
        refresh_token: cookie_value(&cookie),
    }
}

fn assert_cookie_removed(resp: &warp::http::Response<Bytes>) {
    let cookie = set_cookie(resp).unwrap();
    assert!(cookie.starts_with("refresh_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

fn error_code(resp: &warp::http::Response<Bytes>) -> String {
    body_json(resp.body())["error"]["code"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn login_sets_refresh_cookie_and_returns_access_token() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;

    let resp = login(&api, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = set_cookie(&resp).unwrap();
    assert!(cookie.starts_with("refresh_token=ey"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Max-Age=0;"));

    let body = body_json(resp.body());
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["access_token"].as_str().unwrap().starts_with("ey"));
    assert!(body["data"].get("refresh_token").is_none());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;

    let resp = login(&api, "Wr0ngpass!").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), ApiErrorCode::InvalidCredentials.code());
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/signup")
        .json(&json!({
            "email": EMAIL,
            "password": PASSWORD,
            "name": "Other",
            "phone_number": "010-9999-9999",
        }))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(&resp), "DUPLICATED_EMAIL");
}

#[tokio::test]
async fn reissue_with_cookie_returns_new_access_token() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/reissue")
        .header("authorization", format!("Bearer {}", session.access_token))
        .header("cookie", format!("refresh_token={}", session.refresh_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert!(body["data"]["access_token"].as_str().unwrap().starts_with("ey"));
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn reissue_with_superseded_refresh_token_clears_cookie() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let first = session(&api).await;
    let second = session(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/reissue")
        .header("authorization", format!("Bearer {}", second.access_token))
        .header("cookie", format!("refresh_token={}", first.refresh_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), "REISSUE_FAILED");
    assert_cookie_removed(&resp);

    // the mismatch dropped the session, so the current token is dead too
    let resp = warp::test::request()
        .method("POST")
        .path("/reissue")
        .header("authorization", format!("Bearer {}", second.access_token))
        .header("cookie", format!("refresh_token={}", second.refresh_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_removed(&resp);
}

#[tokio::test]
async fn reissue_without_cookie_keeps_cookie_untouched() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/reissue")
        .header("authorization", format!("Bearer {}", session.access_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), "REISSUE_FAILED");
    assert!(set_cookie(&resp).is_none());
}

#[tokio::test]
async fn logout_revokes_token_and_clears_cookie() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;
    let bearer = format!("Bearer {}", session.access_token);

    let resp = warp::test::request()
        .method("GET")
        .path("/members/me")
        .header("authorization", &bearer)
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    for _ in 0..2 {
        let resp = warp::test::request()
            .method("POST")
            .path("/logout")
            .header("authorization", &bearer)
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_cookie_removed(&resp);
    }

    let resp = warp::test::request()
        .method("GET")
        .path("/members/me")
        .header("authorization", &bearer)
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), "UNAUTHORIZED");

    let resp = warp::test::request()
        .method("POST")
        .path("/reissue")
        .header("authorization", &bearer)
        .header("cookie", format!("refresh_token={}", session.refresh_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_cookie_removed(&resp);
}

#[tokio::test]
async fn logout_clears_cookie_even_when_store_is_down() {
    let store = Arc::new(SwitchableStore::default());
    let api = routes(server(store.clone())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;

    store.fail_puts.store(true, Ordering::SeqCst);
    let resp = warp::test::request()
        .method("POST")
        .path("/logout")
        .header("authorization", format!("Bearer {}", session.access_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(&resp), "LOGOUT_FAILED");
    assert_cookie_removed(&resp);
}

#[tokio::test]
async fn logout_without_bearer_still_clears_cookie() {
    let api = routes(server(Arc::default())).recover(recover_error);

    let resp = warp::test::request()
        .method("POST")
        .path("/logout")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&resp), "INVALID_TOKEN");
    assert_cookie_removed(&resp);
}

#[tokio::test]
async fn members_me_reports_identity() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;

    let resp = warp::test::request()
        .method("GET")
        .path("/members/me")
        .header("authorization", format!("Bearer {}", session.access_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert_eq!(body["data"]["email"], json!(EMAIL));
    assert_eq!(body["data"]["role"], json!("USER"));
    assert!(body["data"].get("access_token").is_none());

    let resp = warp::test::request()
        .method("GET")
        .path("/members/me")
        .header("authorization", format!("Bearer {}", session.refresh_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn withdrawal_ends_the_account() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;
    let session = session(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/withdrawal")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = warp::test::request()
        .method("POST")
        .path("/withdrawal")
        .header("authorization", format!("Bearer {}", session.access_token))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_cookie_removed(&resp);

    let resp = login(&api, PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inquiries_recover_email_and_password() {
    let api = routes(server(Arc::default())).recover(recover_error);
    signup(&api).await;

    let resp = warp::test::request()
        .method("POST")
        .path("/inquiry/email")
        .json(&json!({ "name": NAME, "phone_number": PHONE }))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp.body())["data"]["email"], json!(EMAIL));

    let resp = warp::test::request()
        .method("POST")
        .path("/inquiry/password")
        .json(&json!({ "email": EMAIL, "name": NAME, "phone_number": PHONE }))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let temporary = body_json(resp.body())["data"]["temporary_password"]
        .as_str()
        .unwrap()
        .to_string();

    assert_eq!(login(&api, PASSWORD).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(login(&api, &temporary).await.status(), StatusCode::OK);

    let resp = warp::test::request()
        .method("POST")
        .path("/inquiry/email")
        .json(&json!({ "name": "Nobody", "phone_number": PHONE }))
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_and_bad_bodies() {
    let api = routes(server(Arc::default())).recover(recover_error);

    let resp = warp::test::request().path("/nowhere").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = warp::test::request()
        .method("POST")
        .path("/login")
        .body("{not json")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&resp), "INVALID_REQUEST");
}
