//! Mock backend tests for the authenticated client.
//!
//! These tests use wiremock to simulate the chat backend and exercise the
//! refresh protocol without network access or real credentials.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use palaver::client::endpoints::{LOGIN, ME, PROFILE, REFRESH};
use palaver::error::{AuthError, Error};
use palaver::{
    AccessToken, ApiClient, ApiRequest, BaseUrl, ClientConfig, CredentialPair, CredentialStore,
    MemoryStore, MultipartBody, Navigator, RefreshToken, User,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a base URL from a mock server.
fn mock_base_url(server: &MockServer) -> BaseUrl {
    BaseUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

fn client_for(server: &MockServer, store: Arc<MemoryStore>) -> ApiClient {
    ApiClient::builder(ClientConfig::new(mock_base_url(server)))
        .store(store)
        .build()
        .unwrap()
}

fn pair(access: &str, refresh: &str) -> CredentialPair {
    CredentialPair::new(AccessToken::new(access), RefreshToken::new(refresh))
}

fn user_json() -> Value {
    json!({
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "name": "Alice",
        "name_set": true
    })
}

fn bearer_count(requests: &[wiremock::Request], token: &str) -> usize {
    let expected = format!("Bearer {}", token);
    requests
        .iter()
        .filter(|r| r.url.path() == ME)
        .filter(|r| {
            r.headers
                .get("authorization")
                .is_some_and(|v| v.to_str().ok() == Some(expected.as_str()))
        })
        .count()
}

#[derive(Default)]
struct RecordingNavigator {
    at: Option<String>,
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> Option<String> {
        self.at.clone()
    }

    fn navigate(&self, path: &str) {
        self.visited.lock().unwrap().push(path.to_string());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_anonymous_401_fails_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Authentication credentials were not provided."
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let client = client_for(&server, store.clone());

    let result = client.get::<User>(ME).await;

    assert!(matches!(result, Err(Error::Auth(AuthError::Unauthorized))));
    assert!(store.load().unwrap().is_none());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_valid_credential_returns_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    let user: User = client.get(ME).await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(store.load().unwrap(), Some(pair("a1", "r1")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expiry_shares_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<User>(ME).await })
        })
        .collect();

    for handle in handles {
        let user = handle.await.unwrap().unwrap();
        assert_eq!(user.id, 1);
    }

    assert_eq!(store.load().unwrap(), Some(pair("a2", "r1")));
    assert!(!client.coordinator().is_refreshing());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(bearer_count(&requests, "a1"), 3);
    assert_eq!(bearer_count(&requests, "a2"), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_refresh_fails_everyone_and_clears_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({
                    "detail": "Token is invalid or expired",
                    "code": "token_not_valid"
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "expired")));
    store.set("username", "alice");
    let client = client_for(&server, store.clone());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<User>(ME).await })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_auth_failure(), "unexpected error: {err}");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message(), "Token is invalid or expired");
        let Error::Auth(AuthError::RefreshRejected {
            body: Some(body), ..
        }) = &err
        else {
            panic!("expected a rejected refresh, got {err:?}");
        };
        assert_eq!(body["code"], "token_not_valid");
    }

    assert!(store.load().unwrap().is_none());
    assert!(store.is_empty());

    // The session is gone: the next call goes out anonymous and fails locally.
    let err = client.get::<User>(ME).await.unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::Unauthorized)));
}

// ============================================================================
// Exemptions and Replay
// ============================================================================

#[tokio::test]
async fn test_login_401_never_refreshes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    let err = client
        .post::<_, Value>(LOGIN, &json!({"username": "alice", "password": "nope"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(
        err.user_message(),
        "No active account found with the given credentials"
    );
    assert_eq!(store.load().unwrap(), Some(pair("a1", "r1")));
}

#[tokio::test]
async fn test_refresh_endpoint_401_is_not_recursive() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is blacklisted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    let request = ApiRequest::post(REFRESH)
        .json(&json!({"refresh": "r1"}))
        .unwrap();
    let err = client.execute(&request).await.unwrap_err();

    assert!(matches!(err, Error::Api(ref e) if e.status == 401));
    assert_eq!(store.load().unwrap(), Some(pair("a1", "r1")));
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored_whole() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .and(header("authorization", "Bearer a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    client.get::<User>(ME).await.unwrap();

    assert_eq!(store.load().unwrap(), Some(pair("a2", "r2")));
}

#[tokio::test]
async fn test_replay_401_is_not_retried_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "User is inactive"
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store.clone());

    let err = client.get::<User>(ME).await.unwrap_err();

    assert!(matches!(err, Error::Api(ref e) if e.status == 401));
    assert_eq!(err.user_message(), "User is inactive");
}

// ============================================================================
// Error Normalization
// ============================================================================

#[tokio::test]
async fn test_validation_errors_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(PROFILE))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "username": ["This username is already taken. Please choose another."]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::with_pair(&pair("a1", "r1")));
    let client = client_for(&server, store);

    let err = client
        .patch::<_, Value>(PROFILE, &json!({"username": "bob"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.user_message(),
        "username: This username is already taken. Please choose another."
    );
    let fields = err.field_errors().unwrap();
    assert_eq!(fields["username"].len(), 1);
}

#[tokio::test]
async fn test_non_json_error_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string("Internal Server Error")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemoryStore::new()));
    let err = client.get::<Value>(ME).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "An unexpected error occurred");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_empty_success_body_decodes_to_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/chats/9/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemoryStore::with_pair(&pair("a1", "r1"))));
    let response = client
        .execute(&ApiRequest::delete("/api/chats/9/"))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 204);
    assert!(response.body.is_null());
    client.delete("/api/chats/9/").await.unwrap();
}

#[tokio::test]
async fn test_connectivity_failure_has_no_status() {
    // Reserve a port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let base = BaseUrl::new(format!("http://127.0.0.1:{}", port)).unwrap();

    let client = ApiClient::builder(ClientConfig::new(base)).build().unwrap();
    let err = client.get::<Value>(ME).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.status(), None);
    assert_eq!(err.user_message(), palaver::error::CONNECTIVITY_MESSAGE);
}

// ============================================================================
// Request Shape and Side Effects
// ============================================================================

#[tokio::test]
async fn test_multipart_replay_after_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(PROFILE))
        .and(header("authorization", "Bearer a2"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(PROFILE))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemoryStore::with_pair(&pair("a1", "r1"))));
    let body = MultipartBody::new()
        .text("name", "Alice")
        .file("avatar", "avatar.png", vec![0x89, 0x50, 0x4e, 0x47], Some("image/png"));

    let user: User = client
        .execute(&ApiRequest::patch(PROFILE).multipart(body))
        .await
        .unwrap()
        .json()
        .unwrap();

    assert_eq!(user.name, "Alice");
}

#[tokio::test]
async fn test_failed_refresh_redirects_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let navigator = Arc::new(RecordingNavigator {
        at: Some("/chat".to_string()),
        ..Default::default()
    });
    let client = ApiClient::builder(ClientConfig::new(mock_base_url(&server)))
        .store(Arc::new(MemoryStore::with_pair(&pair("a1", "r1"))))
        .navigator(navigator.clone())
        .build()
        .unwrap();

    let err = client.get::<Value>(ME).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Auth(AuthError::RefreshRejected {
            status: 400,
            body: None
        })
    ));
    assert_eq!(*navigator.visited.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_anonymous_browsing_is_not_redirected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ME))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let navigator = Arc::new(RecordingNavigator {
        at: Some("/signup".to_string()),
        ..Default::default()
    });
    let client = ApiClient::builder(ClientConfig::new(mock_base_url(&server)))
        .navigator(navigator.clone())
        .build()
        .unwrap();

    assert!(client.get::<Value>(ME).await.is_err());
    assert!(navigator.visited.lock().unwrap().is_empty());
}
