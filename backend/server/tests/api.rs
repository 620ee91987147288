use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    body::{Body, to_bytes},
    extract::{Path, State},
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use server::{
    config::Config,
    database::{DEFAULT_SEED, Item, ItemStore, SqliteItemStore, StoreError},
    router,
    state::AppState,
};
use tokio::net::TcpListener;
use tower::ServiceExt;

const TEST_KEY: &str = include_str!("../../sheets/testdata/service_account_key.pem");

#[derive(Default)]
struct CountingStore {
    calls: AtomicUsize,
}

impl ItemStore for CountingStore {
    fn search(&self, _text: &str, _limit: usize) -> Result<Vec<Item>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

struct BrokenStore;

impl ItemStore for BrokenStore {
    fn search(&self, _text: &str, _limit: usize) -> Result<Vec<Item>, StoreError> {
        Err(StoreError::Poisoned)
    }
}

fn config(vars: &[(&str, String)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn seeded_store() -> Arc<dyn ItemStore> {
    let store = SqliteItemStore::open_in_memory().unwrap();
    store.seed_if_empty(DEFAULT_SEED).unwrap();
    Arc::new(store)
}

fn app(config: Config, store: Arc<dyn ItemStore>) -> Router {
    router(AppState::with_store(config, store).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, serde_json::from_slice(&body).unwrap())
}

type Assertions = Arc<Mutex<Vec<String>>>;

async fn spawn_upstream() -> (String, Assertions) {
    async fn token(
        State(assertions): State<Assertions>,
        Form(form): Form<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if let Some(assertion) = form.get("assertion") {
            assertions.lock().unwrap().push(assertion.clone());
        }

        Json(json!({"access_token": "test-token", "expires_in": 3599, "token_type": "Bearer"}))
    }

    async fn values(Path((id, range)): Path<(String, String)>) -> impl IntoResponse {
        if id == "slow" {
            tokio::time::sleep(Duration::from_secs(3)).await;
        }

        if range == "Missing!A1" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": {"code": 404, "message": "Range not found", "status": "NOT_FOUND"}})),
            );
        }

        (
            StatusCode::OK,
            Json(json!({"range": range, "majorDimension": "ROWS", "values": [[id]]})),
        )
    }

    let assertions = Assertions::default();
    let upstream = Router::new()
        .route("/token", post(token))
        .route("/v4/spreadsheets/{id}/values/{range}", get(values))
        .with_state(assertions.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    (format!("http://{address}"), assertions)
}

fn configured(base: &str) -> Config {
    config(&[
        (
            "GOOGLE_SERVICE_ACCOUNT_EMAIL",
            "reader@example.iam.gserviceaccount.com".to_string(),
        ),
        ("GOOGLE_PRIVATE_KEY", TEST_KEY.replace('\n', "\\n")),
        ("GOOGLE_TOKEN_URI", format!("{base}/token")),
        ("SHEETS_API_BASE", format!("{base}/v4")),
    ])
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(config(&[]), seeded_store()), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_search_short_or_missing_query() {
    let store = Arc::new(CountingStore::default());

    for uri in ["/api/search", "/api/search?q=", "/api/search?q=a", "/api/search?q=%20x%20"] {
        let (status, body) = get_json(app(config(&[]), store.clone()), uri).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }

    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_returns_item_shape() {
    let (status, body) = get_json(app(config(&[]), seeded_store()), "/api/search?q=french").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 11, "name": "French Press", "description": null, "category": "Kitchen"}])
    );
}

#[tokio::test]
async fn test_search_matches_description() {
    let (status, body) = get_json(
        app(config(&[]), seeded_store()),
        "/api/search?q=waterproof",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Bluetooth Speaker");
}

#[tokio::test]
async fn test_search_caps_results() {
    let (status, body) = get_json(app(config(&[]), seeded_store()), "/api/search?q=e").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = get_json(app(config(&[]), seeded_store()), "/api/search?q=er").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_search_injection_is_literal() {
    for q in ["%25%25", "'%20OR%201=1%20--", "__"] {
        let uri = format!("/api/search?q={q}");
        let (status, body) = get_json(app(config(&[]), seeded_store()), &uri).await;

        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!([]), "{uri}");
    }
}

#[tokio::test]
async fn test_search_store_fault_is_generic() {
    let (status, body) = get_json(
        app(config(&[]), Arc::new(BrokenStore)),
        "/api/search?q=desk",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch search results."}));
}

#[tokio::test]
async fn test_sheets_without_credentials() {
    let only_email = config(&[(
        "GOOGLE_SERVICE_ACCOUNT_EMAIL",
        "reader@example.iam.gserviceaccount.com".to_string(),
    )]);
    let only_key = config(&[("GOOGLE_PRIVATE_KEY", TEST_KEY.to_string())]);

    for unconfigured in [config(&[]), only_email, only_key] {
        let (status, body) =
            get_json(app(unconfigured, seeded_store()), "/api/sheets/abc/Sheet1!A1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "error": "Server configuration error.",
                "details": "Google service account credentials are not set.",
            })
        );
    }
}

#[tokio::test]
async fn test_sheets_pass_through() {
    let (base, _) = spawn_upstream().await;

    let (status, body) = get_json(
        app(configured(&base), seeded_store()),
        "/api/sheets/sheet-123/Sheet1!A1:C3",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"range": "Sheet1!A1:C3", "majorDimension": "ROWS", "values": [["sheet-123"]]})
    );
}

#[tokio::test]
async fn test_sheets_upstream_not_found() {
    let (base, _) = spawn_upstream().await;

    let (status, body) = get_json(
        app(configured(&base), seeded_store()),
        "/api/sheets/sheet-123/Missing!A1",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "error": "Failed to fetch data from Google Sheets.",
            "message": "Range not found",
        })
    );
}

#[tokio::test]
async fn test_sheets_bad_key_is_reported_not_panicked() {
    let (base, _) = spawn_upstream().await;
    let config = config(&[
        (
            "GOOGLE_SERVICE_ACCOUNT_EMAIL",
            "reader@example.iam.gserviceaccount.com".to_string(),
        ),
        ("GOOGLE_PRIVATE_KEY", "not-a-pem".to_string()),
        ("GOOGLE_TOKEN_URI", format!("{base}/token")),
        ("SHEETS_API_BASE", format!("{base}/v4")),
    ]);

    let (status, body) =
        get_json(app(config, seeded_store()), "/api/sheets/sheet-123/Sheet1!A1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch data from Google Sheets.");
    assert!(!body["message"].as_str().unwrap().contains("not-a-pem"));
}

#[tokio::test]
async fn test_sheets_signs_fresh_assertion_per_request() {
    let (base, assertions) = spawn_upstream().await;

    for _ in 0..2 {
        let (status, _) = get_json(
            app(configured(&base), seeded_store()),
            "/api/sheets/sheet-123/Sheet1!A1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // iat has one-second resolution
        tokio::time::sleep(Duration::from_millis(1100)).await;
    }

    let assertions = assertions.lock().unwrap().clone();
    assert_eq!(assertions.len(), 2);
    assert_ne!(assertions[0], assertions[1]);
}

#[tokio::test]
async fn test_sheets_timeout_is_500_without_upstream_url() {
    let (base, _) = spawn_upstream().await;
    let config = config(&[
        (
            "GOOGLE_SERVICE_ACCOUNT_EMAIL",
            "reader@example.iam.gserviceaccount.com".to_string(),
        ),
        ("GOOGLE_PRIVATE_KEY", TEST_KEY.to_string()),
        ("GOOGLE_TOKEN_URI", format!("{base}/token")),
        ("SHEETS_API_BASE", format!("{base}/v4")),
        ("UPSTREAM_TIMEOUT_MS", "200".to_string()),
    ]);

    let (status, body) =
        get_json(app(config, seeded_store()), "/api/sheets/slow/Sheet1!A1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "Failed to fetch data from Google Sheets.",
            "message": "Upstream request failed",
        })
    );
}
