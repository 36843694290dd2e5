use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use intercept_http::{
    BackoffInterceptor, ClientOptions, Dispatcher, InterceptorChain, MaxAttempts, NetworkError,
    Request,
};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
struct MockResponse {
    status: StatusCode,
    body: JsonValue,
    delay: Duration,
}

impl MockResponse {
    fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body,
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct MockState {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(HeaderMap, String)>>>,
}

async fn item_handler(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state
        .last_request
        .lock()
        .expect("request mutex must not be poisoned") = Some((headers, body));

    let response = {
        let mut queue = state
            .responses
            .lock()
            .expect("response queue mutex must not be poisoned");
        queue.pop_front().unwrap_or_else(|| {
            MockResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "no mock response available"}),
            )
        })
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (response.status, Json(response.body))
}

struct TestServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<(HeaderMap, String)>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    fn item_url(&self) -> String {
        format!("{}/items/1", self.base_url)
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> (HeaderMap, String) {
        self.last_request
            .lock()
            .expect("request mutex must not be poisoned")
            .clone()
            .expect("server must have received a request")
    }
}

async fn spawn_server(responses: Vec<MockResponse>) -> TestServer {
    let state = MockState {
        responses: Arc::new(Mutex::new(responses.into())),
        hits: Arc::new(AtomicUsize::new(0)),
        last_request: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/items/1", get(item_handler).post(item_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        last_request: state.last_request,
        task,
    }
}

#[tokio::test]
async fn get_returns_body_and_forwards_headers() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, json!({"id": 1}))]).await;
    let dispatcher = Dispatcher::new();

    let body = dispatcher
        .get(&server.item_url(), &[("X-Request-Id", "abc")])
        .await
        .expect("get must succeed");

    let parsed: JsonValue = serde_json::from_slice(&body).expect("body must be json");
    assert_eq!(parsed, json!({"id": 1}));
    assert_eq!(server.hits(), 1);
    let (headers, _) = server.last_request();
    assert_eq!(
        headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc")
    );
}

#[tokio::test]
async fn post_sends_body() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::CREATED,
        json!({"id": 2}),
    )])
    .await;

    Dispatcher::new()
        .post(
            &server.item_url(),
            br#"{"name":"Kit"}"#.to_vec(),
            &[("content-type", "application/json")],
        )
        .await
        .expect("post must succeed");

    let (_, body) = server.last_request();
    assert_eq!(body, r#"{"name":"Kit"}"#);
}

#[tokio::test]
async fn not_found_is_invalid_response() {
    let server = spawn_server(vec![MockResponse::json(
        StatusCode::NOT_FOUND,
        json!({"error": "missing"}),
    )])
    .await;

    let err = Dispatcher::new()
        .get(&server.item_url(), &[])
        .await
        .expect_err("404 must fail");

    assert!(matches!(err, NetworkError::InvalidResponse { status: 404 }));
}

#[tokio::test]
async fn connection_refused_is_request_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind probe listener");
    let address = listener.local_addr().expect("must have local addr");
    drop(listener);

    let err = Dispatcher::new()
        .get(&format!("http://{address}/items/1"), &[])
        .await
        .expect_err("closed port must fail");

    match err {
        NetworkError::RequestFailed(inner) => assert!(inner.is_connect()),
        other => panic!("expected request failure, got {other:?}"),
    }
}

#[tokio::test]
async fn backoff_retries_server_errors_until_success() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "busy"})),
        MockResponse::json(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})),
        MockResponse::json(StatusCode::OK, json!({"id": 1})),
    ])
    .await;

    let body = Dispatcher::new()
        .with_interceptor(BackoffInterceptor::new(3, 1))
        .send(Request::get(&server.item_url()).expect("request must build"))
        .await
        .expect("request must succeed after retries");

    assert!(!body.is_empty());
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn bounded_chain_gives_up_with_last_status() {
    let server = spawn_server(vec![
        MockResponse::json(StatusCode::BAD_GATEWAY, json!({})),
        MockResponse::json(StatusCode::BAD_GATEWAY, json!({})),
        MockResponse::json(StatusCode::OK, json!({"id": 1})),
    ])
    .await;

    let chain = InterceptorChain::new().with(BackoffInterceptor::new(10, 1));
    let err = Dispatcher::new()
        .with_interceptor(MaxAttempts::new(chain, 2))
        .get(&server.item_url(), &[])
        .await
        .expect_err("must stop before the successful response");

    assert!(matches!(err, NetworkError::InvalidResponse { status: 502 }));
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn attempt_timeout_surfaces_request_failed() {
    let server = spawn_server(vec![MockResponse::json(StatusCode::OK, json!({"id": 1}))
        .with_delay(Duration::from_millis(150))])
    .await;

    let err = Dispatcher::new()
        .with_options(ClientOptions {
            timeout_ms: 20,
            ..ClientOptions::default()
        })
        .get(&server.item_url(), &[])
        .await
        .expect_err("request must time out");

    match err {
        NetworkError::RequestFailed(inner) => assert!(inner.is_timeout()),
        other => panic!("expected transport timeout error, got {other:?}"),
    }
}
