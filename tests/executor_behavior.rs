use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, RETRY_AFTER},
    Method,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tenable_http::{
    paginate::{self, Page, Paginated, Pagination},
    ApiKeyAuth, BackoffOptions, BoxError, CancelToken, ClientOptions, Executor, NoAuth,
    PreparedRequest, RawResponse, TenableError, Transport,
};
use tokio::time::Instant;

enum Step {
    Respond {
        status: u16,
        retry_after: Option<&'static str>,
        body: JsonValue,
    },
    Fail,
    Hang,
}

impl Step {
    fn status(status: u16) -> Self {
        Self::Respond {
            status,
            retry_after: None,
            body: json!({"error": "upstream"}),
        }
    }

    fn ok(body: JsonValue) -> Self {
        Self::Respond {
            status: 200,
            retry_after: None,
            body,
        }
    }

    fn rate_limited(retry_after: Option<&'static str>) -> Self {
        Self::Respond {
            status: 429,
            retry_after,
            body: json!({"error": "too many requests"}),
        }
    }
}

struct Sent {
    at: Instant,
    request: PreparedRequest,
}

struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> usize {
        self.sent.lock().expect("sent log mutex").len()
    }

    fn gaps(&self) -> Vec<Duration> {
        let sent = self.sent.lock().expect("sent log mutex");
        sent.windows(2).map(|pair| pair[1].at - pair[0].at).collect()
    }

    fn bodies(&self) -> Vec<Option<Bytes>> {
        let sent = self.sent.lock().expect("sent log mutex");
        sent.iter().map(|entry| entry.request.body.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, BoxError> {
        self.sent.lock().expect("sent log mutex").push(Sent {
            at: Instant::now(),
            request,
        });
        let step = self
            .script
            .lock()
            .expect("script mutex")
            .pop_front()
            .unwrap_or_else(|| Step::status(500));

        match step {
            Step::Respond {
                status,
                retry_after,
                body,
            } => {
                let mut headers = HeaderMap::new();
                if let Some(value) = retry_after {
                    headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
                }
                Ok(RawResponse {
                    status,
                    headers,
                    body: Bytes::from(body.to_string()),
                })
            }
            Step::Fail => Err("connection refused".into()),
            Step::Hang => std::future::pending().await,
        }
    }
}

fn executor(transport: &Arc<ScriptedTransport>) -> Executor {
    Executor::new(transport.clone(), Arc::new(NoAuth), ClientOptions::default())
}

fn request() -> PreparedRequest {
    PreparedRequest::parse(Method::POST, "https://cloud.tenable.com/scans")
        .expect("url must parse")
        .with_json(&json!({"uuid": "tpl", "settings": {"name": "nightly"}}))
        .expect("body must serialize")
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_any_number_of_failures_within_budget() {
    let failures = [500, 404, 403, 301, 502, 503, 400, 500, 401];

    for count in 0..=failures.len() {
        let mut steps: Vec<Step> = failures[..count].iter().map(|s| Step::status(*s)).collect();
        steps.push(Step::ok(json!({"id": count})));
        let transport = ScriptedTransport::new(steps);

        let body: JsonValue = executor(&transport)
            .execute(&request(), &CancelToken::new())
            .await
            .expect("call must eventually succeed");

        assert_eq!(body, json!({"id": count}));
        assert_eq!(transport.attempts(), count + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn ten_failures_exhaust_the_budget() {
    let steps = (0..10).map(|_| Step::status(503)).collect();
    let transport = ScriptedTransport::new(steps);

    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect_err("call must fail");

    match err {
        TenableError::RetryLimitExceeded {
            attempts,
            last_status,
            last_body,
        } => {
            assert_eq!(attempts, 10);
            assert_eq!(last_status, 503);
            assert!(last_body.contains("upstream"));
        }
        other => panic!("expected retry limit, got {other:?}"),
    }
    assert_eq!(transport.attempts(), 10);
}

#[tokio::test(start_paused = true)]
async fn retry_after_is_honored_exactly() {
    let transport = ScriptedTransport::new(vec![
        Step::rate_limited(Some("5")),
        Step::ok(json!({})),
    ]);

    executor(&transport)
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect("call must succeed");

    assert_eq!(transport.gaps(), vec![Duration::from_secs(5)]);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_without_header_uses_backoff_bounds() {
    let transport = ScriptedTransport::new(vec![
        Step::rate_limited(None),
        Step::rate_limited(Some("soon")),
        Step::rate_limited(None),
        Step::ok(json!({})),
    ]);

    executor(&transport)
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect("call must succeed");

    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 3);
    assert_eq!(gaps[0], Duration::from_millis(100));
    let caps = [100.0, 150.0, 225.0];
    for (gap, cap) in gaps.iter().zip(caps) {
        let millis = gap.as_secs_f64() * 1_000.0;
        assert!(millis >= 100.0, "{gap:?} below min");
        assert!(millis <= cap + 0.001, "{gap:?} above {cap}ms");
    }
}

#[tokio::test(start_paused = true)]
async fn body_is_identical_on_every_attempt() {
    let transport = ScriptedTransport::new(vec![
        Step::status(500),
        Step::rate_limited(Some("1")),
        Step::ok(json!({})),
    ]);
    let request = request();

    executor(&transport)
        .execute_discard(&request, &CancelToken::new())
        .await
        .expect("call must succeed");

    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 3);
    for body in bodies {
        assert_eq!(body, request.body);
    }
}

#[tokio::test(start_paused = true)]
async fn auth_headers_are_applied_on_every_attempt() {
    let transport = ScriptedTransport::new(vec![Step::status(502), Step::ok(json!({}))]);
    let auth = ApiKeyAuth::new("ak", "sk").expect("keys must be valid");
    let executor = Executor::new(transport.clone(), Arc::new(auth), ClientOptions::default());

    executor
        .execute_discard(&request(), &CancelToken::new())
        .await
        .expect("call must succeed");

    let sent = transport.sent.lock().expect("sent log mutex");
    assert_eq!(sent.len(), 2);
    for entry in sent.iter() {
        assert_eq!(
            entry.request.headers["x-apikeys"],
            "accessKey=ak;secretKey=sk"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Step::Fail, Step::ok(json!({}))]);

    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect_err("call must fail");

    assert!(matches!(err, TenableError::Transport(_)));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn decode_failure_is_not_retried() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Expected {
        scans: Vec<u64>,
    }

    let transport = ScriptedTransport::new(vec![
        Step::ok(json!({"scans": "nope"})),
        Step::ok(json!({"scans": []})),
    ]);

    let err = executor(&transport)
        .execute::<Expected>(&request(), &CancelToken::new())
        .await
        .expect_err("call must fail");

    assert!(matches!(err, TenableError::Decode(_)));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_sleep_stops_promptly() {
    let transport = ScriptedTransport::new(vec![
        Step::rate_limited(Some("30")),
        Step::ok(json!({})),
    ]);
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &cancel)
        .await
        .expect_err("call must be canceled");

    assert!(matches!(err, TenableError::Canceled));
    assert_eq!(transport.attempts(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn cancel_aborts_in_flight_attempt() {
    let transport = ScriptedTransport::new(vec![Step::Hang]);
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &cancel)
        .await
        .expect_err("call must be canceled");

    assert!(matches!(err, TenableError::Canceled));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_remaining_attempts() {
    let steps = (0..10).map(|_| Step::rate_limited(Some("3"))).collect();
    let transport = ScriptedTransport::new(steps);
    let cancel = CancelToken::new().with_deadline(Instant::now() + Duration::from_secs(7));

    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &cancel)
        .await
        .expect_err("call must be canceled");

    assert!(matches!(err, TenableError::Canceled));
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn already_canceled_token_sends_nothing() {
    let transport = ScriptedTransport::new(vec![Step::ok(json!({}))]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = executor(&transport)
        .execute::<JsonValue>(&request(), &cancel)
        .await
        .expect_err("call must be canceled");

    assert!(matches!(err, TenableError::Canceled));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_times_out_as_transport_error() {
    let transport = ScriptedTransport::new(vec![Step::Hang, Step::ok(json!({}))]);
    let options = ClientOptions {
        timeout_ms: 1_000,
        ..ClientOptions::default()
    };
    let executor = Executor::new(transport.clone(), Arc::new(NoAuth), options);

    let err = executor
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect_err("call must time out");

    assert!(matches!(err, TenableError::Transport(_)));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn custom_attempt_budget_is_respected() {
    let transport = ScriptedTransport::new(Vec::new());
    let options = ClientOptions {
        max_attempts: 3,
        backoff: BackoffOptions {
            jitter: false,
            ..BackoffOptions::default()
        },
        ..ClientOptions::default()
    };
    let executor = Executor::new(transport.clone(), Arc::new(NoAuth), options);

    let err = executor
        .execute::<JsonValue>(&request(), &CancelToken::new())
        .await
        .expect_err("call must fail");

    assert!(matches!(
        err,
        TenableError::RetryLimitExceeded { attempts: 3, .. }
    ));
    // No sleep after the final attempt.
    let gaps = transport.gaps();
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0], Duration::from_millis(100));
}

#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    items: Vec<String>,
    pagination: Pagination,
}

impl Paginated for ItemsEnvelope {
    type Item = String;

    fn into_page(self) -> Page<String> {
        Page {
            items: self.items,
            next: self.pagination.next,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn pagination_follows_cursor_until_empty() {
    let transport = ScriptedTransport::new(vec![
        Step::ok(json!({"items": ["A", "B"], "pagination": {"next": "c1", "limit": 2, "total": 3}})),
        Step::ok(json!({"items": ["C"], "pagination": {"next": "", "limit": 2, "total": 3}})),
    ]);

    let items = paginate::paginate::<ItemsEnvelope>(
        &executor(&transport),
        &request(),
        &CancelToken::new(),
    )
    .await
    .expect("pagination must succeed");

    assert_eq!(items, vec!["A", "B", "C"]);
    let bodies = transport.bodies();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[1].as_deref(), Some(&br#"{"next":"c1"}"#[..]));
}

#[tokio::test(start_paused = true)]
async fn each_page_gets_its_own_retries() {
    let transport = ScriptedTransport::new(vec![
        Step::status(500),
        Step::ok(json!({"items": ["A"], "pagination": {"next": "c1"}})),
        Step::status(404),
        Step::ok(json!({"items": ["B"], "pagination": {"next": ""}})),
    ]);

    let items = paginate::paginate::<ItemsEnvelope>(
        &executor(&transport),
        &request(),
        &CancelToken::new(),
    )
    .await
    .expect("pagination must succeed");

    assert_eq!(items, vec!["A", "B"]);
    assert_eq!(transport.attempts(), 4);
}

#[tokio::test(start_paused = true)]
async fn pagination_failure_returns_no_partial_items() {
    let transport = ScriptedTransport::new(vec![
        Step::ok(json!({"items": ["A"], "pagination": {"next": "c1"}})),
        Step::Fail,
    ]);

    let err = paginate::paginate::<ItemsEnvelope>(
        &executor(&transport),
        &request(),
        &CancelToken::new(),
    )
    .await
    .expect_err("pagination must fail");

    assert!(matches!(err, TenableError::Transport(_)));
}
