#![cfg(feature = "reqwest")]

// std
use std::{
	collections::VecDeque,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use lead_scout::{
	clock::ManualClock,
	config::{ApiEndpoints, Credentials, ScoutConfig},
	error::{Error, TransientError},
	http::{HttpRequest, HttpResponse, HttpTransport, ReqwestHttpClient, TransportFuture},
	oauth::oauth2::http::{Method, Response},
	rate_limit::RateLimiter,
	transport::AuthenticatedTransport,
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";
const USER_AGENT: &str = "lead-scout-it/0.1";
const BASIC_AUTH: &str = "Basic Y2xpZW50LWl0OnNlY3JldC1pdA==";
const TOKEN_BODY: &str =
	r#"{"access_token":"tok-1","token_type":"bearer","expires_in":3600,"scope":"*"}"#;

fn config(token_url: &str, api_base: &str) -> ScoutConfig {
	let credentials = Credentials::new(CLIENT_ID, CLIENT_SECRET, USER_AGENT)
		.expect("Test credentials should be valid.");
	let endpoints =
		ApiEndpoints::new(token_url, api_base).expect("Test endpoints should be valid.");

	ScoutConfig::new(credentials).with_endpoints(endpoints)
}

fn build_with<T>(config: &ScoutConfig, http: T) -> (AuthenticatedTransport<T>, Arc<ManualClock>)
where
	T: HttpTransport,
{
	let clock = Arc::new(ManualClock::default());
	let limiter = Arc::new(RateLimiter::with_clock(config.rate_limit.clone(), clock.clone()));
	let transport = AuthenticatedTransport::with_http_client(config, http, limiter)
		.expect("Transport should build.");

	(transport, clock)
}

fn build_mocked(
	server: &MockServer,
) -> (AuthenticatedTransport<ReqwestHttpClient>, Arc<ManualClock>) {
	let config = config(&server.url("/api/v1/access_token"), &server.base_url());

	build_with(&config, ReqwestHttpClient::default())
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("Request URL should parse.")
}

#[tokio::test]
async fn requests_within_token_validity_share_one_exchange() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token").header("authorization", BASIC_AUTH);
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/r/webdev/about")
				.header("authorization", "Bearer tok-1")
				.header("user-agent", USER_AGENT)
				.header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let (transport, clock) = build_mocked(&server);
	let target = url(&server.url("/r/webdev/about"));

	for _ in 0..2 {
		let body =
			transport.request(&target).await.expect("Authenticated request should succeed.");

		assert_eq!(body, b"{\"ok\":true}");
	}

	token_mock.assert_calls_async(1).await;
	api_mock.assert_calls_async(2).await;

	assert_eq!(transport.exchange_metrics.exchanges(), 1);
	assert_eq!(transport.exchange_metrics.reuses(), 1);

	clock.advance(Duration::minutes(56));
	transport.request(&target).await.expect("Request after refresh should succeed.");

	token_mock.assert_calls_async(2).await;

	assert_eq!(transport.exchange_metrics.exchanges(), 2);
}

#[tokio::test]
async fn rejected_credentials_fail_without_retrying() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Unauthorized\",\"error\":401}");
		})
		.await;
	let (transport, clock) = build_mocked(&server);
	let err = transport
		.request(&url(&server.url("/r/webdev/about")))
		.await
		.expect_err("Rejected credentials should fail the request.");

	token_mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::Authentication { status: Some(401), .. }));
	assert!(err.is_fatal());
	assert!(clock.sleeps().is_empty());
	assert_eq!(transport.exchange_metrics.failures(), 1);
}

#[tokio::test]
async fn server_errors_back_off_then_surface() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;

	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/r/webdev/about");
			then.status(503).body("upstream overloaded");
		})
		.await;
	let (transport, clock) = build_mocked(&server);
	let err = transport
		.request(&url(&server.url("/r/webdev/about")))
		.await
		.expect_err("Persistent 503 should exhaust retries.");

	api_mock.assert_calls_async(4).await;

	assert!(matches!(
		err,
		Error::Transient(TransientError::Status { status: 503, ref body_preview })
			if body_preview == "upstream overloaded"
	));
	assert_eq!(
		clock.sleeps(),
		vec![Duration::seconds(1), Duration::seconds(2), Duration::seconds(4)]
	);
}

#[derive(Debug)]
struct Unreachable;
impl Display for Unreachable {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Scripted transport cannot fail.")
	}
}
impl StdError for Unreachable {}

/// Answers token requests with numbered tokens and API requests from a script.
///
/// Token requests are answered from `token_failures` first, if any remain. Every response
/// yields once before resolving so concurrent callers interleave.
#[derive(Default)]
struct ScriptedTransport {
	script: Mutex<VecDeque<(u16, Option<&'static str>, &'static str)>>,
	token_failures: Mutex<VecDeque<(u16, Option<&'static str>)>>,
	exchanges: AtomicUsize,
	bearer_seen: Mutex<Vec<String>>,
}
impl ScriptedTransport {
	fn new(script: impl IntoIterator<Item = (u16, Option<&'static str>, &'static str)>) -> Self {
		Self { script: Mutex::new(script.into_iter().collect()), ..Default::default() }
	}

	fn with_token_failures(
		self,
		failures: impl IntoIterator<Item = (u16, Option<&'static str>)>,
	) -> Self {
		*self.token_failures.lock().expect("Token script should lock.") =
			failures.into_iter().collect();

		self
	}
}
impl HttpTransport for ScriptedTransport {
	type TransportError = Unreachable;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let token_failure = if request.method() == Method::POST {
			self.token_failures.lock().expect("Token script should lock.").pop_front()
		} else {
			None
		};
		let response = if let Some((status, retry_after)) = token_failure {
			let mut builder = Response::builder()
				.status(status)
				.header("content-type", "application/json");

			if let Some(value) = retry_after {
				builder = builder.header("retry-after", value);
			}

			builder.body(b"{\"message\":\"Too Many Requests\"}".to_vec())
		} else if request.method() == Method::POST {
			let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;

			Response::builder()
				.status(200)
				.header("content-type", "application/json")
				.body(
					format!(r#"{{"access_token":"tok-{n}","token_type":"bearer","expires_in":3600}}"#)
						.into_bytes(),
				)
		} else {
			let bearer = request
				.headers()
				.get("authorization")
				.and_then(|value| value.to_str().ok())
				.unwrap_or_default()
				.to_owned();

			self.bearer_seen.lock().expect("Bearer log should lock.").push(bearer);

			let (status, retry_after, body) = self
				.script
				.lock()
				.expect("Script should lock.")
				.pop_front()
				.expect("Script should cover every request.");
			let mut builder = Response::builder().status(status);

			if let Some(value) = retry_after {
				builder = builder.header("retry-after", value);
			}

			builder.body(body.as_bytes().to_vec())
		};
		let response: HttpResponse = response.expect("Scripted response should build.");

		Box::pin(async move {
			tokio::task::yield_now().await;

			Ok(response)
		})
	}
}

fn scripted_config() -> ScoutConfig {
	config("https://auth.example.com/api/v1/access_token", "https://api.example.com")
}

#[tokio::test]
async fn throttle_once_then_success_waits_exactly_the_hint() {
	let (transport, clock) = build_with(
		&scripted_config(),
		ScriptedTransport::new([(429, Some("7"), "slow down"), (200, None, "done")]),
	);
	let body = transport
		.request(&url("https://api.example.com/r/webdev/search"))
		.await
		.expect("Request should succeed after the throttle window.");

	assert_eq!(body, b"done");
	assert_eq!(clock.sleeps(), vec![Duration::seconds(7)]);
	assert_eq!(transport.exchange_metrics.exchanges(), 1);
}

#[tokio::test]
async fn throttle_without_hint_uses_fallback() {
	let config = scripted_config().with_throttle_fallback(Duration::seconds(30));
	let (transport, clock) =
		build_with(&config, ScriptedTransport::new([(429, None, ""), (200, None, "done")]));

	transport
		.request(&url("https://api.example.com/r/webdev/search"))
		.await
		.expect("Request should succeed after the fallback wait.");

	assert_eq!(clock.sleeps(), vec![Duration::seconds(30)]);
}

#[tokio::test]
async fn unauthorized_response_forces_reauthentication() {
	let http = Arc::new(ScriptedTransport::new([(401, None, "expired"), (200, None, "done")]));
	let config = scripted_config();
	let clock = Arc::new(ManualClock::default());
	let limiter = Arc::new(RateLimiter::with_clock(config.rate_limit.clone(), clock.clone()));
	let transport: AuthenticatedTransport<ScriptedTransport> =
		AuthenticatedTransport::with_http_client(&config, http.clone(), limiter)
			.expect("Transport should build.");
	let body = transport
		.request(&url("https://api.example.com/r/webdev/search"))
		.await
		.expect("Request should succeed after re-authenticating.");

	assert_eq!(body, b"done");
	assert_eq!(http.exchanges.load(Ordering::SeqCst), 2);
	assert_eq!(
		*http.bearer_seen.lock().expect("Bearer log should lock."),
		["Bearer tok-1", "Bearer tok-2"]
	);
	assert_eq!(clock.sleeps(), vec![Duration::seconds(1)]);
}

#[tokio::test]
async fn throttled_token_exchange_without_hint_waits_the_fallback() {
	let http = Arc::new(
		ScriptedTransport::new([(200, None, "done")]).with_token_failures([(429, None)]),
	);
	let config = scripted_config();
	let clock = Arc::new(ManualClock::default());
	let limiter = Arc::new(RateLimiter::with_clock(config.rate_limit.clone(), clock.clone()));
	let transport: AuthenticatedTransport<ScriptedTransport> =
		AuthenticatedTransport::with_http_client(&config, http.clone(), limiter)
			.expect("Transport should build.");
	let body = transport
		.request(&url("https://api.example.com/r/webdev/search"))
		.await
		.expect("Request should succeed once the token endpoint recovers.");

	assert_eq!(body, b"done");
	assert_eq!(clock.sleeps(), vec![Duration::seconds(60)]);
	assert_eq!(http.exchanges.load(Ordering::SeqCst), 1);
	assert_eq!(transport.exchange_metrics.failures(), 1);
	assert_eq!(transport.exchange_metrics.exchanges(), 1);
}

#[tokio::test]
async fn concurrent_requests_share_one_exchange() {
	let http = Arc::new(ScriptedTransport::new([(200, None, "first"), (200, None, "second")]));
	let config = scripted_config();
	let clock = Arc::new(ManualClock::default());
	let limiter = Arc::new(RateLimiter::with_clock(config.rate_limit.clone(), clock));
	let transport: AuthenticatedTransport<ScriptedTransport> =
		AuthenticatedTransport::with_http_client(&config, http.clone(), limiter)
			.expect("Transport should build.");
	let first = url("https://api.example.com/r/webdev/search");
	let second = url("https://api.example.com/r/SaaS/search");
	let (a, b) = tokio::join!(transport.request(&first), transport.request(&second));

	a.expect("First concurrent request should succeed.");
	b.expect("Second concurrent request should succeed.");

	assert_eq!(transport.exchange_metrics.exchanges(), 1);
	assert_eq!(transport.exchange_metrics.reuses(), 1);
	assert_eq!(http.exchanges.load(Ordering::SeqCst), 1);
	assert_eq!(
		*http.bearer_seen.lock().expect("Bearer log should lock."),
		["Bearer tok-1", "Bearer tok-1"]
	);
}
