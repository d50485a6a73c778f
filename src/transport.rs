//! Authenticated API transport with a single cached OAuth session.
//!
//! [`AuthenticatedTransport`] owns the only copy of the bearer token. Every request runs
//! through the shared [`RetryingExecutor`], and each attempt first makes sure the session is
//! still outside the refresh safety margin. Concurrent refreshes collapse into one exchange
//! because the session slot is an async mutex held for the duration of the exchange.

mod metrics;

pub use metrics::ExchangeMetrics;

// crates.io
use oauth2::http::{
	HeaderValue, Method, Request,
	header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	auth::{OAuthSession, Secret},
	clock::Clock,
	config::ScoutConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{self, HttpTransport},
	oauth::CredentialExchange,
	obs::{self, RequestOutcome, Stage, StageSpan},
	rate_limit::RateLimiter,
	retry::{RetryObserver, RetryingExecutor},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Transport specialized for the crate's default reqwest stack.
#[cfg(feature = "reqwest")]
pub type ReqwestTransport = AuthenticatedTransport<ReqwestHttpClient>;

/// Issues authenticated GET requests against the configured API base.
pub struct AuthenticatedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	/// Shared counters for credential exchanges.
	pub exchange_metrics: Arc<ExchangeMetrics>,
	http: Arc<T>,
	exchange: CredentialExchange<T>,
	user_agent: HeaderValue,
	api_base: Url,
	executor: RetryingExecutor,
	session: AsyncMutex<Option<OAuthSession>>,
	clock: Arc<dyn Clock>,
	safety_margin: Duration,
}
impl<T> AuthenticatedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a transport over `http`, pacing every attempt through `limiter`.
	///
	/// The limiter's clock drives token expiry checks as well as every wait.
	pub fn with_http_client(
		config: &ScoutConfig,
		http: impl Into<Arc<T>>,
		limiter: Arc<RateLimiter>,
	) -> Result<Self> {
		let http = http.into();
		let clock = limiter.clock().clone();
		let exchange = CredentialExchange::new(
			&config.credentials,
			&config.endpoints,
			http.clone(),
			clock.clone(),
		)?;
		let user_agent = HeaderValue::from_str(&config.credentials.user_agent)
			.map_err(|_| ConfigError::InvalidUserAgent)?;

		Ok(Self {
			exchange_metrics: Default::default(),
			http,
			exchange,
			user_agent,
			api_base: config.endpoints.api_base.clone(),
			executor: RetryingExecutor::new(limiter),
			session: AsyncMutex::new(None),
			clock,
			safety_margin: config.token_safety_margin,
		})
	}

	/// Replaces the observer notified at every retry boundary.
	pub fn with_retry_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
		self.executor = self.executor.with_observer(observer);

		self
	}

	/// Base URL that search paths are joined onto.
	pub fn api_base(&self) -> &Url {
		&self.api_base
	}

	/// Shared limiter pacing this transport.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		self.executor.limiter()
	}

	/// Returns a usable access token, exchanging credentials when the cached session is
	/// missing or inside the safety margin.
	pub async fn ensure_authenticated(&self) -> Result<Secret> {
		let mut session = self.session.lock().await;
		let now = self.clock.now();

		if let Some(current) =
			session.as_ref().filter(|current| current.is_fresh_at(now, self.safety_margin))
		{
			self.exchange_metrics.record_reuse();

			return Ok(current.access_token.clone());
		}

		let span = StageSpan::new(Stage::CredentialExchange, "client_credentials");
		let fresh = match span.instrument(self.exchange.exchange()).await {
			Ok(fresh) => fresh,
			Err(e) => {
				self.exchange_metrics.record_failure();
				obs::record_stage_outcome(Stage::CredentialExchange, RequestOutcome::Failure);

				return Err(e);
			},
		};

		self.exchange_metrics.record_exchange();
		obs::record_stage_outcome(Stage::CredentialExchange, RequestOutcome::Success);
		obs::log_credential_exchange(fresh.expires_at);

		let token = fresh.access_token.clone();

		*session = Some(fresh);

		Ok(token)
	}

	/// Drops the cached session so the next request re-authenticates.
	pub async fn invalidate(&self) {
		self.session.lock().await.take();
	}

	/// Executes an authenticated GET for `url` and returns the raw response body.
	///
	/// Throttling, transient failures, and re-authentication are handled by the shared
	/// executor; only fatal errors or exhausted retry budgets reach the caller.
	pub async fn request(&self, url: &Url) -> Result<Vec<u8>> {
		self.executor
			.run(|| async { self.send_once(url).await.map_err(Error::into_task_failure) })
			.await
	}

	async fn send_once(&self, url: &Url) -> Result<Vec<u8>> {
		let token = self.ensure_authenticated().await?;
		let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
			.map_err(|_| TransientError::TokenEndpoint {
				message: "Access token is not a valid header value".into(),
				status: None,
			})?;

		bearer.set_sensitive(true);

		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, bearer)
			.header(USER_AGENT, self.user_agent.clone())
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = self.http.execute(request).await.map_err(TransportError::network)?;
		let status = response.status();

		if status.is_success() {
			return Ok(response.into_body());
		}

		match status.as_u16() {
			429 => Err(Error::Throttled {
				retry_after: http::parse_retry_after(response.headers(), self.clock.now()),
			}),
			code => {
				if code == 401 {
					self.invalidate().await;
				}

				Err(TransientError::Status {
					status: code,
					body_preview: http::body_preview(response.body()),
				}
				.into())
			},
		}
	}
}
#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl AuthenticatedTransport<ReqwestHttpClient> {
	/// Creates a transport backed by reqwest and a private tokio-driven limiter.
	///
	/// Redirects are disabled so bearer tokens are never forwarded to another host.
	pub fn new(config: &ScoutConfig) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;
		let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

		Self::with_http_client(config, ReqwestHttpClient::with_client(client), limiter)
	}
}
impl<T> Debug for AuthenticatedTransport<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedTransport")
			.field("api_base", &self.api_base.as_str())
			.field("executor", &self.executor)
			.field("safety_margin", &self.safety_margin)
			.finish()
	}
}
