//! Transport primitives shared by the search requests and the OAuth exchange.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack: implementations execute
//! a fully built [`HttpRequest`] and hand back the raw [`HttpResponse`]. The OAuth exchange runs
//! through [`ExchangeHandle`], an [`AsyncHttpClient`] adapter that stamps the configured
//! `User-Agent` and records [`ResponseMetadata`] in a [`ResponseMetadataSlot`] so token endpoint
//! failures can be classified by status code and retry hint after `oauth2` has consumed the
//! response.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError,
	http::{
		HeaderMap, HeaderValue,
		header::{RETRY_AFTER, USER_AGENT},
	},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, clock::Clock};

pub use oauth2::{HttpRequest, HttpResponse};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

const BODY_PREVIEW_CHARS: usize = 200;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// Implementations must not retry, throttle, or follow authentication challenges on their own;
/// pacing and retries live in [`RetryingExecutor`](crate::retry::RetryingExecutor). Non-success
/// statuses are returned as ordinary responses, and only failures that produced no response at
/// all (DNS, TCP, TLS, body read) surface as `TransportError`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes `request` and returns the raw response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// A fresh slot is created for each credential exchange and read immediately after `oauth2`
/// resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// [`AsyncHttpClient`] adapter that lets `oauth2` drive an [`HttpTransport`].
pub struct ExchangeHandle<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	slot: ResponseMetadataSlot,
	user_agent: HeaderValue,
	clock: Arc<dyn Clock>,
}
impl<T> ExchangeHandle<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps `transport`, recording every response in `slot`.
	pub fn new(
		transport: Arc<T>,
		slot: ResponseMetadataSlot,
		user_agent: HeaderValue,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { transport, slot, user_agent, clock }
	}
}
impl<'c, T> AsyncHttpClient<'c> for ExchangeHandle<T>
where
	T: ?Sized + HttpTransport,
{
	type Error = HttpClientError<T::TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, mut request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();

			if !request.headers().contains_key(USER_AGENT) {
				request.headers_mut().insert(USER_AGENT, self.user_agent.clone());
			}

			let response = self
				.transport
				.execute(request)
				.await
				.map_err(|e| HttpClientError::Reqwest(Box::new(e)))?;

			self.slot.store(ResponseMetadata {
				status: Some(response.status().as_u16()),
				retry_after: parse_retry_after(response.headers(), self.clock.now()),
			});

			Ok(response)
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Reads `Retry-After` as delta-seconds or an RFC 2822 date relative to `now`.
pub fn parse_retry_after(headers: &HeaderMap, now: OffsetDateTime) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Leading, lossily decoded slice of a response body for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect()
}
