//! Scout-level error types shared across the limiter, transport, and collection layers.

// self
use crate::{_prelude::*, retry::TaskFailure};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Credential exchange was rejected by the token endpoint.
	#[error("Credential exchange was rejected: {reason}.")]
	Authentication {
		/// Provider- or scout-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Upstream explicitly signaled rate limiting.
	#[error("Upstream throttled the request.")]
	Throttled {
		/// Wait requested by the upstream service; the limiter's fallback applies when absent.
		retry_after: Option<Duration>,
	},
}
impl Error {
	/// Returns `true` when no further request in the run can succeed.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Config(_) | Self::Authentication { .. })
	}

	/// Classifies the error for the retrying executor.
	pub fn into_task_failure(self) -> TaskFailure<Self> {
		match self {
			Self::Throttled { retry_after } =>
				TaskFailure::Throttled { retry_after, error: Self::Throttled { retry_after } },
			e if e.is_fatal() => TaskFailure::Fatal(e),
			e => TaskFailure::Transient(e),
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required environment variable is absent or blank.
	#[error("Required environment variable `{var}` is missing or empty.")]
	MissingEnv {
		/// Variable name.
		var: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL cannot be parsed or uses an unsupported scheme.
	#[error("Endpoint `{endpoint}` is invalid: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// The configured `User-Agent` is not a valid header value.
	#[error("User-Agent contains characters that are not valid in an HTTP header.")]
	InvalidUserAgent,
	/// A channel name failed validation.
	#[error(transparent)]
	InvalidChannel(#[from] crate::search::ChannelError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream answered with a non-success status.
	#[error("Upstream returned HTTP {status}: {body_preview}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading slice of the response body.
		body_preview: String,
	},
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// A response body could not be decoded.
	#[error("Upstream returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
