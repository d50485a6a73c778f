//! Scout configuration: credentials, endpoints, pacing, and search defaults.
//!
//! Credentials come from the environment (`REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`,
//! `REDDIT_USER_AGENT`) and are validated before any request is attempted; a missing value is a
//! fatal [`ConfigError`], never a retry condition.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	rate_limit::RateLimitConfig,
	search::SearchOptions,
};

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";
/// Environment variable holding the `User-Agent` sent with every request.
pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";

const DEFAULT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";

/// Static application credentials exchanged for bearer tokens.
#[derive(Clone, Debug)]
pub struct Credentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Secret,
	/// `User-Agent` string identifying the application to the upstream API.
	pub user_agent: String,
}
impl Credentials {
	/// Builds credentials after checking every field is non-blank.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		user_agent: impl Into<String>,
	) -> Result<Self, ConfigError> {
		let credentials = Self {
			client_id: client_id.into(),
			client_secret: Secret::new(client_secret),
			user_agent: user_agent.into(),
		};

		if credentials.client_id.trim().is_empty() {
			return Err(ConfigError::MissingEnv { var: ENV_CLIENT_ID });
		}
		if credentials.client_secret.is_blank() {
			return Err(ConfigError::MissingEnv { var: ENV_CLIENT_SECRET });
		}
		if credentials.user_agent.trim().is_empty() {
			return Err(ConfigError::MissingEnv { var: ENV_USER_AGENT });
		}

		Ok(credentials)
	}

	/// Reads credentials from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads credentials through an arbitrary key lookup (environment, dotenv map, ...).
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let require = |var: &'static str| {
			lookup(var)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::MissingEnv { var })
		};

		Self::new(require(ENV_CLIENT_ID)?, require(ENV_CLIENT_SECRET)?, require(ENV_USER_AGENT)?)
	}
}

/// Upstream endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
	/// OAuth token endpoint used for the client-credentials exchange.
	pub token: Url,
	/// Base URL for authenticated API calls.
	pub api_base: Url,
}
impl ApiEndpoints {
	/// Parses and validates a pair of endpoint URLs.
	pub fn new(token: &str, api_base: &str) -> Result<Self, ConfigError> {
		Ok(Self {
			token: parse_endpoint("token", token)?,
			api_base: parse_endpoint("api_base", api_base)?,
		})
	}
}
impl Default for ApiEndpoints {
	fn default() -> Self {
		Self {
			token: Url::parse(DEFAULT_TOKEN_URL).expect("Default token endpoint is a valid URL."),
			api_base: Url::parse(DEFAULT_API_BASE).expect("Default API base is a valid URL."),
		}
	}
}

/// Complete scout configuration.
#[derive(Clone, Debug)]
pub struct ScoutConfig {
	/// Application credentials.
	pub credentials: Credentials,
	/// Upstream endpoints.
	pub endpoints: ApiEndpoints,
	/// Limiter and retry tuning.
	pub rate_limit: RateLimitConfig,
	/// Tokens are refreshed once they are this close to expiry.
	pub token_safety_margin: Duration,
	/// Default search window and page size.
	pub search: SearchOptions,
}
impl ScoutConfig {
	const DEFAULT_SAFETY_MARGIN: Duration = Duration::minutes(5);

	/// Creates a configuration with default endpoints and tuning.
	pub fn new(credentials: Credentials) -> Self {
		Self {
			credentials,
			endpoints: ApiEndpoints::default(),
			rate_limit: RateLimitConfig::default(),
			token_safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			search: SearchOptions::default(),
		}
	}

	/// Loads credentials from the environment and applies defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		Ok(Self::new(Credentials::from_env()?))
	}

	/// Overrides the upstream endpoints.
	pub fn with_endpoints(mut self, endpoints: ApiEndpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides limiter and retry tuning.
	pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
		self.rate_limit = rate_limit;

		self
	}

	/// Overrides the token refresh safety margin (negative values clamp to zero).
	pub fn with_token_safety_margin(mut self, margin: Duration) -> Self {
		self.token_safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Overrides the fallback wait for throttled responses without a hint.
	///
	/// Sets [`RateLimitConfig::max_throttle_wait`], which covers the token endpoint and the
	/// search API alike.
	pub fn with_throttle_fallback(mut self, wait: Duration) -> Self {
		self.rate_limit.max_throttle_wait = wait;

		self
	}

	/// Overrides the default search options.
	pub fn with_search(mut self, search: SearchOptions) -> Self {
		self.search = search;

		self
	}
}

fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let invalid = || ConfigError::InvalidEndpoint { endpoint: name, url: raw.to_owned() };
	let url = Url::parse(raw).map_err(|_| invalid())?;
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	match url.scheme() {
		"https" => Ok(url),
		"http" if loopback => Ok(url),
		_ => Err(invalid()),
	}
}
