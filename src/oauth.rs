//! Client-credentials exchange built on the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
	http::HeaderValue,
};
// self
use crate::{
	_prelude::*,
	auth::OAuthSession,
	clock::Clock,
	config::{ApiEndpoints, Credentials},
	error::{ConfigError, TransientError, TransportError},
	http::{ExchangeHandle, HttpTransport, ResponseMetadata, ResponseMetadataSlot},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Exchanges static client credentials for bearer tokens over HTTP Basic auth.
pub struct CredentialExchange<T>
where
	T: ?Sized + HttpTransport,
{
	oauth_client: ConfiguredBasicClient,
	transport: Arc<T>,
	user_agent: HeaderValue,
	clock: Arc<dyn Clock>,
}
impl<T> CredentialExchange<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds the exchange for `credentials` against `endpoints.token`.
	pub fn new(
		credentials: &Credentials,
		endpoints: &ApiEndpoints,
		transport: Arc<T>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(endpoints.token.to_string()).map_err(|_| {
			ConfigError::InvalidEndpoint { endpoint: "token", url: endpoints.token.to_string() }
		})?;
		let user_agent = HeaderValue::from_str(&credentials.user_agent)
			.map_err(|_| ConfigError::InvalidUserAgent)?;
		let oauth_client = BasicClient::new(ClientId::new(credentials.client_id.clone()))
			.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		Ok(Self { oauth_client, transport, user_agent, clock })
	}

	/// Performs one `grant_type=client_credentials` exchange.
	pub async fn exchange(&self) -> Result<OAuthSession> {
		let meta = ResponseMetadataSlot::default();
		let handle = ExchangeHandle::new(
			self.transport.clone(),
			meta.clone(),
			self.user_agent.clone(),
			self.clock.clone(),
		);
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;
		let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
		let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		if expires_in <= 0 {
			return Err(ConfigError::NonPositiveExpiresIn.into());
		}

		OAuthSession::new(
			response.access_token().secret().to_owned(),
			self.clock.now(),
			Duration::seconds(expires_in),
		)
		.ok_or_else(|| ConfigError::ExpiresInOutOfRange.into())
	}
}
impl<T> Debug for CredentialExchange<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialExchange").field("user_agent", &self.user_agent).finish()
	}
}

fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.as_ref().and_then(|value| value.status);

	match status {
		Some(401 | 403) => {
			return Error::Authentication {
				reason: "Token endpoint rejected the client credentials".into(),
				status,
			};
		},
		Some(429) => {
			let retry_after = meta.as_ref().and_then(|value| value.retry_after);

			return Error::Throttled { retry_after };
		},
		_ => {},
	}

	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = match response.error_description() {
				Some(description) => description.clone(),
				None => response.error().as_ref().to_owned(),
			};

			Error::Authentication { reason, status }
		},
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::ResponseParse { source: error, status }.into(),
		RequestTokenError::Other(message) =>
			TransientError::TokenEndpoint { message, status }.into(),
	}
}

fn map_transport_error<E>(status: Option<u16>, err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint { message, status }.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}
