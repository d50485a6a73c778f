//! Channel-scoped search fan-out.
//!
//! [`SearchAggregator`] issues one request per channel through the authenticated transport
//! and tolerates partial failure: a channel that cannot be searched is reported as a
//! [`ChannelSearchError`] while the remaining channels proceed. Errors that would fail every
//! channel the same way (configuration, rejected credentials) abort the search instead.

mod channel;
mod listing;

pub use channel::*;
pub use listing::decode_listing;

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError},
	http::HttpTransport,
	lead::RawPost,
	obs::{self, RequestOutcome, Stage, StageSpan},
	transport::AuthenticatedTransport,
};

/// Boxed future returned by [`PostSource::search`].
pub type PostSourceFuture<'a> = Pin<Box<dyn Future<Output = Result<SearchOutcome>> + 'a + Send>>;

/// Search window accepted by the API's `t` parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
	/// Past hour.
	Hour,
	/// Past 24 hours.
	#[default]
	Day,
	/// Past week.
	Week,
	/// Past month.
	Month,
}
impl TimeRange {
	/// Query-string value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Hour => "hour",
			Self::Day => "day",
			Self::Week => "week",
			Self::Month => "month",
		}
	}
}
impl Display for TimeRange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Window and page size applied to every channel search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
	/// Recency window.
	pub time_range: TimeRange,
	/// Maximum posts per channel; clamped to the API's 1..=100 range.
	pub limit: u32,
}
impl SearchOptions {
	const MAX_LIMIT: u32 = 100;

	/// Limit actually sent upstream.
	pub fn effective_limit(&self) -> u32 {
		self.limit.clamp(1, Self::MAX_LIMIT)
	}
}
impl Default for SearchOptions {
	fn default() -> Self {
		Self { time_range: TimeRange::Day, limit: 25 }
	}
}

/// A single channel that could not be searched.
#[derive(Debug, ThisError)]
#[error("Search for `{keyword}` in r/{channel} failed.")]
pub struct ChannelSearchError {
	/// Channel that failed.
	pub channel: Channel,
	/// Keyword being searched.
	pub keyword: String,
	/// Underlying failure.
	#[source]
	pub source: Error,
}

/// Posts gathered across channels plus the channels that failed.
#[derive(Debug, Default)]
pub struct SearchOutcome {
	/// Posts in channel order, then upstream order.
	pub posts: Vec<RawPost>,
	/// Channel-local failures, already logged.
	pub failures: Vec<ChannelSearchError>,
}

/// Anything that can answer a keyword search over a set of channels.
pub trait PostSource
where
	Self: 'static + Send + Sync,
{
	/// Searches `channels` for `keyword`.
	///
	/// Implementations absorb channel-local failures into [`SearchOutcome::failures`] and
	/// return `Err` only for failures that make further searching pointless.
	fn search<'a>(
		&'a self,
		keyword: &'a str,
		channels: &'a [Channel],
		options: &'a SearchOptions,
	) -> PostSourceFuture<'a>;
}

/// [`PostSource`] backed by the live search API.
pub struct SearchAggregator<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<AuthenticatedTransport<T>>,
}
impl<T> SearchAggregator<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an aggregator issuing requests through `transport`.
	pub fn new(transport: Arc<AuthenticatedTransport<T>>) -> Self {
		Self { transport }
	}

	/// Transport used for every channel request.
	pub fn transport(&self) -> &Arc<AuthenticatedTransport<T>> {
		&self.transport
	}

	/// Builds `{api_base}/r/{channel}/search?...` for one channel.
	pub fn search_url(
		&self,
		keyword: &str,
		channel: &Channel,
		options: &SearchOptions,
	) -> Result<Url> {
		let base = self.transport.api_base();
		let mut url = base.clone();

		url.path_segments_mut()
			.map_err(|_| ConfigError::InvalidEndpoint {
				endpoint: "api_base",
				url: base.to_string(),
			})?
			.pop_if_empty()
			.extend(["r", channel.as_ref(), "search"]);
		url.query_pairs_mut()
			.append_pair("q", keyword)
			.append_pair("restrict_sr", "true")
			.append_pair("sort", "new")
			.append_pair("t", options.time_range.as_str())
			.append_pair("limit", &options.effective_limit().to_string())
			.append_pair("raw_json", "1");

		Ok(url)
	}

	/// Searches a single channel, propagating every failure.
	pub async fn search_channel(
		&self,
		keyword: &str,
		channel: &Channel,
		options: &SearchOptions,
	) -> Result<Vec<RawPost>> {
		let url = self.search_url(keyword, channel, options)?;
		let body = self.transport.request(&url).await?;

		decode_listing(&body)
			.map_err(|source| TransientError::ResponseParse { source, status: Some(200) }.into())
	}
}
impl<T> PostSource for SearchAggregator<T>
where
	T: ?Sized + HttpTransport,
{
	fn search<'a>(
		&'a self,
		keyword: &'a str,
		channels: &'a [Channel],
		options: &'a SearchOptions,
	) -> PostSourceFuture<'a> {
		let span = StageSpan::new(Stage::Search, keyword);

		Box::pin(span.instrument(async move {
			let mut outcome = SearchOutcome::default();

			for channel in channels {
				match self.search_channel(keyword, channel, options).await {
					Ok(posts) => outcome.posts.extend(posts),
					Err(e) if e.is_fatal() => {
						obs::record_stage_outcome(Stage::Search, RequestOutcome::Failure);

						return Err(e);
					},
					Err(e) => {
						obs::log_channel_failure(channel, keyword, &e);
						outcome.failures.push(ChannelSearchError {
							channel: channel.clone(),
							keyword: keyword.to_owned(),
							source: e,
						});
					},
				}
			}

			obs::record_stage_outcome(Stage::Search, RequestOutcome::Success);

			Ok(outcome)
		}))
	}
}
impl<T> Debug for SearchAggregator<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SearchAggregator").field("transport", &self.transport).finish()
	}
}
