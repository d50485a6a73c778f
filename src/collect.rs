//! One collection run: search every keyword, deduplicate, normalize, and keep genuine intent.

// self
use crate::{
	_prelude::*,
	clock::Clock,
	intent,
	lead::{KeywordTaxonomy, Lead},
	obs::{self, RequestOutcome, Stage, StageSpan},
	search::{Channel, ChannelSearchError, PostSource, SearchOptions},
};
#[cfg(all(feature = "reqwest", feature = "tokio"))]
use crate::{config::ScoutConfig, search::SearchAggregator, transport::ReqwestTransport};

/// Counters describing a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
	/// Keywords searched.
	pub keywords: usize,
	/// Posts returned by the source, duplicates included.
	pub fetched: usize,
	/// Posts left after deduplication.
	pub unique: usize,
	/// Leads that passed the intent filter.
	pub leads: usize,
	/// Channel searches that failed and were skipped.
	pub channel_failures: usize,
}

/// Result of [`Collector::collect`].
#[derive(Debug, Default)]
pub struct CollectReport {
	/// Leads ready for review, in first-seen order.
	pub leads: Vec<Lead>,
	/// Run counters.
	pub stats: CollectStats,
	/// Channel searches that failed during the run.
	pub failures: Vec<ChannelSearchError>,
}

/// Composes a [`PostSource`] with the intent filter and deduplicator.
pub struct Collector<S>
where
	S: ?Sized + PostSource,
{
	source: Arc<S>,
	taxonomy: KeywordTaxonomy,
	channels: Vec<Channel>,
	options: SearchOptions,
	clock: Option<Arc<dyn Clock>>,
}
impl<S> Collector<S>
where
	S: ?Sized + PostSource,
{
	/// Creates a collector searching every keyword of `taxonomy` across `channels`.
	pub fn new(source: Arc<S>, taxonomy: KeywordTaxonomy, channels: Vec<Channel>) -> Self {
		Self { source, taxonomy, channels, options: SearchOptions::default(), clock: None }
	}

	/// Overrides the search window and page size.
	pub fn with_options(mut self, options: SearchOptions) -> Self {
		self.options = options;

		self
	}

	/// Stamps `collected_at` from `clock` instead of the system time.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);

		self
	}

	/// Keyword taxonomy driving the run.
	pub fn taxonomy(&self) -> &KeywordTaxonomy {
		&self.taxonomy
	}

	/// Channels searched for every keyword.
	pub fn channels(&self) -> &[Channel] {
		&self.channels
	}

	/// Runs one collection pass.
	///
	/// Channel-local failures are reported in [`CollectReport::failures`]; fatal errors from
	/// the source abort the run.
	pub async fn collect(&self) -> Result<CollectReport> {
		let keywords = self.taxonomy.keywords();
		let span = StageSpan::new(Stage::Collect, &format!("{} keywords", keywords.len()));
		let result: Result<CollectReport> = span
			.instrument(async {
				let mut posts = Vec::new();
				let mut failures = Vec::new();

				for keyword in &keywords {
					let outcome =
						self.source.search(keyword, &self.channels, &self.options).await?;

					posts.extend(outcome.posts);
					failures.extend(outcome.failures);
				}

				let fetched = posts.len();
				let unique = intent::deduplicate(posts);
				let collected_at = self.now();
				let leads = unique
					.iter()
					.map(|post| Lead::from_post(post, &self.taxonomy, collected_at))
					.filter(intent::has_genuine_intent)
					.collect::<Vec<_>>();
				let stats = CollectStats {
					keywords: keywords.len(),
					fetched,
					unique: unique.len(),
					leads: leads.len(),
					channel_failures: failures.len(),
				};

				obs::log_collect_summary(
					stats.keywords,
					stats.fetched,
					stats.unique,
					stats.leads,
					stats.channel_failures,
				);

				Ok(CollectReport { leads, stats, failures })
			})
			.await;
		obs::record_stage_outcome(
			Stage::Collect,
			if result.is_ok() { RequestOutcome::Success } else { RequestOutcome::Failure },
		);

		result
	}

	fn now(&self) -> OffsetDateTime {
		match &self.clock {
			Some(clock) => clock.now(),
			None => OffsetDateTime::now_utc(),
		}
	}
}
#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl Collector<SearchAggregator<crate::http::ReqwestHttpClient>> {
	/// Wires the live reqwest transport, search aggregator, and configured search options.
	pub fn from_config(
		config: &ScoutConfig,
		taxonomy: KeywordTaxonomy,
		channels: Vec<Channel>,
	) -> Result<Self> {
		let transport = Arc::new(ReqwestTransport::new(config)?);

		Ok(Self::new(Arc::new(SearchAggregator::new(transport)), taxonomy, channels)
			.with_options(config.search.clone()))
	}
}
impl<S> Debug for Collector<S>
where
	S: ?Sized + PostSource,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Collector")
			.field("taxonomy", &self.taxonomy)
			.field("channels", &self.channels)
			.field("options", &self.options)
			.finish()
	}
}
