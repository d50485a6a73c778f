//! Runs one live collection pass against Reddit and prints the surviving leads.
//!
//! Requires `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, and `REDDIT_USER_AGENT`. Missing
//! credentials or a rejected exchange end the run with a non-zero exit status.

// crates.io
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
// self
use lead_scout::{
	collect::Collector,
	config::ScoutConfig,
	lead::KeywordTaxonomy,
	search::{Channel, SearchOptions, TimeRange},
};

const CHANNELS: [&str; 5] = ["webdev", "SaaS", "startups", "selfhosted", "node"];

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lead_scout=info"));

	tracing_subscriber::registry().with(filter).with(fmt::layer().compact()).init();

	let taxonomy = KeywordTaxonomy::default()
		.with_group("snapshot", ["screenshot api", "website screenshot", "url to image"])
		.with_group("pdfgen", ["html to pdf", "pdf generation api"]);
	let config = ScoutConfig::from_env()?
		.with_search(SearchOptions { time_range: TimeRange::Day, limit: 25 });
	let collector = Collector::from_config(&config, taxonomy, Channel::parse_list(CHANNELS)?)?;
	let report = collector.collect().await?;

	for lead in &report.leads {
		println!("[r/{}] {} ({})", lead.channel, lead.title, lead.url);
		println!("    matched: {}", lead.matched_keywords.join(", "));
	}
	for failure in &report.failures {
		eprintln!("Skipped r/{} for `{}`: {}.", failure.channel, failure.keyword, failure.source);
	}

	println!(
		"{} leads from {} unique posts ({} fetched, {} channel failures).",
		report.stats.leads,
		report.stats.unique,
		report.stats.fetched,
		report.stats.channel_failures,
	);

	Ok(())
}
