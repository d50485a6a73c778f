//! Decoding of search listings into [`RawPost`] values.

// crates.io
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, lead::RawPost};

const WEB_BASE: &str = "https://www.reddit.com";

#[derive(Deserialize)]
struct Listing {
	data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
	#[serde(default)]
	children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
	data: PostData,
}

#[derive(Deserialize)]
struct PostData {
	id: String,
	subreddit: String,
	title: String,
	#[serde(default)]
	selftext: String,
	author: String,
	permalink: String,
	#[serde(deserialize_with = "unix_seconds")]
	created_utc: OffsetDateTime,
	#[serde(default)]
	score: i64,
	#[serde(default)]
	num_comments: u64,
}
impl From<PostData> for RawPost {
	fn from(data: PostData) -> Self {
		Self {
			id: data.id,
			channel: data.subreddit,
			title: data.title,
			body: data.selftext,
			author: data.author,
			permalink: absolute_permalink(&data.permalink),
			created_at: data.created_utc,
			score: data.score,
			num_comments: data.num_comments,
		}
	}
}

/// Decodes a search listing body, reporting the JSON path of the first mismatch.
pub fn decode_listing(
	body: &[u8],
) -> Result<Vec<RawPost>, serde_path_to_error::Error<serde_json::Error>> {
	let de = &mut serde_json::Deserializer::from_slice(body);
	let listing: Listing = serde_path_to_error::deserialize(de)?;

	Ok(listing.data.children.into_iter().map(|child| child.data.into()).collect())
}

fn absolute_permalink(permalink: &str) -> String {
	if permalink.starts_with("https://") || permalink.starts_with("http://") {
		permalink.to_owned()
	} else {
		format!("{WEB_BASE}{permalink}")
	}
}

fn unix_seconds<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let secs = f64::deserialize(deserializer)?;

	if !secs.is_finite() {
		return Err(DeError::custom("timestamp must be a finite number"));
	}

	OffsetDateTime::from_unix_timestamp(secs.trunc() as i64).map_err(DeError::custom)
}
