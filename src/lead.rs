//! Post and lead records plus the keyword taxonomy used to tag them.

// self
use crate::_prelude::*;

const PROFILE_BASE: &str = "https://www.reddit.com/user/";

/// Post as returned by the search API, reduced to the public fields the scout reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
	/// Upstream post identifier (without the `t3_` kind prefix).
	pub id: String,
	/// Subreddit the post belongs to.
	pub channel: String,
	/// Post title.
	pub title: String,
	/// Self-text body; empty for link posts.
	pub body: String,
	/// Author username.
	pub author: String,
	/// Fully qualified post URL.
	pub permalink: String,
	/// Upstream creation instant.
	pub created_at: OffsetDateTime,
	/// Net vote score.
	pub score: i64,
	/// Comment count at fetch time.
	pub num_comments: u64,
}

/// Normalized, immutable candidate handed to the review step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
	/// Internal identifier: `"{source}_{post id}"`.
	pub id: String,
	/// Source tag.
	pub source: String,
	/// Post title.
	pub title: String,
	/// Post body.
	pub content: String,
	/// Author username.
	pub author: String,
	/// Link to the author's public profile.
	pub author_profile_url: String,
	/// Link to the post.
	pub url: String,
	/// Subreddit the post belongs to.
	pub channel: String,
	/// Every taxonomy keyword found in the title or content, first match first.
	pub matched_keywords: Vec<String>,
	/// When the scout produced this lead.
	pub collected_at: OffsetDateTime,
	/// When the post was created upstream.
	pub source_created_at: OffsetDateTime,
	/// Net vote score.
	pub score: i64,
	/// Comment count at fetch time.
	pub num_comments: u64,
}
impl Lead {
	/// Source tag for posts collected from Reddit.
	pub const SOURCE: &'static str = "reddit";

	/// Normalizes `post`, tagging it with every keyword of `taxonomy` that it mentions.
	pub fn from_post(
		post: &RawPost,
		taxonomy: &KeywordTaxonomy,
		collected_at: OffsetDateTime,
	) -> Self {
		let matched_keywords = taxonomy.matches(&format!("{} {}", post.title, post.body));

		Self {
			id: format!("{}_{}", Self::SOURCE, post.id),
			source: Self::SOURCE.into(),
			title: post.title.clone(),
			content: post.body.clone(),
			author: post.author.clone(),
			author_profile_url: format!("{PROFILE_BASE}{}", post.author),
			url: post.permalink.clone(),
			channel: post.channel.clone(),
			matched_keywords,
			collected_at,
			source_created_at: post.created_at,
			score: post.score,
			num_comments: post.num_comments,
		}
	}

	/// Title and content joined by a single space.
	pub fn text(&self) -> String {
		format!("{} {}", self.title, self.content)
	}
}

/// Keywords searched for one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
	/// Product the keywords belong to.
	pub product: String,
	/// Search phrases, in priority order.
	pub keywords: Vec<String>,
}

/// Ordered set of product keyword groups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordTaxonomy {
	groups: Vec<KeywordGroup>,
}
impl KeywordTaxonomy {
	/// Creates a taxonomy from pre-built groups.
	pub fn new(groups: Vec<KeywordGroup>) -> Self {
		Self { groups }
	}

	/// Appends a product group.
	pub fn with_group<I, S>(mut self, product: impl Into<String>, keywords: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.groups.push(KeywordGroup {
			product: product.into(),
			keywords: keywords.into_iter().map(Into::into).collect(),
		});

		self
	}

	/// Product groups in declaration order.
	pub fn groups(&self) -> &[KeywordGroup] {
		&self.groups
	}

	/// Every keyword across all groups, in declaration order, without blanks or repeats.
	///
	/// Repeats are detected case-insensitively; the first spelling wins.
	pub fn keywords(&self) -> Vec<&str> {
		let mut seen = HashSet::new();

		self.groups
			.iter()
			.flat_map(|group| group.keywords.iter())
			.map(|keyword| keyword.trim())
			.filter(|keyword| !keyword.is_empty() && seen.insert(keyword.to_lowercase()))
			.collect()
	}

	/// Keywords of the whole taxonomy that occur in `text`, compared case-insensitively.
	pub fn matches(&self, text: &str) -> Vec<String> {
		let haystack = text.to_lowercase();

		self.keywords()
			.into_iter()
			.filter(|keyword| haystack.contains(&keyword.to_lowercase()))
			.map(ToOwned::to_owned)
			.collect()
	}
}
