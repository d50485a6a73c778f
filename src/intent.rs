//! Pure filters that separate genuine requests for help from chatter.

// self
use crate::{
	_prelude::*,
	lead::{Lead, RawPost},
};

/// Phrases that signal the author is looking for a recommendation or a solution.
pub const INTENT_PHRASES: [&str; 7] = [
	"looking for",
	"recommend",
	"alternative to",
	"best tool for",
	"anyone know",
	"need a",
	"searching for",
];
/// Leading words that mark a post as a question even without a `?`.
pub const QUESTION_OPENERS: [&str; 4] = ["how", "what", "which", "any"];

const MIN_CONTENT_CHARS: usize = 50;
const MIN_TITLE_CHARS: usize = 30;

/// Keeps the first post seen for each id, preserving input order.
pub fn deduplicate(posts: Vec<RawPost>) -> Vec<RawPost> {
	let mut seen = HashSet::new();

	posts.into_iter().filter(|post| seen.insert(post.id.clone())).collect()
}

/// Case-insensitive search for any of [`INTENT_PHRASES`].
pub fn has_intent_keyword(text: &str) -> bool {
	let text = text.to_lowercase();

	INTENT_PHRASES.iter().any(|phrase| text.contains(phrase))
}

/// Returns `true` for text containing `?` or opening with one of [`QUESTION_OPENERS`].
pub fn looks_like_question(text: &str) -> bool {
	if text.contains('?') {
		return true;
	}

	let opening = text.trim().to_lowercase();

	QUESTION_OPENERS.iter().any(|word| opening.starts_with(word))
}

/// Long enough to be worth a human's time.
pub fn has_substance(lead: &Lead) -> bool {
	lead.content.chars().count() > MIN_CONTENT_CHARS
		|| lead.title.chars().count() > MIN_TITLE_CHARS
}

/// Intent (phrase or question) plus substance.
pub fn has_genuine_intent(lead: &Lead) -> bool {
	let text = lead.text();

	(has_intent_keyword(&text) || looks_like_question(&text)) && has_substance(lead)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::lead::KeywordTaxonomy;

	fn post(id: &str, title: &str, body: &str) -> RawPost {
		RawPost {
			id: id.into(),
			channel: "webdev".into(),
			title: title.into(),
			body: body.into(),
			author: "someone".into(),
			permalink: format!("https://www.reddit.com/r/webdev/comments/{id}/"),
			created_at: OffsetDateTime::UNIX_EPOCH,
			score: 0,
			num_comments: 0,
		}
	}

	fn lead(title: &str, body: &str) -> Lead {
		let taxonomy = KeywordTaxonomy::default();

		Lead::from_post(&post("x", title, body), &taxonomy, OffsetDateTime::UNIX_EPOCH)
	}

	#[test]
	fn deduplicate_keeps_first_occurrence_in_order() {
		let posts = vec![
			post("a", "first", ""),
			post("b", "", ""),
			post("a", "second", ""),
			post("c", "", ""),
		];
		let unique = deduplicate(posts);

		assert_eq!(unique.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(), ["a", "b", "c"]);
		assert_eq!(unique[0].title, "first");
		assert!(deduplicate(Vec::new()).is_empty());
	}

	#[test]
	fn intent_keywords_ignore_case() {
		assert!(has_intent_keyword("LOOKING FOR a way to render pages"));
		assert!(has_intent_keyword("Can anyone recommend something?"));
		assert!(!has_intent_keyword("nice tool!"));
	}

	#[test]
	fn questions_are_detected_by_mark_or_opener() {
		assert!(looks_like_question("Is this any good?"));
		assert!(looks_like_question("   How do I capture a full page"));
		assert!(looks_like_question("Which service handles retina"));
		assert!(!looks_like_question("nice tool!"));
	}

	#[test]
	fn substance_uses_strict_thresholds() {
		assert!(!has_substance(&lead(&"t".repeat(30), &"c".repeat(50))));
		assert!(has_substance(&lead(&"t".repeat(31), "")));
		assert!(has_substance(&lead("", &"c".repeat(51))));
	}

	#[test]
	fn genuine_intent_requires_both_signals() {
		let wanted = lead(
			"Looking for a reliable screenshot service",
			"Looking for a screenshot api, any suggestions?",
		);

		assert!(has_genuine_intent(&wanted));
		assert!(!has_genuine_intent(&lead("nice tool!", "")));
		assert!(!has_genuine_intent(&lead("Any tips?", "short")));
	}
}
