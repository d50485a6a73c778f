//! Validated subreddit names.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const CHANNEL_MAX_LEN: usize = 21;

/// Error returned when a channel name fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ChannelError {
	/// The name was empty after stripping an `r/` prefix.
	#[error("Channel name cannot be empty.")]
	Empty,
	/// The name exceeded the allowed character count.
	#[error("Channel `{name}` exceeds {max} characters.")]
	TooLong {
		/// Offending name.
		name: String,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The name contains characters outside `[A-Za-z0-9_]`.
	#[error("Channel `{name}` may only contain ASCII letters, digits, and underscores.")]
	InvalidCharacter {
		/// Offending name.
		name: String,
	},
}

/// Subreddit name without the `r/` prefix.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel(String);
impl Channel {
	/// Creates a channel after stripping an optional `r/` prefix and validating the rest.
	pub fn new(value: impl AsRef<str>) -> Result<Self, ChannelError> {
		let view = value.as_ref().trim();
		let view = view.strip_prefix("r/").unwrap_or(view);

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Parses a list of names, failing on the first invalid entry.
	pub fn parse_list<I, S>(values: I) -> Result<Vec<Self>, ChannelError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		values.into_iter().map(Self::new).collect()
	}
}
impl Deref for Channel {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Channel {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Channel {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Channel> for String {
	fn from(value: Channel) -> Self {
		value.0
	}
}
impl TryFrom<String> for Channel {
	type Error = ChannelError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl FromStr for Channel {
	type Err = ChannelError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Channel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Channel(r/{})", self.0)
	}
}
impl Display for Channel {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), ChannelError> {
	if view.is_empty() {
		return Err(ChannelError::Empty);
	}
	if view.chars().count() > CHANNEL_MAX_LEN {
		return Err(ChannelError::TooLong { name: view.to_owned(), max: CHANNEL_MAX_LEN });
	}
	if !view.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return Err(ChannelError::InvalidCharacter { name: view.to_owned() });
	}

	Ok(())
}
