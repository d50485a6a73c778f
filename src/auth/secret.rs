//! Redacting wrapper for bearer tokens and client secrets.

// self
use crate::_prelude::*;

/// Secret string that never prints its contents through `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
