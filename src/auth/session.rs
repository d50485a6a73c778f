//! In-memory OAuth session issued by the client-credentials exchange.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifecycle status of a session relative to an instant and a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
	/// Token is valid beyond the safety margin.
	Fresh,
	/// Token is still valid but inside the safety margin; refresh before use.
	Expiring,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Bearer token plus the instant it stops being valid.
///
/// Sessions only live inside the authenticated transport; they are never persisted.
#[derive(Clone)]
pub struct OAuthSession {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Issued-at instant recorded when the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus `expires_in`.
	pub expires_at: OffsetDateTime,
}
impl OAuthSession {
	/// Creates a session that expires `expires_in` after `issued_at`.
	///
	/// Returns `None` when the expiry instant falls outside the representable range.
	pub fn new(
		access_token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_in: Duration,
	) -> Option<Self> {
		let expires_at = issued_at.checked_add(expires_in)?;

		Some(Self { access_token: Secret::new(access_token), issued_at, expires_at })
	}

	/// Computes the status at `instant` given a refresh `margin`.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> SessionStatus {
		if instant >= self.expires_at {
			return SessionStatus::Expired;
		}
		if instant >= self.expires_at - margin {
			return SessionStatus::Expiring;
		}

		SessionStatus::Fresh
	}

	/// Returns `true` if the session can be used without refreshing.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), SessionStatus::Fresh)
	}
}
impl Debug for OAuthSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthSession")
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
