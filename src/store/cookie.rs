//! Cookie attribute profiles applied to stored credentials.

// self
use crate::_prelude::*;

/// `SameSite` policy attached to a stored credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SameSite {
	/// Only sent on same-site requests.
	Strict,
	/// Sent on same-site requests and top-level navigations.
	Lax,
	/// Sent on cross-site requests; requires `Secure`.
	#[default]
	None,
}

/// Expiry and transport attributes shared by both token entries.
///
/// The default profile is cross-site usable (`SameSite=None`), secure-only, and expires
/// 360 days after each write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieAttributes {
	/// Cross-site policy.
	pub same_site: SameSite,
	/// Restricts the value to secure transports.
	pub secure: bool,
	/// Lifetime from the moment of writing; `None` scopes the value to the session.
	pub expires: Option<Duration>,
}
impl CookieAttributes {
	/// Lifetime applied by the default profile.
	pub const DEFAULT_EXPIRY: Duration = Duration::days(360);

	/// Session-scoped profile without an expiry window.
	pub const fn session() -> Self {
		Self { same_site: SameSite::None, secure: true, expires: None }
	}

	/// Overrides the `SameSite` policy.
	pub fn with_same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = same_site;

		self
	}

	/// Overrides the secure-only flag.
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;

		self
	}

	/// Overrides the lifetime; negative durations clamp to zero.
	pub fn with_expires(mut self, expires: Option<Duration>) -> Self {
		self.expires = expires.map(|window| if window.is_negative() { Duration::ZERO } else { window });

		self
	}

	/// Absolute expiry for a value written at `now`.
	///
	/// A window that overflows the representable calendar leaves the value without an expiry.
	pub fn expires_at(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires.and_then(|window| now.checked_add(window))
	}

	/// Returns `true` when the window is non-negative and representable from `now`.
	pub fn is_window_valid_at(&self, now: OffsetDateTime) -> bool {
		match self.expires {
			Some(window) => !window.is_negative() && now.checked_add(window).is_some(),
			None => true,
		}
	}
}
impl Default for CookieAttributes {
	fn default() -> Self {
		Self { same_site: SameSite::None, secure: true, expires: Some(Self::DEFAULT_EXPIRY) }
	}
}
