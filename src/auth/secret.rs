//! Redacted token secret wrapper and stored-value normalization.

// self
use crate::{_prelude::*, auth::UNDEFINED_PLACEHOLDER};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Normalizes a raw stored value.
	///
	/// Absent values, empty strings, and the literal `"undefined"` placeholder all collapse to
	/// `None`.
	pub fn from_stored(value: Option<String>) -> Option<Self> {
		value.filter(|raw| !raw.is_empty() && raw != UNDEFINED_PLACEHOLDER).map(Self)
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the secret as a `Bearer` credential for the access-token header.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer(), "Bearer super-secret");
	}

	#[test]
	fn stored_placeholders_collapse_to_none() {
		assert_eq!(TokenSecret::from_stored(None), None);
		assert_eq!(TokenSecret::from_stored(Some(String::new())), None);
		assert_eq!(TokenSecret::from_stored(Some("undefined".into())), None);
		assert_eq!(
			TokenSecret::from_stored(Some("Undefined".into())),
			Some(TokenSecret::new("Undefined"))
		);
	}
}
