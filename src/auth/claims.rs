//! Unverified JWT claims decoding for expiry checks.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors raised while decoding an access token's claims.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimsError {
	/// Token does not contain a payload segment.
	#[error("Access token is not a dot-separated JWT.")]
	MalformedToken,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	InvalidEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Payload decoded but is not a claims object.
	#[error("Access token payload is not a valid claims object: {message}.")]
	InvalidPayload {
		/// Parser message including the failing path.
		message: String,
	},
}

/// Claims read from an access token without verifying its signature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Expiry in seconds since the Unix epoch; a JSON number, so fractional seconds are kept.
	///
	/// Tokens without an `exp` claim never count as expired.
	#[serde(default)]
	pub exp: Option<f64>,
	/// Issued-at in seconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<f64>,
	/// Subject identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
}
impl TokenClaims {
	/// Decodes the payload segment of `token`.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let payload = token
			.split('.')
			.nth(1)
			.filter(|segment| !segment.is_empty())
			.ok_or(ClaimsError::MalformedToken)?;
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(|source| ClaimsError::InvalidEncoding { source })?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|e| ClaimsError::InvalidPayload { message: e.to_string() })
	}

	/// Returns the expiry as an absolute instant, when present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let nanos = self.exp.filter(|exp| exp.is_finite())? * 1e9;

		OffsetDateTime::from_unix_timestamp_nanos(nanos as i128).ok()
	}

	/// Returns `true` once `now`, in milliseconds, reaches `exp * 1000`.
	///
	/// A non-finite `exp` never compares as reached.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		let Some(exp) = self.exp else {
			return false;
		};
		let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as f64;

		now_ms >= exp * 1_000.0
	}

	/// Checks expiry against the current UTC clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE;
	use time::macros;
	// self
	use super::*;

	fn token_with_payload(payload: &str) -> String {
		format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn decodes_exp_and_optional_claims() {
		let claims = TokenClaims::decode(&token_with_payload(r#"{"exp":1735693200,"sub":"0x01"}"#))
			.expect("Well-formed token should decode.");

		assert_eq!(claims.exp, Some(1_735_693_200.0));
		assert_eq!(claims.sub.as_deref(), Some("0x01"));
		assert_eq!(claims.expires_at(), Some(macros::datetime!(2025-01-01 01:00 UTC)));
	}

	#[test]
	fn expiry_boundary_is_inclusive() {
		let claims = TokenClaims { exp: Some(1_735_693_200.0), iat: None, sub: None };

		assert!(!claims.is_expired_at(macros::datetime!(2025-01-01 00:59:59.999 UTC)));
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 01:00:00.001 UTC)));
	}

	#[test]
	fn fractional_exp_compares_in_milliseconds() {
		let claims = TokenClaims::decode(&token_with_payload(r#"{"exp":1735693200.5}"#))
			.expect("Fractional exp should decode.");

		assert_eq!(claims.exp, Some(1_735_693_200.5));
		assert!(!claims.is_expired_at(macros::datetime!(2025-01-01 01:00:00.499 UTC)));
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 01:00:00.5 UTC)));
		assert_eq!(claims.expires_at(), Some(macros::datetime!(2025-01-01 01:00:00.5 UTC)));
	}

	#[test]
	fn missing_exp_never_expires() {
		let claims = TokenClaims::decode(&token_with_payload(r#"{"sub":"anon"}"#))
			.expect("Token without exp should still decode.");

		assert!(!claims.is_expired());
	}

	#[test]
	fn padded_payloads_are_accepted() {
		let padded = format!("h.{}.s", URL_SAFE.encode(r#"{"exp":10}"#));
		let claims = TokenClaims::decode(&padded).expect("Padded payload should decode.");

		assert!(padded.contains('='));
		assert_eq!(claims.exp, Some(10.0));
	}

	#[test]
	fn malformed_tokens_are_rejected() {
		assert_eq!(TokenClaims::decode("opaque-token"), Err(ClaimsError::MalformedToken));
		assert_eq!(TokenClaims::decode("header..sig"), Err(ClaimsError::MalformedToken));
		assert!(matches!(
			TokenClaims::decode("header.!!!.sig"),
			Err(ClaimsError::InvalidEncoding { .. })
		));
		assert!(matches!(
			TokenClaims::decode(&token_with_payload(r#""opaque""#)),
			Err(ClaimsError::InvalidPayload { .. })
		));
	}
}
