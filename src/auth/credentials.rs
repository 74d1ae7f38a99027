//! Access/refresh credential pairs and their lifecycle classification.

// self
use crate::{
	_prelude::*,
	auth::{ClaimsError, TokenClaims, TokenSecret},
};

/// Store entry name holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Store entry name holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Literal left behind when an absent value was stringified before being stored.
pub const UNDEFINED_PLACEHOLDER: &str = "undefined";

/// Lifecycle state of the stored access credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// No usable access token is stored.
	Absent,
	/// Access token is present and not yet expired.
	Valid,
	/// Access token reached its `exp` instant.
	Expired,
}
impl CredentialStatus {
	/// Classifies an optional access token at the provided instant.
	///
	/// Decoding failures surface as [`ClaimsError`]; the token is never treated as absent just
	/// because it cannot be parsed.
	pub fn classify(
		access_token: Option<&TokenSecret>,
		now: OffsetDateTime,
	) -> Result<Self, ClaimsError> {
		let Some(token) = access_token else {
			return Ok(Self::Absent);
		};
		let claims = TokenClaims::decode(token.expose())?;

		Ok(if claims.is_expired_at(now) { Self::Expired } else { Self::Valid })
	}
}

/// Access and refresh tokens issued together by the refresh mutation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// Short-lived bearer credential sent with every operation.
	pub access_token: TokenSecret,
	/// Longer-lived credential exchanged for a new access token.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Decodes the access token's claims without verifying its signature.
	pub fn claims(&self) -> Result<TokenClaims, ClaimsError> {
		TokenClaims::decode(self.access_token.expose())
	}

	/// Returns the pair's lifecycle status at the provided instant.
	pub fn status_at(&self, now: OffsetDateTime) -> Result<CredentialStatus, ClaimsError> {
		CredentialStatus::classify(Some(&self.access_token), now)
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}
