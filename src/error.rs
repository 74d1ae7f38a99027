//! Crate-level error types shared across links, stores, and the refresh client.

// self
use crate::{_prelude::*, auth::ClaimsError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Stored access token could not be decoded.
	#[error(transparent)]
	Claims(#[from] ClaimsError),

	/// Server answered with a GraphQL `errors` array.
	#[error("Server rejected the operation: {reason}.")]
	Rejected {
		/// Joined GraphQL error messages.
		reason: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// API endpoint uses a scheme other than HTTP(S).
	#[error("The API endpoint must use HTTP or HTTPS: {url}.")]
	InvalidEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Cookie lifetime is negative or overflows the calendar.
	#[error("Cookie expiry window is out of range: {seconds} seconds.")]
	InvalidCookieExpiry {
		/// Rejected window in whole seconds.
		seconds: i64,
	},
	/// Configuration document could not be parsed.
	#[error("Client configuration is invalid.")]
	InvalidConfig {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// GraphQL request body could not be encoded.
	#[error("GraphQL request could not be encoded.")]
	RequestEncode(#[source] serde_json::Error),
	/// No transport was supplied and the reqwest feature is disabled.
	#[error("No GraphQL transport is configured.")]
	MissingTransport,
	/// Link chain ran out of links before a terminating link answered.
	#[error("Link chain ended without a terminating link.")]
	UnterminatedChain,
	/// Background refresh needs a Tokio runtime.
	#[error("No Tokio runtime is available to run the background refresh.")]
	MissingRuntime,
	/// Credential store holds no refresh token.
	#[error("Credential store is missing a refresh token.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Endpoint returned a throttling or server-side status.
	#[error("GraphQL endpoint returned an unexpected response: {message}.")]
	Upstream {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Endpoint responded with malformed JSON.
	#[error("GraphQL endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response parsed but lacked the expected payload.
	#[error("GraphQL response is missing the `{field}` payload.")]
	MissingPayload {
		/// Name of the absent field.
		field: &'static str,
	},
	/// Background refresh ended without reporting an outcome.
	#[error("Background refresh ended before reporting an outcome.")]
	RefreshAborted,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the GraphQL endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
