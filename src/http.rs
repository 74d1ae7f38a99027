//! Transport primitives for GraphQL operations.
//!
//! The module exposes [`GraphQlTransport`] alongside [`ResponseMetadata`] so downstream crates
//! can plug in custom HTTP stacks (or in-process fakes) without touching the link chain.
//! Implementations post the request body as JSON, attach the operation's headers, and report
//! the HTTP status plus any `Retry-After` hint with the raw response body.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	StatusCode,
	header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransientError, operation::GraphQlRequest};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Boxed future returned by [`GraphQlTransport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of posting GraphQL operations.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by the
/// terminating HTTP link and the background refresh client.
pub trait GraphQlTransport
where
	Self: 'static + Send + Sync,
{
	/// Posts `request` to `endpoint` with the provided extra headers.
	fn send<'a>(
		&'a self,
		endpoint: &'a Url,
		request: &'a GraphQlRequest,
		headers: &'a BTreeMap<String, String>,
	) -> TransportFuture<'a>;
}

/// Metadata captured from the HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// Status and retry hints.
	pub metadata: ResponseMetadata,
	/// Undecoded response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Builds a response with the given status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self {
			metadata: ResponseMetadata { status: Some(status), retry_after: None },
			body: body.into(),
		}
	}

	/// Decodes the body as `T`, reporting the failing JSON path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de).map_err(|source| {
			TransientError::ResponseParse { source, status: self.metadata.status }.into()
		})
	}
}

/// Reqwest-backed transport posting JSON bodies.
///
/// GraphQL endpoints answer directly, so clients built through [`ReqwestTransport::new`] do
/// not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl GraphQlTransport for ReqwestTransport {
	fn send<'a>(
		&'a self,
		endpoint: &'a Url,
		request: &'a GraphQlRequest,
		headers: &'a BTreeMap<String, String>,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			let body = serde_json::to_vec(request).map_err(ConfigError::RequestEncode)?;
			let mut builder =
				self.0.post(endpoint.clone()).header(CONTENT_TYPE, "application/json").body(body);

			for (name, value) in headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status();
			let metadata = ResponseMetadata {
				status: Some(status.as_u16()),
				retry_after: parse_retry_after(response.headers()),
			};

			if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
				return Err(TransientError::Upstream {
					message: format!("HTTP {status}"),
					status: metadata.status,
					retry_after: metadata.retry_after,
				}
				.into());
			}

			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(TransportResponse { metadata, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds_and_dates() {
		let mut headers = HeaderMap::new();

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 +0000"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn json_decoding_reports_status_on_failure() {
		let response = TransportResponse::new(200, b"{\"data\":".to_vec());
		let err = response
			.json::<crate::operation::GraphQlResponse>()
			.expect_err("Truncated JSON should fail to decode.");

		assert!(matches!(
			err,
			Error::Transient(TransientError::ResponseParse { status: Some(200), .. })
		));
	}
}
