//! Client configuration and refresh behaviour knobs.

// self
use crate::{_prelude::*, error::ConfigError, store::CookieAttributes};

/// How concurrent refreshes triggered by expired tokens are coordinated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
	/// Refresh tasks serialize on a shared guard; a task that finds the pair already rotated
	/// reuses it instead of calling the server.
	#[default]
	Coalesced,
	/// Every expired operation issues its own refresh call; the last response to settle wins.
	Independent,
}

/// Which access token an operation carries when its stored token has expired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiredTokenPolicy {
	/// Forward immediately with the expired token; the refreshed pair serves later operations.
	#[default]
	ForwardStale,
	/// Hold the operation until the refresh settles and send the refreshed token.
	AwaitRefresh,
}

/// What happens to stored credentials when a refresh fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFailurePolicy {
	/// Keep the expired pair; the next expired operation retries the refresh.
	#[default]
	RetainStale,
	/// Remove both entries, leaving later operations unauthenticated.
	ClearCredentials,
}

/// Settings shared by the authenticated and node clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// GraphQL endpoint used for operations and the refresh mutation.
	pub api_url: Url,
	/// Attribute profile applied to both token entries.
	#[serde(default)]
	pub cookie: CookieAttributes,
	/// Refresh coordination mode.
	#[serde(default)]
	pub refresh_mode: RefreshMode,
	/// Token choice for operations carrying an expired token.
	#[serde(default)]
	pub expired_policy: ExpiredTokenPolicy,
	/// Credential handling after a failed refresh.
	#[serde(default)]
	pub failure_policy: RefreshFailurePolicy,
}
impl ClientConfig {
	/// Starts a builder for the provided endpoint.
	pub fn builder(api_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(api_url)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidConfig { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Checks that the endpoint uses HTTP or HTTPS and the cookie window is representable.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.api_url.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint { url: self.api_url.to_string() });
		}
		if !self.cookie.is_window_valid_at(OffsetDateTime::now_utc()) {
			let seconds = self.cookie.expires.map(|window| window.whole_seconds()).unwrap_or_default();

			return Err(ConfigError::InvalidCookieExpiry { seconds });
		}

		Ok(())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	api_url: Url,
	cookie: CookieAttributes,
	refresh_mode: RefreshMode,
	expired_policy: ExpiredTokenPolicy,
	failure_policy: RefreshFailurePolicy,
}
impl ClientConfigBuilder {
	fn new(api_url: Url) -> Self {
		Self {
			api_url,
			cookie: CookieAttributes::default(),
			refresh_mode: RefreshMode::default(),
			expired_policy: ExpiredTokenPolicy::default(),
			failure_policy: RefreshFailurePolicy::default(),
		}
	}

	/// Overrides the cookie attribute profile.
	pub fn cookie(mut self, cookie: CookieAttributes) -> Self {
		self.cookie = cookie;

		self
	}

	/// Overrides the refresh coordination mode.
	pub fn refresh_mode(mut self, mode: RefreshMode) -> Self {
		self.refresh_mode = mode;

		self
	}

	/// Overrides the expired-token policy.
	pub fn expired_policy(mut self, policy: ExpiredTokenPolicy) -> Self {
		self.expired_policy = policy;

		self
	}

	/// Overrides the refresh failure policy.
	pub fn failure_policy(mut self, policy: RefreshFailurePolicy) -> Self {
		self.failure_policy = policy;

		self
	}

	/// Validates and produces the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let config = ClientConfig {
			api_url: self.api_url,
			cookie: self.cookie,
			refresh_mode: self.refresh_mode,
			expired_policy: self.expired_policy,
			failure_policy: self.failure_policy,
		};

		config.validate()?;

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_forward_stale_and_retain_credentials() {
		let config = ClientConfig::builder(
			Url::parse("https://api.example.com/graphql").expect("Fixture URL should parse."),
		)
		.build()
		.expect("HTTPS endpoint should validate.");

		assert_eq!(config.refresh_mode, RefreshMode::Coalesced);
		assert_eq!(config.expired_policy, ExpiredTokenPolicy::ForwardStale);
		assert_eq!(config.failure_policy, RefreshFailurePolicy::RetainStale);
		assert_eq!(config.cookie, CookieAttributes::default());
	}

	#[test]
	fn non_http_endpoints_are_rejected() {
		let err = ClientConfig::builder(
			Url::parse("ws://api.example.com/graphql").expect("Fixture URL should parse."),
		)
		.build()
		.expect_err("WebSocket endpoints should be rejected.");

		assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
	}

	#[test]
	fn json_documents_fill_defaults_and_report_paths() {
		let config = ClientConfig::from_json(
			r#"{"api_url":"http://localhost:4000/graphql","refresh_mode":"independent"}"#,
		)
		.expect("Minimal document should parse.");

		assert_eq!(config.refresh_mode, RefreshMode::Independent);
		assert_eq!(config.failure_policy, RefreshFailurePolicy::RetainStale);

		let err = ClientConfig::from_json(
			r#"{"api_url":"http://localhost:4000/graphql","failure_policy":"logout"}"#,
		)
		.expect_err("Unknown policy should be rejected.");

		assert!(
			matches!(&err, ConfigError::InvalidConfig { source } if source.path().to_string() == "failure_policy")
		);
	}

	#[test]
	fn unrepresentable_cookie_windows_are_rejected() {
		let err = ClientConfig::from_json(
			r#"{"api_url":"https://api.example/graphql","cookie":{"expires":[9223372036854775807,0]}}"#,
		)
		.expect_err("Overflowing cookie window should be rejected.");

		assert!(matches!(err, ConfigError::InvalidCookieExpiry { seconds: i64::MAX }));

		let err = ClientConfig::builder(
			Url::parse("https://api.example/graphql").expect("Fixture URL should parse."),
		)
		.cookie(CookieAttributes { expires: Some(Duration::days(-1)), ..Default::default() })
		.build()
		.expect_err("Negative cookie window should be rejected.");

		assert!(matches!(err, ConfigError::InvalidCookieExpiry { seconds: -86_400 }));
	}
}
