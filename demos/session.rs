//! Demonstrates a session whose access token has expired: the first query goes out with the
//! stale token while the refresh mutation rotates the stored pair in the background, and the
//! next query carries the renewed token.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use graphql_auth_link::{
	auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
	client::Client,
	config::ClientConfig,
	operation::{ACCESS_TOKEN_HEADER, GraphQlRequest},
	store::{CredentialStore, MemoryStore},
};

fn unsigned_jwt(exp: OffsetDateTime) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"demo","exp":{}}}"#, exp.unix_timestamp()));

	format!("{header}.{payload}.demo")
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let stale = unsigned_jwt(OffsetDateTime::now_utc() - Duration::minutes(5));
	let renewed = unsigned_jwt(OffsetDateTime::now_utc() + Duration::minutes(30));
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql").body_includes("\"operationName\":\"Refresh\"");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"data": { "refresh": { "accessToken": renewed, "refreshToken": "demo-refresh-2" } }
				})
				.to_string(),
			);
		})
		.await;
	let profile_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql").header_exists(ACCESS_TOKEN_HEADER);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"profile":{"id":"0x01","handle":"demo.lens"}}}"#);
		})
		.await;
	let config = ClientConfig::builder(Url::parse(&server.url("/graphql"))?).build()?;
	let store = Arc::new(MemoryStore::default());

	store.set(ACCESS_TOKEN_KEY, &stale, &config.cookie)?;
	store.set(REFRESH_TOKEN_KEY, "demo-refresh-1", &config.cookie)?;

	let client = Client::builder(config).with_store(store.clone()).build()?;
	let request = GraphQlRequest::new("query Profile { profile { id handle } }");
	let first = client.query(request.clone()).await?;

	println!("First response (stale token): {first}");

	let metrics = client.refresh_metrics().cloned().unwrap_or_default();

	while metrics.successes() + metrics.failures() == 0 {
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
	}

	let second = client.query(request).await?;

	println!("Second response (renewed token): {second}");
	println!(
		"Refresh calls: {}, stored token rotated: {}",
		refresh_mock.calls_async().await,
		store.get(ACCESS_TOKEN_KEY)?.as_deref() == Some(renewed.as_str())
	);
	println!("Profile calls: {}", profile_mock.calls_async().await);

	Ok(())
}
