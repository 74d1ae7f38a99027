//! GraphQL wire types and the per-request operation context.

// self
use crate::{_prelude::*, error::TransientError, refresh::RefreshHandle};

/// Header carrying the bearer access token on every authenticated operation.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// JSON body posted to the GraphQL endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
	/// Name of the operation selected from `query`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation_name: Option<String>,
	/// GraphQL document text.
	pub query: String,
	/// Operation variables; omitted from the body when `null`.
	#[serde(default, skip_serializing_if = "JsonValue::is_null")]
	pub variables: JsonValue,
}
impl GraphQlRequest {
	/// Creates a request for the provided document without variables.
	pub fn new(query: impl Into<String>) -> Self {
		Self { operation_name: None, query: query.into(), variables: JsonValue::Null }
	}

	/// Sets the operation name.
	pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
		self.operation_name = Some(name.into());

		self
	}

	/// Sets the variables object.
	pub fn with_variables(mut self, variables: JsonValue) -> Self {
		self.variables = variables;

		self
	}
}

/// Single entry of a GraphQL `errors` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphQlError {
	/// Human-readable message.
	pub message: String,
	/// Response path the error applies to.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub path: Vec<JsonValue>,
	/// Server-specific details such as an error code.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<JsonValue>,
}

/// Parsed GraphQL response envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
	/// Result data, when execution started.
	#[serde(default)]
	pub data: Option<JsonValue>,
	/// Execution or validation errors.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<GraphQlError>,
}
impl GraphQlResponse {
	/// Wraps a data payload without errors.
	pub fn from_data(data: JsonValue) -> Self {
		Self { data: Some(data), errors: Vec::new() }
	}

	/// Returns the data payload, converting GraphQL errors into [`Error::Rejected`].
	pub fn into_data(self) -> Result<JsonValue> {
		if !self.errors.is_empty() {
			return Err(Error::Rejected { reason: join_messages(&self.errors) });
		}

		self.data.ok_or_else(|| TransientError::MissingPayload { field: "data" }.into())
	}
}

/// Per-request mutable state attached before an operation is forwarded.
///
/// Header names are stored lowercase. The context lives exactly as long as its operation.
#[derive(Clone, Debug, Default)]
pub struct OperationContext {
	headers: BTreeMap<String, String>,
	refresh: Option<RefreshHandle>,
}
impl OperationContext {
	/// Sets or replaces a header.
	pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
		self.headers.insert(name.to_ascii_lowercase(), value.into());
	}

	/// Returns the header value for `name`, if set.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Removes a header, returning its previous value.
	pub fn remove_header(&mut self, name: &str) -> Option<String> {
		self.headers.remove(&name.to_ascii_lowercase())
	}

	/// All headers in name order.
	pub fn headers(&self) -> &BTreeMap<String, String> {
		&self.headers
	}

	/// Attaches the handle of a background refresh started for this operation.
	pub fn set_refresh(&mut self, handle: RefreshHandle) {
		self.refresh = Some(handle);
	}

	/// Handle of the background refresh started for this operation, if any.
	pub fn refresh(&self) -> Option<&RefreshHandle> {
		self.refresh.as_ref()
	}
}

/// GraphQL request travelling through the link chain together with its context.
#[derive(Clone, Debug)]
pub struct Operation {
	/// Wire body sent to the endpoint.
	pub request: GraphQlRequest,
	/// Mutable per-request context.
	pub context: OperationContext,
}
impl Operation {
	/// Wraps a request with an empty context.
	pub fn new(request: GraphQlRequest) -> Self {
		Self { request, context: OperationContext::default() }
	}

	/// Operation name, if the request carries one.
	pub fn name(&self) -> Option<&str> {
		self.request.operation_name.as_deref()
	}
}
impl From<GraphQlRequest> for Operation {
	fn from(request: GraphQlRequest) -> Self {
		Self::new(request)
	}
}

pub(crate) fn join_messages(errors: &[GraphQlError]) -> String {
	errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_body_uses_wire_field_names() {
		let request = GraphQlRequest::new("query Ping { ping }").with_operation_name("Ping");
		let body = serde_json::to_value(&request).expect("Request should serialize.");

		assert_eq!(body, serde_json::json!({ "operationName": "Ping", "query": "query Ping { ping }" }));
	}

	#[test]
	fn context_headers_are_case_insensitive() {
		let mut context = OperationContext::default();

		context.set_header("X-Access-Token", "Bearer a");

		assert_eq!(context.header(ACCESS_TOKEN_HEADER), Some("Bearer a"));
		assert_eq!(context.remove_header("x-ACCESS-token"), Some("Bearer a".into()));
		assert!(context.headers().is_empty());
	}

	#[test]
	fn errors_array_becomes_rejection() {
		let response: GraphQlResponse = serde_json::from_str(
			r#"{"data":null,"errors":[{"message":"Unauthenticated"},{"message":"Expired"}]}"#,
		)
		.expect("Error envelope should parse.");
		let err = response.into_data().expect_err("Errors should surface as a rejection.");

		assert!(matches!(&err, Error::Rejected { reason } if reason == "Unauthenticated; Expired"));
	}

	#[test]
	fn missing_data_is_transient() {
		let err = GraphQlResponse::default().into_data().expect_err("Empty response should fail.");

		assert!(matches!(err, Error::Transient(TransientError::MissingPayload { field: "data" })));
	}
}
