//! Terminating link that posts operations through a [`GraphQlTransport`].

// self
use crate::{
	_prelude::*,
	http::GraphQlTransport,
	link::{Forward, Link, LinkFuture},
	operation::{GraphQlResponse, Operation},
};

/// Sends each operation to the configured endpoint with the headers in its context.
#[derive(Clone)]
pub struct HttpLink {
	transport: Arc<dyn GraphQlTransport>,
	endpoint: Url,
}
impl HttpLink {
	/// Creates a link posting to `endpoint` through `transport`.
	pub fn new(transport: Arc<dyn GraphQlTransport>, endpoint: Url) -> Self {
		Self { transport, endpoint }
	}

	/// Endpoint operations are posted to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}
impl Link for HttpLink {
	fn request<'a>(&'a self, operation: Operation, _forward: Forward<'a>) -> Result<LinkFuture<'a>> {
		Ok(Box::pin(async move {
			let Operation { request, context } = operation;
			let response =
				self.transport.send(&self.endpoint, &request, context.headers()).await?;

			response.json::<GraphQlResponse>()
		}))
	}
}
impl Debug for HttpLink {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpLink").field("endpoint", &self.endpoint.as_str()).finish()
	}
}
