//! Link pipeline: units that inspect or rewrite an operation before forwarding it.
//!
//! A [`LinkChain`] is an ordered list of [`Link`]s ending in a terminating link such as
//! [`HttpLink`]. Each link receives the operation plus a [`Forward`] continuation over the
//! links after it. Work done before the returned future is built runs synchronously, so a
//! link can fail the pipeline immediately (for example on an undecodable access token) or
//! hand back the downstream future untouched.

pub mod auth;
pub mod http;

pub use auth::AuthLink;
pub use http::HttpLink;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	operation::{GraphQlResponse, Operation},
};

/// Boxed future resolving to the response of a forwarded operation.
pub type LinkFuture<'a> = Pin<Box<dyn Future<Output = Result<GraphQlResponse>> + 'a + Send>>;

/// Unit in the request pipeline.
pub trait Link
where
	Self: Send + Sync,
{
	/// Handles `operation`, usually by calling [`Forward::call`].
	///
	/// Returning `Err` fails the operation before any downstream link runs; terminating links
	/// ignore `forward` and produce the response themselves.
	fn request<'a>(&'a self, operation: Operation, forward: Forward<'a>) -> Result<LinkFuture<'a>>;
}

/// Continuation over the links that follow the current one.
#[derive(Clone, Copy)]
pub struct Forward<'a> {
	rest: &'a [Arc<dyn Link>],
}
impl<'a> Forward<'a> {
	/// Creates a continuation that starts at the first of `links`.
	pub fn new(links: &'a [Arc<dyn Link>]) -> Self {
		Self { rest: links }
	}

	/// Hands `operation` to the next link.
	pub fn call(self, operation: Operation) -> Result<LinkFuture<'a>> {
		let Some((next, rest)) = self.rest.split_first() else {
			return Err(ConfigError::UnterminatedChain.into());
		};

		next.request(operation, Forward { rest })
	}

	/// Number of links left in the chain.
	pub fn remaining(&self) -> usize {
		self.rest.len()
	}
}
impl Debug for Forward<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Forward").field("remaining", &self.rest.len()).finish()
	}
}

/// Ordered composition of links.
#[derive(Clone, Default)]
pub struct LinkChain {
	links: Vec<Arc<dyn Link>>,
}
impl LinkChain {
	/// Starts a chain with a single link.
	pub fn from_link<L>(link: L) -> Self
	where
		L: 'static + Link,
	{
		Self::default().concat(link)
	}

	/// Appends `link` after the current tail.
	pub fn concat<L>(self, link: L) -> Self
	where
		L: 'static + Link,
	{
		self.concat_shared(Arc::new(link))
	}

	/// Appends an already shared link.
	pub fn concat_shared(mut self, link: Arc<dyn Link>) -> Self {
		self.links.push(link);

		self
	}

	/// Runs `operation` through the chain.
	pub fn execute(&self, operation: Operation) -> Result<LinkFuture<'_>> {
		Forward::new(&self.links).call(operation)
	}

	/// Number of links in the chain.
	pub fn len(&self) -> usize {
		self.links.len()
	}

	/// Returns `true` when the chain has no links.
	pub fn is_empty(&self) -> bool {
		self.links.is_empty()
	}
}
impl Debug for LinkChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LinkChain").field("len", &self.links.len()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::RecordingLink, operation::GraphQlRequest};

	struct HeaderLink(&'static str);
	impl Link for HeaderLink {
		fn request<'a>(
			&'a self,
			mut operation: Operation,
			forward: Forward<'a>,
		) -> Result<LinkFuture<'a>> {
			operation.context.set_header("x-trace", self.0);

			forward.call(operation)
		}
	}

	#[tokio::test]
	async fn links_run_in_concat_order() {
		let recorder = Arc::new(RecordingLink::default());
		let chain = LinkChain::from_link(HeaderLink("first"))
			.concat(HeaderLink("second"))
			.concat_shared(recorder.clone());

		chain
			.execute(Operation::new(GraphQlRequest::new("{ ping }")))
			.expect("Chain should accept the operation.")
			.await
			.expect("Recording link should answer.");

		let seen = recorder.last().expect("Operation should reach the terminating link.");

		assert_eq!(chain.len(), 3);
		assert_eq!(seen.context.header("x-trace"), Some("second"));
	}

	#[test]
	fn chain_without_terminator_fails_synchronously() {
		let chain = LinkChain::from_link(HeaderLink("only"));
		let err = chain
			.execute(Operation::new(GraphQlRequest::new("{ ping }")))
			.err()
			.expect("Chain without a terminating link should fail.");

		assert!(matches!(err, Error::Config(ConfigError::UnterminatedChain)));
	}
}
