use std::sync::Arc;

use super::*;
use crate::config::ResolverOptions;
use crate::schema::AttributeMatchingSchema;

pub struct GraphResolverBuilder {
	repository: Arc<ComponentRepository>,
	schema: Arc<AttributeMatchingSchema>,
	options: ResolverOptions,
	cancellation: CancellationFlag,

	requests: Vec<DependencyRequest>,
}

impl GraphResolverBuilder {
	pub fn new(repository: Arc<ComponentRepository>, schema: Arc<AttributeMatchingSchema>) -> Self {
		Self {
			repository,
			schema,
			options: Default::default(),
			cancellation: Default::default(),
			requests: Default::default(),
		}
	}

	pub fn add_requests(mut self, requests: impl IntoIterator<Item = DependencyRequest>) -> Self {
		for request in requests {
			self.requests.push(request);
		}
		self
	}

	pub fn add_request(mut self, request: DependencyRequest) -> Self {
		self.requests.push(request);
		self
	}

	pub fn options(mut self, options: ResolverOptions) -> Self {
		self.options = options;
		self
	}

	/// Shares `cancellation` with the resolver, cancelling it stops the resolve before the next node.
	pub fn cancellation(mut self, cancellation: CancellationFlag) -> Self {
		self.cancellation = cancellation;
		self
	}

	pub fn build(self) -> GraphResolver {
		let selector = VariantSelector::with_options(self.schema, &self.options);
		GraphResolver::new(selector, self.repository, self.options, self.cancellation, self.requests)
	}
}
