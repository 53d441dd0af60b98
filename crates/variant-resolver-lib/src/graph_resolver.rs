//! Resolving a whole dependency graph, one variant selection per node.
//!
//! # Usage
//! 1. Create a [`GraphResolverBuilder`] over a [`ComponentRepository`] and a schema.
//! 1. Add the consumer's [`DependencyRequest`]s and optionally [`ResolverOptions`] or a [`CancellationFlag`].
//! 1. [`GraphResolverBuilder::build()`] to get a [`GraphResolver`].
//! 1. [`GraphResolver::resolve()`] or [`GraphResolver::resolve_concurrently()`] to get a [`GraphResolution`].
//! 1. [`GraphResolution::status()`] to see whether every node resolved, then query the selected variants.
//!
//! Requests are resolved breadth first, a layer at a time. A failing node never stops its siblings,
//! every failure is collected and reported together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::component::*;
use crate::failure::{ConfigurationOrigin, ResolutionFailure};
use crate::selector::{SelectionRequest, VariantSelector};

mod dependency_graph;
pub use dependency_graph::DependencyGraph;
pub use dependency_graph::NodeData;

mod resolver_builder;
pub use resolver_builder::GraphResolverBuilder;
mod processing_resolver;
pub use processing_resolver::GraphResolver;
mod finalized_resolver;
pub use finalized_resolver::GraphResolution;
pub use finalized_resolver::ResolutionStatus;

/// Shared switch for stopping a resolution between nodes.
///
/// Selections already running are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// Who asked for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
	/// The consumer, or the graph as a whole.
	Root,
	Variant {
		component: ComponentIdentifier,
		variant: String,
	},
}

impl std::fmt::Display for Requester {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Requester::Root => write!(f, "root"),
			Requester::Variant { component, variant } => write!(f, "{component} ({variant})"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FailureReason {
	#[error("{0} is not in the repository")]
	ComponentNotFound(ComponentIdentifier),
	#[error("invalid request: {0}")]
	InvalidRequest(String),
	#[error(transparent)]
	Selection(#[from] ResolutionFailure),
}

/// A node of the graph that could not be resolved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{target} requested by {requested_by}: {reason}")]
pub struct NodeFailure {
	requested_by: Requester,
	target: ComponentIdentifier,
	#[source]
	reason: FailureReason,
}

impl NodeFailure {
	pub(crate) fn new(requested_by: Requester, target: ComponentIdentifier, reason: FailureReason) -> Self {
		Self { requested_by, target, reason }
	}

	pub fn requested_by(&self) -> &Requester {
		&self.requested_by
	}

	pub fn target(&self) -> &ComponentIdentifier {
		&self.target
	}

	pub fn reason(&self) -> &FailureReason {
		&self.reason
	}

	/// The selection failure, when the node got as far as selecting.
	pub fn resolution_failure(&self) -> Option<&ResolutionFailure> {
		match &self.reason {
			FailureReason::Selection(f) => Some(f),
			_ => None,
		}
	}
}

/// Outcome of one successful node resolution, owned so it can cross task boundaries.
#[derive(Debug, Clone)]
struct Resolved {
	component: Arc<Component>,
	variant: Variant,
}

/// Resolves a single request against the repository.
fn resolve_request(selector: &VariantSelector, repository: &ComponentRepository, request: &DependencyRequest, origin: ConfigurationOrigin) -> Result<Resolved, FailureReason> {
	let component = repository.get(request.target())
		.ok_or_else(|| FailureReason::ComponentNotFound(request.target().clone()))?;

	let variant = match request.configuration() {
		Some(name) => selector.select_configuration(component, name, request.attributes(), origin)?.variant(),
		None => {
			let selection = SelectionRequest::new(selector.schema(), request.attributes().clone(), request.capabilities().to_vec())
				.map_err(|e| FailureReason::InvalidRequest(e.to_string()))?;
			selector.select(component, &selection)?
		},
	};

	log::debug!("selected '{}' of {}", variant.name(), component.id());
	Ok(Resolved { component: Arc::clone(component), variant: variant.clone() })
}
