use super::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionStatus<'r> {
	/// Every request was resolved and the selected variants are compatible with each other.
	Complete,
	/// The resolve was stopped before every node was resolved, the graph is partial.
	Cancelled,
	/// Some nodes could not be resolved.
	Failed(&'r [NodeFailure]),
}

#[derive(Debug)]
pub struct GraphResolution {
	graph: DependencyGraph,
	failures: Vec<NodeFailure>,
	cancelled: bool,
}

impl GraphResolution {
	pub(super) fn new(graph: DependencyGraph, failures: Vec<NodeFailure>, cancelled: bool) -> Self {
		Self {
			graph,
			failures,
			cancelled,
		}
	}

	/// Failures take priority over cancellation.
	pub fn status(&self) -> ResolutionStatus<'_> {
		if !self.failures.is_empty() {
			ResolutionStatus::Failed(&self.failures)
		} else if self.cancelled {
			ResolutionStatus::Cancelled
		} else {
			ResolutionStatus::Complete
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	pub fn failures(&self) -> &[NodeFailure] {
		&self.failures
	}

	pub fn graph(&self) -> &DependencyGraph {
		&self.graph
	}

	pub fn into_graph(self) -> DependencyGraph {
		self.graph
	}

	/// Selected `(component, variant name)` pairs in the order they were selected.
	pub fn selected_variants(&self) -> Vec<(&ComponentIdentifier, &str)> {
		self.graph.selected().map(|(_, c, v)| (c, v.name())).collect()
	}

	pub fn selected_variant_of(&self, component: &ComponentIdentifier) -> Option<&Variant> {
		match self.graph.variants_of(component).as_slice() {
			[only] => Some(*only),
			_ => None,
		}
	}
}
