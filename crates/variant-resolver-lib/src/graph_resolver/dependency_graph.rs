//! The graph of selected variants, without anything about how it was resolved.

use petgraph::prelude::*;
use serde::{Serialize, Deserialize};

use crate::component::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeData {
	/// The consumer, every root request starts here.
	Root,
	/// The variant selected for a component.
	Selected {
		component: ComponentIdentifier,
		variant: Variant,
	},
}

/// Selected variants connected by the requests that selected them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
	graph: StableDiGraph<NodeData, DependencyRequest>,
	root: NodeIndex,
}

impl Default for DependencyGraph {
	fn default() -> Self {
		let mut graph = StableDiGraph::default();
		let root = graph.add_node(NodeData::Root);
		Self { graph, root }
	}
}

impl DependencyGraph {
	pub fn root(&self) -> NodeIndex {
		self.root
	}

	pub fn graph(&self) -> &StableDiGraph<NodeData, DependencyRequest> {
		&self.graph
	}

	/// Finds the node for `variant` of `component`, adding it when missing.
	///
	/// The flag is `true` when the node is new.
	pub(super) fn get_or_add_selected(&mut self, component: &ComponentIdentifier, variant: &Variant) -> (NodeIndex, bool) {
		let existing = self.graph.node_indices().find(|i| {
			matches!(&self.graph[*i], NodeData::Selected { component: c, variant: v } if c == component && v.name() == variant.name())
		});
		match existing {
			Some(i) => (i, false),
			None => (self.graph.add_node(NodeData::Selected { component: component.clone(), variant: variant.clone() }), true),
		}
	}

	pub(super) fn add_request(&mut self, from: NodeIndex, to: NodeIndex, request: DependencyRequest) {
		self.graph.add_edge(from, to, request);
	}

	pub fn selected_variant(&self, node: NodeIndex) -> Option<(&ComponentIdentifier, &Variant)> {
		match self.graph.node_weight(node)? {
			NodeData::Selected { component, variant } => Some((component, variant)),
			NodeData::Root => None,
		}
	}

	/// Every selected variant, in the order they were first selected.
	pub fn selected(&self) -> impl Iterator<Item = (NodeIndex, &ComponentIdentifier, &Variant)> {
		self.graph.node_indices().filter_map(|i| self.selected_variant(i).map(|(c, v)| (i, c, v)))
	}

	/// The distinct variants selected for `component`.
	pub fn variants_of(&self, component: &ComponentIdentifier) -> Vec<&Variant> {
		self.selected().filter(|(_, c, _)| *c == component).map(|(_, _, v)| v).collect()
	}

	/// Outgoing requests of `node` and the nodes they selected.
	pub fn requests(&self, node: NodeIndex) -> impl Iterator<Item = (&DependencyRequest, NodeIndex)> {
		self.graph.edges_directed(node, Outgoing).map(|e| (e.weight(), e.target()))
	}

	pub fn has_path(&self, from: NodeIndex, to: NodeIndex) -> bool {
		petgraph::algo::has_path_connecting(&self.graph, from, to, None)
	}
}
