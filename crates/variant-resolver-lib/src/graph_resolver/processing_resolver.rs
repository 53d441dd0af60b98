use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::prelude::*;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::*;
use crate::config::ResolverOptions;
use crate::failure::SelectionStage;
use crate::SelectionError;

/// A request waiting to be attached to the graph.
#[derive(Debug, Clone)]
struct Pending {
	from: NodeIndex,
	request: DependencyRequest,
	requested_by: Requester,
}

impl Pending {
	fn origin(&self) -> ConfigurationOrigin {
		match &self.requested_by {
			Requester::Root => ConfigurationOrigin::Local,
			Requester::Variant { component, variant } => ConfigurationOrigin::External {
				from_component: component.clone(),
				from_configuration: variant.clone(),
			},
		}
	}
}

#[derive(Debug, Clone)]
enum Outcome {
	/// Cancelled before the resolution started.
	Skipped,
	Done(Result<Resolved, FailureReason>),
}

/// Breadth first walk over the requests, shared by the sequential and concurrent resolves.
///
/// Each distinct request is resolved once, later occurrences reuse the node or the failure.
struct Traversal {
	graph: DependencyGraph,
	layer: Vec<Pending>,
	resolved: HashMap<DependencyRequest, Option<NodeIndex>>,
	failures: Vec<NodeFailure>,
	cancelled: bool,
}

impl Traversal {
	fn new(graph: DependencyGraph, requests: Vec<DependencyRequest>) -> Self {
		let root = graph.root();
		let layer = requests.into_iter()
			.map(|request| Pending { from: root, request, requested_by: Requester::Root })
			.collect();
		Self { graph, layer, resolved: Default::default(), failures: Default::default(), cancelled: false }
	}

	fn has_pending(&self) -> bool {
		!self.cancelled && !self.layer.is_empty()
	}

	/// Requests of the current layer that still need a selection, in order of first appearance.
	///
	/// Identical requests are selected once, with the origin of the first requester. A missing configuration
	/// referenced by several components is reported against the first of them only.
	fn unresolved(&self) -> Vec<(DependencyRequest, ConfigurationOrigin)> {
		let mut seen = HashSet::<&DependencyRequest>::new();
		self.layer.iter()
			.filter(|p| !self.resolved.contains_key(&p.request) && seen.insert(&p.request))
			.map(|p| (p.request.clone(), p.origin()))
			.collect()
	}

	/// Records the outcomes of the current layer and queues the next one.
	fn advance(&mut self, outcomes: Vec<(DependencyRequest, Outcome)>) {
		let mut fresh_failures = HashMap::<DependencyRequest, FailureReason>::new();
		let mut added = Vec::<NodeIndex>::new();

		for (request, outcome) in outcomes {
			match outcome {
				Outcome::Skipped => self.cancelled = true,
				Outcome::Done(Ok(resolved)) => {
					let (node, is_new) = self.graph.get_or_add_selected(resolved.component.id(), &resolved.variant);
					if is_new { added.push(node) }
					self.resolved.insert(request, Some(node));
				},
				Outcome::Done(Err(reason)) => {
					self.resolved.insert(request.clone(), None);
					fresh_failures.insert(request, reason);
				},
			}
		}

		for pending in std::mem::take(&mut self.layer) {
			match self.resolved.get(&pending.request) {
				Some(Some(node)) => self.graph.add_request(pending.from, *node, pending.request),
				Some(None) => {
					/* Only the first requester reports a failure */
					let Some(reason) = fresh_failures.remove(&pending.request) else { continue };
					if pending.request.is_optional() {
						log::debug!("ignoring failed optional request for {}: {}", pending.request.target(), reason);
					} else {
						log::warn!("failed to resolve {} requested by {}: {}", pending.request.target(), pending.requested_by, reason);
						self.failures.push(NodeFailure::new(pending.requested_by, pending.request.target().clone(), reason));
					}
				},
				None => {},
			}
		}

		for node in added {
			let Some((component, variant)) = self.graph.selected_variant(node) else { continue };
			let requested_by = Requester::Variant { component: component.clone(), variant: variant.name().to_string() };
			for request in variant.dependencies() {
				self.layer.push(Pending { from: node, request: request.clone(), requested_by: requested_by.clone() });
			}
		}
	}

	/// Checks components with several selected variants and builds the final resolution.
	fn finish(mut self, selector: &VariantSelector, repository: &ComponentRepository, options: &ResolverOptions) -> GraphResolution {
		let components: Vec<ComponentIdentifier> = self.graph.selected()
			.map(|(_, c, _)| c.clone())
			.collect::<std::collections::BTreeSet<_>>()
			.into_iter()
			.collect();

		for id in components {
			let variants = self.graph.variants_of(&id);
			if variants.len() < 2 { continue }
			let Some(component) = repository.get(&id) else { continue };
			if let Err(failure) = selector.check_selected_variants(component, &variants) {
				log::warn!("{}", failure);
				self.failures.push(NodeFailure::new(Requester::Root, id, failure.into()));
			}
		}

		if options.full_failures() {
			for failure in &self.failures {
				let Some(resolution_failure) = failure.resolution_failure() else { continue };
				for candidate in resolution_failure.assessed_candidates() {
					log::warn!("{}: {}", failure.target(), candidate);
				}
			}
		}

		if self.cancelled {
			log::debug!("resolution cancelled with {} nodes left", self.layer.len());
		}
		GraphResolution::new(self.graph, self.failures, self.cancelled)
	}
}

/// Resolves the requests handed to a [`GraphResolverBuilder`].
///
/// # Failures
/// Node failures don't stop the resolve, they are collected into the [`GraphResolution`].
/// Failures of optional requests are dropped.
#[derive(Debug)]
pub struct GraphResolver {
	selector: VariantSelector,
	repository: Arc<ComponentRepository>,
	options: ResolverOptions,
	cancellation: CancellationFlag,

	graph: DependencyGraph,
	requests: Vec<DependencyRequest>,
}

impl GraphResolver {
	pub(super) fn new(selector: VariantSelector, repository: Arc<ComponentRepository>, options: ResolverOptions, cancellation: CancellationFlag, requests: Vec<DependencyRequest>) -> Self {
		Self {
			selector,
			repository,
			options,
			cancellation,
			graph: Default::default(),
			requests,
		}
	}

	pub fn selector(&self) -> &VariantSelector {
		&self.selector
	}

	/// Resolves every node on the current thread.
	pub fn resolve(self) -> GraphResolution {
		let mut traversal = Traversal::new(self.graph, self.requests);

		while traversal.has_pending() {
			let outcomes = traversal.unresolved().into_iter().map(|(request, origin)| {
				let outcome = if self.cancellation.is_cancelled() {
					Outcome::Skipped
				} else {
					Outcome::Done(resolve_request(&self.selector, &self.repository, &request, origin))
				};
				(request, outcome)
			}).collect();
			traversal.advance(outcomes);
		}

		traversal.finish(&self.selector, &self.repository, &self.options)
	}

	/// Resolves the nodes of each layer concurrently.
	///
	/// At most [`ResolverOptions::max_concurrent_resolutions()`] selections run at once, each on the blocking pool.
	/// The result is the same as [`GraphResolver::resolve()`].
	pub async fn resolve_concurrently(self) -> GraphResolution {
		let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_resolutions()));
		let mut traversal = Traversal::new(self.graph, self.requests);

		while traversal.has_pending() {
			let work = traversal.unresolved();
			log::debug!("resolving {} nodes", work.len());

			let mut join_set = JoinSet::<(usize, Outcome)>::new();
			for (i, (request, origin)) in work.iter().cloned().enumerate() {
				let semaphore = Arc::clone(&semaphore);
				let selector = self.selector.clone();
				let repository = Arc::clone(&self.repository);
				let cancellation = self.cancellation.clone();

				join_set.spawn(async move {
					let Ok(_permit) = semaphore.acquire_owned().await else { return (i, Outcome::Skipped) };
					if cancellation.is_cancelled() { return (i, Outcome::Skipped) }

					let target = request.target().clone();
					let result = tokio::task::spawn_blocking(move || resolve_request(&selector, &repository, &request, origin))
						.await
						.unwrap_or_else(|e| {
							let cause = SelectionError::Panicked(e.to_string());
							Err(ResolutionFailure::unknown(target, SelectionStage::Graph, cause).into())
						});
					(i, Outcome::Done(result))
				});
			}

			let mut outcomes: Vec<Option<Outcome>> = vec![None; work.len()];
			while let Some(joined) = join_set.join_next().await {
				match joined {
					Ok((i, outcome)) => outcomes[i] = Some(outcome),
					Err(e) => log::error!("resolution task failed: {}", e),
				}
			}

			let outcomes = work.into_iter().zip(outcomes).map(|((request, _), outcome)| {
				let outcome = outcome.unwrap_or_else(|| {
					let cause = SelectionError::Panicked("resolution task did not complete".to_string());
					Outcome::Done(Err(ResolutionFailure::unknown(request.target().clone(), SelectionStage::Graph, cause).into()))
				});
				(request, outcome)
			}).collect();
			traversal.advance(outcomes);
		}

		traversal.finish(&self.selector, &self.repository, &self.options)
	}
}
