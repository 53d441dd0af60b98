//! Typed descriptions of why a selection did not produce exactly one variant.
//!
//! Every failure is built in one go with a snapshot of everything needed to explain it:
//! the target, what was requested and the per candidate [`AssessedCandidate`] breakdown.
//! Nothing here refers back into live resolution state, so failures can be kept, logged
//! or serialized after the graph they came from has moved on.

use std::sync::Arc;

use serde::Serialize;

use crate::attribute::AttributeContainer;
use crate::capability::CapabilitySelector;
use crate::component::ComponentIdentifier;
use crate::schema::AttributeMatchingSchema;
use crate::selector::{AssessedCandidate, TransformedVariant};
use crate::SelectionError;

/// Discriminant of [`ResolutionFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FailureKind {
	NoCompatibleVariants,
	NoVariantsWithMatchingCapabilities,
	AmbiguousVariants,
	ConfigurationNotCompatible,
	ConfigurationNotFound,
	ConfigurationNotConsumable,
	IncompatibleMultipleNodeSelection,
	AmbiguousArtifacts,
	NoCompatibleArtifact,
	AmbiguousArtifactTransforms,
	UnknownSelection,
}

impl std::fmt::Display for FailureKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Debug::fmt(self, f)
	}
}

/// What a graph variant selection was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionContext {
	target: ComponentIdentifier,
	requested_attributes: AttributeContainer,
	requested_capabilities: Vec<CapabilitySelector>,
}

impl SelectionContext {
	pub(crate) fn new(target: ComponentIdentifier, requested_attributes: AttributeContainer, requested_capabilities: Vec<CapabilitySelector>) -> Self {
		Self { target, requested_attributes, requested_capabilities }
	}

	pub fn target(&self) -> &ComponentIdentifier {
		&self.target
	}

	pub fn requested_attributes(&self) -> &AttributeContainer {
		&self.requested_attributes
	}

	pub fn requested_capabilities(&self) -> &[CapabilitySelector] {
		&self.requested_capabilities
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoCompatibleVariants {
	context: SelectionContext,
	candidates: Vec<AssessedCandidate>,
}

impl NoCompatibleVariants {
	pub(crate) fn new(context: SelectionContext, candidates: Vec<AssessedCandidate>) -> Self {
		Self { context, candidates }
	}

	pub fn context(&self) -> &SelectionContext { &self.context }
	/// Every candidate that passed the capability filter, all of them incompatible.
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoVariantsWithMatchingCapabilities {
	context: SelectionContext,
	candidates: Vec<AssessedCandidate>,
}

impl NoVariantsWithMatchingCapabilities {
	pub(crate) fn new(context: SelectionContext, candidates: Vec<AssessedCandidate>) -> Self {
		Self { context, candidates }
	}

	pub fn context(&self) -> &SelectionContext { &self.context }
	/// Every candidate of the component, assessed against the requested attributes.
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousVariants {
	context: SelectionContext,
	candidates: Vec<AssessedCandidate>,
	discarded: Vec<AssessedCandidate>,
	capability_conflict: bool,
}

impl AmbiguousVariants {
	pub(crate) fn new(context: SelectionContext, candidates: Vec<AssessedCandidate>, discarded: Vec<AssessedCandidate>, capability_conflict: bool) -> Self {
		Self { context, candidates, discarded, capability_conflict }
	}

	pub fn context(&self) -> &SelectionContext { &self.context }
	/// The candidates that are equally good.
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
	/// Candidates that were considered but are incompatible.
	pub fn discarded(&self) -> &[AssessedCandidate] { &self.discarded }
	/// The tied candidates provide different capabilities.
	pub fn capability_conflict(&self) -> bool { self.capability_conflict }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationNotCompatible {
	target: ComponentIdentifier,
	configuration: String,
	requested_attributes: AttributeContainer,
	candidate: AssessedCandidate,
}

impl ConfigurationNotCompatible {
	pub(crate) fn new(target: ComponentIdentifier, configuration: String, requested_attributes: AttributeContainer, candidate: AssessedCandidate) -> Self {
		Self { target, configuration, requested_attributes, candidate }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	pub fn configuration(&self) -> &str { &self.configuration }
	pub fn requested_attributes(&self) -> &AttributeContainer { &self.requested_attributes }
	pub fn candidate(&self) -> &AssessedCandidate { &self.candidate }
}

/// Where a request for a configuration by name came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "origin", rename_all = "kebab-case")]
pub enum ConfigurationOrigin {
	/// The consumer asked for the configuration directly.
	Local,
	/// Another component's configuration refers to it.
	External {
		from_component: ComponentIdentifier,
		from_configuration: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationNotFound {
	target: ComponentIdentifier,
	configuration: String,
	origin: ConfigurationOrigin,
}

impl ConfigurationNotFound {
	pub(crate) fn new(target: ComponentIdentifier, configuration: String, origin: ConfigurationOrigin) -> Self {
		Self { target, configuration, origin }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	pub fn configuration(&self) -> &str { &self.configuration }
	pub fn origin(&self) -> &ConfigurationOrigin { &self.origin }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationNotConsumable {
	target: ComponentIdentifier,
	configuration: String,
}

impl ConfigurationNotConsumable {
	pub(crate) fn new(target: ComponentIdentifier, configuration: String) -> Self {
		Self { target, configuration }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	pub fn configuration(&self) -> &str { &self.configuration }
}

/// Several variants of one component were selected in the graph and their attributes conflict.
#[derive(Debug, Clone, Serialize)]
pub struct IncompatibleMultipleNodeSelection {
	target: ComponentIdentifier,
	#[serde(skip)]
	schema: Arc<AttributeMatchingSchema>,
	candidates: Vec<AssessedCandidate>,
}

impl IncompatibleMultipleNodeSelection {
	pub(crate) fn new(target: ComponentIdentifier, schema: Arc<AttributeMatchingSchema>, candidates: Vec<AssessedCandidate>) -> Self {
		Self { target, schema, candidates }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	/// The schema the conflict was found with.
	pub fn schema(&self) -> &AttributeMatchingSchema { &self.schema }
	/// Each selected variant, assessed against the attributes of the first one.
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
}

impl PartialEq for IncompatibleMultipleNodeSelection {
	fn eq(&self, other: &Self) -> bool {
		self.target == other.target && Arc::ptr_eq(&self.schema, &other.schema) && self.candidates == other.candidates
	}
}

/// What an artifact selection was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactContext {
	target: ComponentIdentifier,
	variant: String,
	requested_attributes: AttributeContainer,
}

impl ArtifactContext {
	pub(crate) fn new(target: ComponentIdentifier, variant: String, requested_attributes: AttributeContainer) -> Self {
		Self { target, variant, requested_attributes }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	/// Name of the graph variant whose artifacts were selected from.
	pub fn variant(&self) -> &str { &self.variant }
	pub fn requested_attributes(&self) -> &AttributeContainer { &self.requested_attributes }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousArtifacts {
	context: ArtifactContext,
	candidates: Vec<AssessedCandidate>,
	discarded: Vec<AssessedCandidate>,
}

impl AmbiguousArtifacts {
	pub(crate) fn new(context: ArtifactContext, candidates: Vec<AssessedCandidate>, discarded: Vec<AssessedCandidate>) -> Self {
		Self { context, candidates, discarded }
	}

	pub fn context(&self) -> &ArtifactContext { &self.context }
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
	pub fn discarded(&self) -> &[AssessedCandidate] { &self.discarded }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoCompatibleArtifact {
	context: ArtifactContext,
	candidates: Vec<AssessedCandidate>,
}

impl NoCompatibleArtifact {
	pub(crate) fn new(context: ArtifactContext, candidates: Vec<AssessedCandidate>) -> Self {
		Self { context, candidates }
	}

	pub fn context(&self) -> &ArtifactContext { &self.context }
	pub fn candidates(&self) -> &[AssessedCandidate] { &self.candidates }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousArtifactTransforms {
	context: ArtifactContext,
	transforms: Vec<TransformedVariant>,
}

impl AmbiguousArtifactTransforms {
	pub(crate) fn new(context: ArtifactContext, transforms: Vec<TransformedVariant>) -> Self {
		Self { context, transforms }
	}

	pub fn context(&self) -> &ArtifactContext { &self.context }
	/// The transform chains that could each produce the requested attributes.
	pub fn transforms(&self) -> &[TransformedVariant] { &self.transforms }
}

/// Which selection path an unexpected error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SelectionStage {
	Graph,
	Configuration,
	Artifact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("selecting a variant of {target} failed unexpectedly: {cause}")]
pub struct UnknownSelection {
	target: ComponentIdentifier,
	stage: SelectionStage,
	#[source]
	cause: SelectionError,
}

impl UnknownSelection {
	pub(crate) fn new(target: ComponentIdentifier, stage: SelectionStage, cause: SelectionError) -> Self {
		Self { target, stage, cause }
	}

	pub fn target(&self) -> &ComponentIdentifier { &self.target }
	pub fn stage(&self) -> SelectionStage { self.stage }
	pub fn cause(&self) -> &SelectionError { &self.cause }
}

/// The outcome of a selection that did not yield exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum ResolutionFailure {
	#[error("no variant of {} matches the requested attributes {}", .0.context.target, .0.context.requested_attributes)]
	NoCompatibleVariants(NoCompatibleVariants),
	#[error("no variant of {} provides the requested capabilities", .0.context.target)]
	NoVariantsWithMatchingCapabilities(NoVariantsWithMatchingCapabilities),
	#[error("cannot choose between {} variants of {}", .0.candidates.len(), .0.context.target)]
	AmbiguousVariants(AmbiguousVariants),
	#[error("configuration '{}' of {} does not match the requested attributes", .0.configuration, .0.target)]
	ConfigurationNotCompatible(ConfigurationNotCompatible),
	#[error("configuration '{}' is not declared by {}", .0.configuration, .0.target)]
	ConfigurationNotFound(ConfigurationNotFound),
	#[error("configuration '{}' of {} is not meant to be consumed", .0.configuration, .0.target)]
	ConfigurationNotConsumable(ConfigurationNotConsumable),
	#[error("multiple incompatible variants of {} were selected", .0.target)]
	IncompatibleMultipleNodeSelection(IncompatibleMultipleNodeSelection),
	#[error("cannot choose between {} artifact sets of variant '{}' of {}", .0.candidates.len(), .0.context.variant, .0.context.target)]
	AmbiguousArtifacts(AmbiguousArtifacts),
	#[error("no artifact set of variant '{}' of {} matches the requested attributes {}", .0.context.variant, .0.context.target, .0.context.requested_attributes)]
	NoCompatibleArtifact(NoCompatibleArtifact),
	#[error("found {} transforms producing artifacts of variant '{}' of {} with the requested attributes", .0.transforms.len(), .0.context.variant, .0.context.target)]
	AmbiguousArtifactTransforms(AmbiguousArtifactTransforms),
	#[error(transparent)]
	UnknownSelection(UnknownSelection),
}

impl ResolutionFailure {
	pub(crate) fn unknown(target: ComponentIdentifier, stage: SelectionStage, cause: SelectionError) -> Self {
		ResolutionFailure::UnknownSelection(UnknownSelection::new(target, stage, cause))
	}

	pub fn kind(&self) -> FailureKind {
		match self {
			ResolutionFailure::NoCompatibleVariants(_) => FailureKind::NoCompatibleVariants,
			ResolutionFailure::NoVariantsWithMatchingCapabilities(_) => FailureKind::NoVariantsWithMatchingCapabilities,
			ResolutionFailure::AmbiguousVariants(_) => FailureKind::AmbiguousVariants,
			ResolutionFailure::ConfigurationNotCompatible(_) => FailureKind::ConfigurationNotCompatible,
			ResolutionFailure::ConfigurationNotFound(_) => FailureKind::ConfigurationNotFound,
			ResolutionFailure::ConfigurationNotConsumable(_) => FailureKind::ConfigurationNotConsumable,
			ResolutionFailure::IncompatibleMultipleNodeSelection(_) => FailureKind::IncompatibleMultipleNodeSelection,
			ResolutionFailure::AmbiguousArtifacts(_) => FailureKind::AmbiguousArtifacts,
			ResolutionFailure::NoCompatibleArtifact(_) => FailureKind::NoCompatibleArtifact,
			ResolutionFailure::AmbiguousArtifactTransforms(_) => FailureKind::AmbiguousArtifactTransforms,
			ResolutionFailure::UnknownSelection(_) => FailureKind::UnknownSelection,
		}
	}

	/// The component the failed selection targeted.
	pub fn target(&self) -> &ComponentIdentifier {
		match self {
			ResolutionFailure::NoCompatibleVariants(f) => &f.context.target,
			ResolutionFailure::NoVariantsWithMatchingCapabilities(f) => &f.context.target,
			ResolutionFailure::AmbiguousVariants(f) => &f.context.target,
			ResolutionFailure::ConfigurationNotCompatible(f) => &f.target,
			ResolutionFailure::ConfigurationNotFound(f) => &f.target,
			ResolutionFailure::ConfigurationNotConsumable(f) => &f.target,
			ResolutionFailure::IncompatibleMultipleNodeSelection(f) => &f.target,
			ResolutionFailure::AmbiguousArtifacts(f) => &f.context.target,
			ResolutionFailure::NoCompatibleArtifact(f) => &f.context.target,
			ResolutionFailure::AmbiguousArtifactTransforms(f) => &f.context.target,
			ResolutionFailure::UnknownSelection(f) => &f.target,
		}
	}

	/// Human label of what was being resolved.
	pub fn requested_name(&self) -> String {
		match self {
			ResolutionFailure::ConfigurationNotCompatible(f) => f.configuration.clone(),
			ResolutionFailure::ConfigurationNotFound(f) => f.configuration.clone(),
			ResolutionFailure::ConfigurationNotConsumable(f) => f.configuration.clone(),
			ResolutionFailure::AmbiguousArtifacts(AmbiguousArtifacts { context, .. })
			| ResolutionFailure::NoCompatibleArtifact(NoCompatibleArtifact { context, .. })
			| ResolutionFailure::AmbiguousArtifactTransforms(AmbiguousArtifactTransforms { context, .. }) => {
				format!("{} ({})", context.target, context.variant)
			},
			f => f.target().display_name(),
		}
	}

	/// The requested attributes, for kinds that were matching on attributes.
	pub fn requested_attributes(&self) -> Option<&AttributeContainer> {
		match self {
			ResolutionFailure::NoCompatibleVariants(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::NoVariantsWithMatchingCapabilities(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::AmbiguousVariants(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::ConfigurationNotCompatible(f) => Some(&f.requested_attributes),
			ResolutionFailure::AmbiguousArtifacts(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::NoCompatibleArtifact(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::AmbiguousArtifactTransforms(f) => Some(&f.context.requested_attributes),
			ResolutionFailure::ConfigurationNotFound(_)
			| ResolutionFailure::ConfigurationNotConsumable(_)
			| ResolutionFailure::IncompatibleMultipleNodeSelection(_)
			| ResolutionFailure::UnknownSelection(_) => None,
		}
	}

	/// The candidate breakdown carried by the failure, empty for kinds without one.
	pub fn assessed_candidates(&self) -> &[AssessedCandidate] {
		match self {
			ResolutionFailure::NoCompatibleVariants(f) => &f.candidates,
			ResolutionFailure::NoVariantsWithMatchingCapabilities(f) => &f.candidates,
			ResolutionFailure::AmbiguousVariants(f) => &f.candidates,
			ResolutionFailure::ConfigurationNotCompatible(f) => std::slice::from_ref(&f.candidate),
			ResolutionFailure::IncompatibleMultipleNodeSelection(f) => &f.candidates,
			ResolutionFailure::AmbiguousArtifacts(f) => &f.candidates,
			ResolutionFailure::NoCompatibleArtifact(f) => &f.candidates,
			ResolutionFailure::ConfigurationNotFound(_)
			| ResolutionFailure::ConfigurationNotConsumable(_)
			| ResolutionFailure::AmbiguousArtifactTransforms(_)
			| ResolutionFailure::UnknownSelection(_) => &[],
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn target() -> ComponentIdentifier {
		ComponentIdentifier::module("org.example", "lib", "1.0")
	}

	#[test] fn not_found_is_named_after_configuration() {
		let f = ResolutionFailure::ConfigurationNotFound(ConfigurationNotFound::new(target(), "compile".to_string(), ConfigurationOrigin::Local));
		assert_eq!(f.requested_name(), "compile");
		assert_eq!(f.kind(), FailureKind::ConfigurationNotFound);
		assert!(f.assessed_candidates().is_empty());
	}
	#[test] fn variant_failure_is_named_after_target() {
		let f = ResolutionFailure::NoCompatibleVariants(NoCompatibleVariants::new(SelectionContext::new(target(), AttributeContainer::empty(), vec![]), vec![]));
		assert_eq!(f.requested_name(), "org.example:lib:1.0");
		assert_eq!(f.to_string(), "no variant of org.example:lib:1.0 matches the requested attributes {}");
	}
	#[test] fn unknown_keeps_cause_as_source() {
		use std::error::Error as _;
		let cause = SelectionError::Panicked("boom".to_string());
		let f = ResolutionFailure::unknown(target(), SelectionStage::Graph, cause.clone());
		assert_eq!(f.source().map(|s| s.to_string()), Some(cause.to_string()));
	}
	#[test] fn failures_serialize_with_kind() {
		let f = ResolutionFailure::ConfigurationNotConsumable(ConfigurationNotConsumable::new(target(), "internal".to_string()));
		let json = serde_json::to_value(&f).unwrap();
		assert_eq!(json["kind"], "ConfigurationNotConsumable");
		assert_eq!(json["configuration"], "internal");
	}
}
