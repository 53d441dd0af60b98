//! Choosing one variant of a component for a set of requested attributes.
//!
//! # Usage
//! 1. Build an [`AttributeMatchingSchema`] and share it in an [`Arc`](std::sync::Arc).
//! 1. Create a [`VariantSelector`] over the schema.
//! 1. Validate what the consumer asks for with [`SelectionRequest::new()`].
//! 1. [`VariantSelector::select()`] for graph variants, [`VariantSelector::select_configuration()`] when a
//! configuration is named explicitly, [`VariantSelector::select_artifact()`] once a graph variant is chosen.
//!
//! Selection is a pure function of the schema, the component and the request. Any rule error or panic
//! is reported as [`ResolutionFailure::UnknownSelection`], nothing escapes the selector.

use serde::Serialize;

use crate::attribute::*;
use crate::capability::{Capability, CapabilitySelector};
use crate::failure::ResolutionFailure;
use crate::schema::{AttributeMatchingSchema, MatchVerdict};
use crate::SelectionError;

mod assessor;
pub use assessor::ResolutionCandidateAssessor;
mod disambiguation;
mod variant_selector;
pub use variant_selector::VariantSelector;
mod artifact;
pub use artifact::ArtifactTransform;
pub use artifact::TransformRegistry;
pub use artifact::TransformedVariant;
pub use artifact::ArtifactSelection;

/// Anything that can be matched against requested attributes.
pub trait Candidate {
	fn name(&self) -> &str;
	fn attributes(&self) -> &AttributeContainer;
	fn capabilities(&self) -> &[Capability] {
		&[]
	}
}

/// A validated request for a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
	attributes: AttributeContainer,
	capabilities: Vec<CapabilitySelector>,
}

impl SelectionRequest {
	/// Checks `attributes` against the schema.
	///
	/// Every attribute the schema requires must be present, and declared attributes must carry their declared type.
	pub fn new(schema: &AttributeMatchingSchema, attributes: AttributeContainer, capabilities: Vec<CapabilitySelector>) -> crate::Result<Self> {
		let mut problems = Vec::<String>::new();
		for required in schema.required() {
			if !attributes.contains(required) {
				problems.push(format!("missing required attribute `{}`", required));
			}
		}
		for entry in attributes.iter() {
			if let Some(declared) = schema.declared_attribute(entry.attribute().name()) {
				if declared.ty() != entry.attribute().ty() {
					problems.push(format!("attribute `{}` is declared as {} but requested as {}", declared.name(), declared.ty(), entry.attribute().ty()));
				}
			}
		}

		if problems.is_empty() {
			Ok(Self { attributes, capabilities })
		} else {
			Err(crate::Error::Validation(problems.join(", ")))
		}
	}

	pub fn attributes(&self) -> &AttributeContainer {
		&self.attributes
	}

	pub fn capabilities(&self) -> &[CapabilitySelector] {
		&self.capabilities
	}
}

/// Verdict for one attribute of one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessedAttribute {
	attribute: Attribute,
	requested: Option<AttributeValue>,
	candidate: Option<AttributeValue>,
	verdict: MatchVerdict,
}

impl AssessedAttribute {
	pub fn attribute(&self) -> &Attribute {
		&self.attribute
	}

	pub fn requested(&self) -> Option<&AttributeValue> {
		self.requested.as_ref()
	}

	pub fn candidate(&self) -> Option<&AttributeValue> {
		self.candidate.as_ref()
	}

	pub fn verdict(&self) -> MatchVerdict {
		self.verdict
	}

	/// Requested but not declared by the candidate.
	pub fn is_missing(&self) -> bool {
		self.requested.is_some() && self.candidate.is_none()
	}
}

impl std::fmt::Display for AssessedAttribute {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = self.attribute.name();
		match (&self.requested, &self.candidate) {
			(Some(r), Some(c)) if self.verdict == MatchVerdict::Compatible => write!(f, "{name}: compatible, requested {r} and found {c}"),
			(Some(r), Some(c)) => write!(f, "{name}: incompatible, requested {r} but found {c}"),
			(Some(r), None) if self.verdict == MatchVerdict::Compatible => write!(f, "{name}: compatible, requested {r} and not declared"),
			(Some(r), None) => write!(f, "{name}: incompatible, requested {r} but not declared"),
			(None, Some(c)) => write!(f, "{name}: provides {c}"),
			(None, None) => write!(f, "{name}"),
		}
	}
}

/// How a candidate fared against the requested attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessedCandidate {
	name: String,
	attributes: AttributeContainer,
	capabilities: Vec<Capability>,
	assessed: Vec<AssessedAttribute>,
}

impl AssessedCandidate {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn attributes(&self) -> &AttributeContainer {
		&self.attributes
	}

	pub fn capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	/// One record per attribute, requested or declared, in name order.
	pub fn assessed_attributes(&self) -> &[AssessedAttribute] {
		&self.assessed
	}

	pub fn is_compatible(&self) -> bool {
		self.assessed.iter().all(|a| a.verdict != MatchVerdict::Incompatible)
	}

	pub fn compatible_attributes(&self) -> impl Iterator<Item = &AssessedAttribute> {
		self.assessed.iter().filter(|a| a.verdict == MatchVerdict::Compatible)
	}

	pub fn incompatible_attributes(&self) -> impl Iterator<Item = &AssessedAttribute> {
		self.assessed.iter().filter(|a| a.verdict == MatchVerdict::Incompatible)
	}

	/// Attributes the candidate declares that weren't asked for.
	pub fn extra_attributes(&self) -> impl Iterator<Item = &AssessedAttribute> {
		self.assessed.iter().filter(|a| a.verdict == MatchVerdict::NotRequested)
	}

	pub fn verdict_for(&self, name: &str) -> Option<MatchVerdict> {
		self.assessed.iter().find(|a| a.attribute.name() == name).map(|a| a.verdict)
	}
}

impl std::fmt::Display for AssessedCandidate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "'{}'", self.name)?;
		for a in &self.assessed {
			writeln!(f, "  - {a}")?;
		}
		Ok(())
	}
}

/// Internal outcome of a selection step, either a typed failure or an error that still has to be wrapped.
#[derive(Debug)]
pub(crate) enum Rejection {
	Failure(ResolutionFailure),
	Error(SelectionError),
}

impl From<ResolutionFailure> for Rejection {
	fn from(value: ResolutionFailure) -> Self {
		Rejection::Failure(value)
	}
}

impl From<SelectionError> for Rejection {
	fn from(value: SelectionError) -> Self {
		Rejection::Error(value)
	}
}
