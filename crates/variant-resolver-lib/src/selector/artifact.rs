//! Choosing the artifact set of a selected graph variant, transforming artifacts when none fits.

use serde::Deserialize;

use super::*;
use super::variant_selector::guarded;
use crate::component::{ArtifactVariant, Component, Variant};
use crate::failure::*;

/// Turns artifacts carrying the `from` attributes into artifacts carrying the `to` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactTransform {
	name: String,
	from: AttributeContainer,
	to: AttributeContainer,
}

impl ArtifactTransform {
	pub fn new(name: impl Into<String>, from: AttributeContainer, to: AttributeContainer) -> Self {
		Self { name: name.into(), from, to }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn from_attributes(&self) -> &AttributeContainer {
		&self.from
	}

	pub fn to_attributes(&self) -> &AttributeContainer {
		&self.to
	}
}

/// The transforms available to artifact selection, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformRegistry {
	transforms: Vec<ArtifactTransform>,
}

impl TransformRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(mut self, transform: ArtifactTransform) -> Self {
		self.transforms.push(transform);
		self
	}

	pub fn iter(&self) -> impl Iterator<Item = &ArtifactTransform> {
		self.transforms.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.transforms.is_empty()
	}
}

/// An artifact set as it would look after applying a transform.
///
/// Always a new value, the source [`ArtifactVariant`] is left as it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformedVariant {
	name: String,
	source: String,
	source_attributes: AttributeContainer,
	transform: String,
	attributes: AttributeContainer,
	files: Vec<String>,
}

impl TransformedVariant {
	fn new(source: &ArtifactVariant, transform: &ArtifactTransform) -> Self {
		Self {
			name: format!("{} via {}", source.name(), transform.name()),
			source: source.name().to_string(),
			source_attributes: source.attributes().clone(),
			transform: transform.name().to_string(),
			attributes: source.attributes().overridden_by(transform.to_attributes()),
			files: source.files().to_vec(),
		}
	}

	/// Name of the artifact set the transform is applied to.
	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn source_attributes(&self) -> &AttributeContainer {
		&self.source_attributes
	}

	pub fn transform(&self) -> &str {
		&self.transform
	}

	/// Files of the source artifact set, to be fed to the transform.
	pub fn files(&self) -> &[String] {
		&self.files
	}
}

impl Candidate for TransformedVariant {
	fn name(&self) -> &str { &self.name }
	fn attributes(&self) -> &AttributeContainer { &self.attributes }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSelection<'c> {
	/// An artifact set of the variant matched as it is.
	Direct(&'c ArtifactVariant),
	/// Only a transformed artifact set matches.
	Transformed(TransformedVariant),
}

impl VariantSelector {
	/// Selects one artifact set of `variant`, the graph variant previously selected from `component`.
	///
	/// Artifact sets are matched like graph variants. When none is compatible, each registered transform
	/// is tried on each artifact set it accepts, and the results are matched instead.
	pub fn select_artifact<'c>(&self, component: &Component, variant: &'c Variant, requested: &AttributeContainer, transforms: &TransformRegistry) -> Result<ArtifactSelection<'c>, ResolutionFailure> {
		guarded(component.id(), SelectionStage::Artifact, || self.try_select_artifact(component, variant, requested, transforms))
	}

	fn try_select_artifact<'c>(&self, component: &Component, variant: &'c Variant, requested: &AttributeContainer, transforms: &TransformRegistry) -> Result<ArtifactSelection<'c>, Rejection> {
		let context = || ArtifactContext::new(component.id().clone(), variant.name().to_string(), requested.clone());
		let assessor = self.assessor();

		let assessed = assessor.assess(requested, variant.artifacts())?;
		let compatible: Vec<&ArtifactVariant> = variant.artifacts().iter()
			.zip(assessed.iter())
			.filter(|(_, a)| a.is_compatible())
			.map(|(v, _)| v)
			.collect();

		if !compatible.is_empty() {
			let remaining = disambiguation::narrow(self.schema(), requested, compatible)?;
			if let [selected] = remaining.as_slice() {
				return Ok(ArtifactSelection::Direct(*selected))
			}
			let (tied, discarded): (Vec<AssessedCandidate>, Vec<AssessedCandidate>) = variant.artifacts().iter()
				.zip(assessed)
				.filter(|(v, a)| !a.is_compatible() || remaining.iter().any(|r| std::ptr::eq(*r, *v)))
				.map(|(_, a)| a)
				.partition(|a| a.is_compatible());
			return Err(ResolutionFailure::AmbiguousArtifacts(AmbiguousArtifacts::new(context(), tied, discarded)).into())
		}

		let mut transformed = Vec::<TransformedVariant>::new();
		for artifact in variant.artifacts() {
			for transform in transforms.iter() {
				if !assessor.assess_candidate(transform.from_attributes(), artifact)?.is_compatible() { continue }
				let candidate = TransformedVariant::new(artifact, transform);
				if assessor.assess_candidate(requested, &candidate)?.is_compatible() {
					transformed.push(candidate);
				}
			}
		}

		if transformed.is_empty() {
			return Err(ResolutionFailure::NoCompatibleArtifact(NoCompatibleArtifact::new(context(), assessed)).into())
		}

		let remaining = disambiguation::narrow(self.schema(), requested, transformed.iter().collect())?;
		if let [selected] = remaining.as_slice() {
			log::debug!("using '{}' for variant '{}' of {}", selected.name(), variant.name(), component.id());
			return Ok(ArtifactSelection::Transformed((*selected).clone()))
		}
		let tied = remaining.into_iter().cloned().collect();
		Err(ResolutionFailure::AmbiguousArtifactTransforms(AmbiguousArtifactTransforms::new(context(), tied)).into())
	}
}
