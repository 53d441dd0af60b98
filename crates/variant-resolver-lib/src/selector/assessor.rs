use std::collections::BTreeSet;

use super::*;
use crate::component::{ArtifactVariant, Configuration, Variant};

impl Candidate for Variant {
	fn name(&self) -> &str { Variant::name(self) }
	fn attributes(&self) -> &AttributeContainer { Variant::attributes(self) }
	fn capabilities(&self) -> &[Capability] { Variant::capabilities(self) }
}

impl Candidate for ArtifactVariant {
	fn name(&self) -> &str { ArtifactVariant::name(self) }
	fn attributes(&self) -> &AttributeContainer { ArtifactVariant::attributes(self) }
}

impl Candidate for Configuration {
	fn name(&self) -> &str { Configuration::name(self) }
	fn attributes(&self) -> &AttributeContainer { self.variant().attributes() }
	fn capabilities(&self) -> &[Capability] { self.variant().capabilities() }
}

/// Builds the per attribute breakdown of candidates against requested attributes.
///
/// Assessing never filters, there is one [`AssessedCandidate`] per input in input order.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionCandidateAssessor<'s> {
	schema: &'s AttributeMatchingSchema,
}

impl<'s> ResolutionCandidateAssessor<'s> {
	pub fn new(schema: &'s AttributeMatchingSchema) -> Self {
		Self { schema }
	}

	pub fn assess_candidate<C: Candidate + ?Sized>(&self, requested: &AttributeContainer, candidate: &C) -> Result<AssessedCandidate, SelectionError> {
		let offered = candidate.attributes();
		let names: BTreeSet<&str> = requested.names().chain(offered.names()).collect();

		let mut assessed = Vec::with_capacity(names.len());
		for name in names {
			let r = requested.entry(name);
			let c = offered.entry(name);
			let verdict = self.schema.compatibility(r, c)?;
			/* One side always has it, `names` came from both */
			let Some(attribute) = r.or(c).map(|e| e.attribute().clone()) else { continue };
			assessed.push(AssessedAttribute {
				attribute,
				requested: r.map(|e| e.value().clone()),
				candidate: c.map(|e| e.value().clone()),
				verdict,
			});
		}

		Ok(AssessedCandidate {
			name: candidate.name().to_string(),
			attributes: offered.clone(),
			capabilities: candidate.capabilities().to_vec(),
			assessed,
		})
	}

	pub fn assess<'c, C: Candidate + ?Sized + 'c>(&self, requested: &AttributeContainer, candidates: impl IntoIterator<Item = &'c C>) -> Result<Vec<AssessedCandidate>, SelectionError> {
		candidates.into_iter().map(|c| self.assess_candidate(requested, c)).collect()
	}
}
