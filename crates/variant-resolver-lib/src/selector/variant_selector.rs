use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::capability::satisfies_all;
use crate::component::{Component, ComponentIdentifier, Configuration, Variant};
use crate::config::ResolverOptions;
use crate::failure::*;

/// Chooses variants of components against a fixed [`AttributeMatchingSchema`].
///
/// Cheap to clone, every clone shares the same schema.
#[derive(Debug, Clone)]
pub struct VariantSelector {
	schema: Arc<AttributeMatchingSchema>,
	prefer_default_capability: bool,
}

impl VariantSelector {
	pub fn new(schema: Arc<AttributeMatchingSchema>) -> Self {
		Self { schema, prefer_default_capability: true }
	}

	pub fn with_options(schema: Arc<AttributeMatchingSchema>, options: &ResolverOptions) -> Self {
		Self { schema, prefer_default_capability: options.prefer_default_capability() }
	}

	pub fn schema(&self) -> &AttributeMatchingSchema {
		&self.schema
	}

	pub(crate) fn shared_schema(&self) -> &Arc<AttributeMatchingSchema> {
		&self.schema
	}

	pub fn assessor(&self) -> ResolutionCandidateAssessor<'_> {
		ResolutionCandidateAssessor::new(&self.schema)
	}

	/// Selects exactly one graph variant of `component`.
	///
	/// # Steps
	/// 1. Variants not providing every requested capability are dropped.
	/// 1. Variants incompatible with any requested attribute are dropped.
	/// 1. Disambiguation rules narrow what is left, then the capability tie-break.
	pub fn select<'c>(&self, component: &'c Component, request: &SelectionRequest) -> Result<&'c Variant, ResolutionFailure> {
		guarded(component.id(), SelectionStage::Graph, || self.try_select(component, request))
	}

	fn try_select<'c>(&self, component: &'c Component, request: &SelectionRequest) -> Result<&'c Variant, Rejection> {
		let context = || SelectionContext::new(component.id().clone(), request.attributes().clone(), request.capabilities().to_vec());
		let assessor = self.assessor();
		let all: Vec<&Variant> = component.variants().iter().collect();

		let candidates = if request.capabilities().is_empty() {
			all
		} else {
			let matching: Vec<&Variant> = all.iter().copied()
				.filter(|v| satisfies_all(request.capabilities(), component.coordinates(), v.capabilities()))
				.collect();
			if matching.is_empty() {
				let assessed = assessor.assess(request.attributes(), all.iter().copied())?;
				return Err(ResolutionFailure::NoVariantsWithMatchingCapabilities(NoVariantsWithMatchingCapabilities::new(context(), assessed)).into())
			}
			matching
		};

		let assessed = assessor.assess(request.attributes(), candidates.iter().copied())?;
		let compatible: Vec<&Variant> = candidates.iter().copied()
			.zip(assessed.iter())
			.filter(|(_, a)| a.is_compatible())
			.map(|(v, _)| v)
			.collect();

		match compatible.len() {
			0 => return Err(ResolutionFailure::NoCompatibleVariants(NoCompatibleVariants::new(context(), assessed)).into()),
			1 => return Ok(compatible[0]),
			_ => {},
		}

		let remaining = disambiguation::narrow(&self.schema, request.attributes(), compatible)?;
		let remaining = self.prefer_capabilities(component, request, remaining);
		if let [selected] = remaining.as_slice() {
			log::trace!("selected variant '{}' of {}", selected.name(), component.id());
			return Ok(*selected)
		}

		let (tied, discarded): (Vec<AssessedCandidate>, Vec<AssessedCandidate>) = candidates.iter().copied()
			.zip(assessed)
			.filter(|(v, a)| !a.is_compatible() || remaining.iter().any(|r| std::ptr::eq(*r, *v)))
			.map(|(_, a)| a)
			.partition(|a| a.is_compatible());
		let capability_conflict = remaining.windows(2).any(|w| {
			let lhs: BTreeSet<&Capability> = w[0].capabilities().iter().collect();
			let rhs: BTreeSet<&Capability> = w[1].capabilities().iter().collect();
			lhs != rhs
		});

		Err(ResolutionFailure::AmbiguousVariants(AmbiguousVariants::new(context(), tied, discarded, capability_conflict)).into())
	}

	/// Breaks ties between variants that only differ in the capabilities they provide.
	///
	/// Without requested capabilities, variants providing only the component's own capability win when enabled.
	/// With requested capabilities, variants providing exactly as many capabilities as requested win.
	fn prefer_capabilities<'c>(&self, component: &Component, request: &SelectionRequest, remaining: Vec<&'c Variant>) -> Vec<&'c Variant> {
		if remaining.len() <= 1 { return remaining }

		let preferred: Vec<&Variant> = if request.capabilities().is_empty() {
			if !self.prefer_default_capability { return remaining }
			let coordinates = component.coordinates();
			remaining.iter().copied().filter(|v| {
				matches!(v.capabilities(), [only] if only.group() == coordinates.group() && only.name() == coordinates.name())
			}).collect()
		} else {
			remaining.iter().copied().filter(|v| v.capabilities().len() == request.capabilities().len()).collect()
		};

		if preferred.is_empty() { remaining } else { preferred }
	}

	/// Selects a configuration requested by name, bypassing attribute based selection.
	///
	/// The configuration still has to be consumable and compatible with `requested`.
	pub fn select_configuration<'c>(&self, component: &'c Component, name: &str, requested: &AttributeContainer, origin: ConfigurationOrigin) -> Result<&'c Configuration, ResolutionFailure> {
		guarded(component.id(), SelectionStage::Configuration, || {
			let Some(configuration) = component.configuration(name) else {
				return Err(ResolutionFailure::ConfigurationNotFound(ConfigurationNotFound::new(component.id().clone(), name.to_string(), origin)).into())
			};
			if !configuration.is_consumable() {
				return Err(ResolutionFailure::ConfigurationNotConsumable(ConfigurationNotConsumable::new(component.id().clone(), name.to_string())).into())
			}

			let assessed = self.assessor().assess_candidate(requested, configuration)?;
			if !assessed.is_compatible() {
				return Err(ResolutionFailure::ConfigurationNotCompatible(ConfigurationNotCompatible::new(component.id().clone(), name.to_string(), requested.clone(), assessed)).into())
			}
			Ok(configuration)
		})
	}

	/// Checks that variants of one component selected by different requests can be used together.
	///
	/// Every pair must be compatible on each attribute both declare.
	pub fn check_selected_variants(&self, component: &Component, selected: &[&Variant]) -> Result<(), ResolutionFailure> {
		guarded(component.id(), SelectionStage::Graph, || {
			let mut conflicting = false;
			'pairs: for (i, lhs) in selected.iter().enumerate() {
				for rhs in &selected[i + 1..] {
					for entry in lhs.attributes().iter() {
						let Some(other) = rhs.attributes().entry(entry.attribute().name()) else { continue };
						if !self.schema.values_compatible(entry, other)? {
							log::debug!("variants '{}' and '{}' of {} disagree on `{}`", lhs.name(), rhs.name(), component.id(), entry.attribute().name());
							conflicting = true;
							break 'pairs;
						}
					}
				}
			}

			if conflicting {
				let reference = selected.first().map(|v| v.attributes().clone()).unwrap_or_default();
				let assessed = self.assessor().assess(&reference, selected.iter().copied())?;
				return Err(ResolutionFailure::IncompatibleMultipleNodeSelection(
					IncompatibleMultipleNodeSelection::new(component.id().clone(), self.schema.clone(), assessed)
				).into())
			}
			Ok(())
		})
	}
}

/// Runs a selection step and turns whatever goes wrong into a [`ResolutionFailure`].
///
/// Rule errors and panics become [`ResolutionFailure::UnknownSelection`].
pub(super) fn guarded<T>(target: &ComponentIdentifier, stage: SelectionStage, f: impl FnOnce() -> Result<T, Rejection>) -> Result<T, ResolutionFailure> {
	let cause = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
		Ok(Ok(selected)) => return Ok(selected),
		Ok(Err(Rejection::Failure(failure))) => return Err(failure),
		Ok(Err(Rejection::Error(e))) => e,
		Err(payload) => SelectionError::from_panic(payload),
	};
	log::error!("{:?} selection for {} failed: {}", stage, target, cause);
	Err(ResolutionFailure::unknown(target.clone(), stage, cause))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::component::ModuleCoordinates;
	use crate::schema::*;
	use crate::RuleError;

	fn coords() -> ModuleCoordinates {
		ModuleCoordinates::new("org.example", "lib", "1.0")
	}

	fn usage(value: &str) -> AttributeContainer {
		AttributeContainer::builder().named("usage", value).build().unwrap()
	}

	fn component(variants: impl IntoIterator<Item = Variant>) -> Component {
		variants.into_iter().fold(Component::module(coords()), |b, v| b.variant(v)).build().unwrap()
	}

	fn selector(schema: AttributeMatchingSchema) -> VariantSelector {
		VariantSelector::new(Arc::new(schema))
	}

	fn request(selector: &VariantSelector, attributes: AttributeContainer) -> SelectionRequest {
		SelectionRequest::new(selector.schema(), attributes, vec![]).unwrap()
	}

	#[test] fn single_compatible_variant() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([
			Variant::builder("api").attributes(usage("api")).build(),
			Variant::builder("runtime").attributes(usage("runtime")).build(),
		]);
		let selected = selector.select(&c, &request(&selector, usage("runtime"))).unwrap();
		assert_eq!(selected.name(), "runtime");
	}
	#[test] fn no_compatible_variant_lists_all() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([Variant::builder("api").attributes(usage("api")).build()]);
		let failure = selector.select(&c, &request(&selector, usage("runtime"))).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::NoCompatibleVariants);
		assert_eq!(failure.assessed_candidates().len(), 1);
	}
	#[test] fn ties_are_ambiguous() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([
			Variant::builder("a").attributes(usage("api")).build(),
			Variant::builder("b").attributes(usage("api")).build(),
			Variant::builder("c").attributes(usage("runtime")).build(),
		]);
		let failure = selector.select(&c, &request(&selector, usage("api"))).unwrap_err();
		let ResolutionFailure::AmbiguousVariants(ambiguous) = failure else { panic!("expected ambiguity") };
		assert_eq!(ambiguous.candidates().iter().map(|c| c.name()).collect::<Vec<_>>(), vec!["a", "b"]);
		assert_eq!(ambiguous.discarded().iter().map(|c| c.name()).collect::<Vec<_>>(), vec!["c"]);
		assert!(!ambiguous.capability_conflict());
	}
	#[test] fn rule_error_becomes_unknown_selection() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::named("usage"), |s| s.compatibility(compatibility_fn("broken", |_, _| Err(RuleError::new("broken")))))
			.build().unwrap();
		let selector = selector(schema);
		let c = component([Variant::builder("api").attributes(usage("api")).build()]);
		let failure = selector.select(&c, &request(&selector, usage("api"))).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::UnknownSelection);
	}
	#[test] fn panicking_rule_becomes_unknown_selection() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::named("usage"), |s| s.compatibility(compatibility_fn("panics", |_, _| panic!("rule exploded"))))
			.build().unwrap();
		let selector = selector(schema);
		let c = component([Variant::builder("api").attributes(usage("api")).build()]);
		let ResolutionFailure::UnknownSelection(unknown) = selector.select(&c, &request(&selector, usage("api"))).unwrap_err() else { panic!("expected unknown selection") };
		assert_eq!(unknown.cause(), &SelectionError::Panicked("rule exploded".to_string()));
	}
	#[test] fn default_capability_breaks_tie() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([
			Variant::builder("main").attributes(usage("api")).build(),
			Variant::builder("fixtures").attributes(usage("api")).capability(Capability::new("org.example", "lib-test-fixtures", None)).build(),
		]);
		assert_eq!(selector.select(&c, &request(&selector, usage("api"))).unwrap().name(), "main");
	}
	#[test] fn configuration_not_found() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([]);
		let failure = selector.select_configuration(&c, "compile", &AttributeContainer::empty(), ConfigurationOrigin::Local).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::ConfigurationNotFound);
	}
	#[test] fn configuration_not_consumable() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = Component::module(coords())
			.configuration(Configuration::new(Variant::builder("internal").build(), false))
			.build().unwrap();
		let failure = selector.select_configuration(&c, "internal", &AttributeContainer::empty(), ConfigurationOrigin::Local).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::ConfigurationNotConsumable);
	}
	#[test] fn configuration_must_be_compatible() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = Component::module(coords())
			.configuration(Configuration::new(Variant::builder("default").attributes(usage("api")).build(), true))
			.build().unwrap();
		assert!(selector.select_configuration(&c, "default", &usage("api"), ConfigurationOrigin::Local).is_ok());
		let failure = selector.select_configuration(&c, "default", &usage("runtime"), ConfigurationOrigin::Local).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::ConfigurationNotCompatible);
	}
	#[test] fn conflicting_selected_variants() {
		let selector = selector(AttributeMatchingSchema::empty());
		let c = component([
			Variant::builder("api").attributes(usage("api")).build(),
			Variant::builder("runtime").attributes(usage("runtime")).build(),
		]);
		let selected: Vec<&Variant> = c.variants().iter().collect();
		let failure = selector.check_selected_variants(&c, &selected).unwrap_err();
		assert_eq!(failure.kind(), FailureKind::IncompatibleMultipleNodeSelection);
		assert!(selector.check_selected_variants(&c, &selected[..1]).is_ok());
	}
}
