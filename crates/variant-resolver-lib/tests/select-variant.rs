use std::sync::Arc;

use variant_resolver::*;
use variant_resolver::attribute::*;
use variant_resolver::capability::*;
use variant_resolver::component::*;
use variant_resolver::failure::*;
use variant_resolver::schema::*;
use variant_resolver::selector::TransformRegistry;
use variant_resolver_test_utils::*;

fn init() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn strings(pairs: &[(&str, &str)]) -> AttributeContainer {
	pairs.iter().fold(AttributeContainer::builder(), |b, (n, v)| b.string(n, v)).build().unwrap()
}

fn select<'c>(selector: &VariantSelector, component: &'c Component, attributes: AttributeContainer, capabilities: Vec<CapabilitySelector>) -> std::result::Result<&'c Variant, ResolutionFailure> {
	let request = SelectionRequest::new(selector.schema(), attributes, capabilities).unwrap();
	selector.select(component, &request)
}

fn plain_selector() -> VariantSelector {
	VariantSelector::new(Arc::new(AttributeMatchingSchema::empty()))
}

#[test]
fn exact_match_is_selected() {
	init();
	let selector = plain_selector();
	let c = library("lib", [
		variant("api", strings(&[("usage", "api")])).build(),
		variant("runtime", strings(&[("usage", "runtime")])).build(),
	]);

	let selected = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap();
	assert_eq!(selected.name(), "api");

	let assessed = selector.assessor().assess(&strings(&[("usage", "api")]), c.variants()).unwrap();
	assert_eq!(assessed[1].verdict_for("usage"), Some(MatchVerdict::Incompatible));
}

#[test]
fn undisambiguated_attribute_is_ambiguous() {
	init();
	let selector = plain_selector();
	let c = library("lib", [
		variant("debug", strings(&[("usage", "api"), ("debug", "true")])).build(),
		variant("release", strings(&[("usage", "api"), ("debug", "false")])).build(),
	]);

	let failure = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap_err();
	let ResolutionFailure::AmbiguousVariants(ambiguous) = &failure else { panic!("unexpected failure {failure}") };
	assert_eq!(ambiguous.candidates().len(), 2);
	assert!(ambiguous.candidates().iter().all(|c| c.verdict_for("usage") == Some(MatchVerdict::Compatible)));
	assert!(ambiguous.discarded().is_empty());
}

#[test]
fn disambiguation_rule_breaks_tie() {
	init();
	let schema = AttributeMatchingSchema::builder()
		.attribute(Attribute::string("debug"), |s| s.disambiguation(PreferValuesRule::new([AttributeValue::from("false")])))
		.build().unwrap();
	let selector = VariantSelector::new(Arc::new(schema));
	let c = library("lib", [
		variant("debug", strings(&[("usage", "api"), ("debug", "true")])).build(),
		variant("release", strings(&[("usage", "api"), ("debug", "false")])).build(),
	]);

	assert_eq!(select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap().name(), "release");
}

#[test]
fn unknown_capability_matches_nothing() {
	init();
	let selector = plain_selector();
	let c = library("lib", [variant("api", strings(&[("usage", "api")])).build()]);

	let failure = select(&selector, &c, strings(&[("usage", "api")]), vec![CapabilitySelector::specific("group", "does-not-exist")]).unwrap_err();
	assert_eq!(failure.kind(), FailureKind::NoVariantsWithMatchingCapabilities);
	assert!(failure.assessed_candidates().iter().all(|a| !a.capabilities().iter().any(|c| c.name() == "does-not-exist")));
}

#[test]
fn no_candidates_is_not_a_crash() {
	init();
	let selector = plain_selector();
	let c = library("empty", []);

	let failure = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap_err();
	assert_eq!(failure.kind(), FailureKind::NoCompatibleVariants);
	assert!(failure.assessed_candidates().is_empty());
}

#[test]
fn failing_rule_is_wrapped() {
	init();
	let schema = AttributeMatchingSchema::builder()
		.attribute(Attribute::string("usage"), |s| s.compatibility(compatibility_fn("throws", |_, _| Err(RuleError::new("rule failed")))))
		.build().unwrap();
	let selector = VariantSelector::new(Arc::new(schema));
	let c = library("lib", [variant("api", strings(&[("usage", "api")])).build()]);

	let failure = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap_err();
	let ResolutionFailure::UnknownSelection(unknown) = &failure else { panic!("unexpected failure {failure}") };
	assert!(matches!(unknown.cause(), SelectionError::CompatibilityRule { attribute, .. } if attribute == "usage"));
	assert!(std::error::Error::source(&failure).is_some());
}

#[test]
fn capability_selects_feature_variant() {
	init();
	let selector = plain_selector();
	let c = library("lib", [
		variant("main", strings(&[("usage", "api")])).build(),
		variant("fixtures", strings(&[("usage", "api")]))
			.capability(Capability::new("org.example", "lib-test-fixtures", Some("1.0".into())))
			.build(),
	]);

	let selected = select(&selector, &c, strings(&[("usage", "api")]), vec![CapabilitySelector::feature("test-fixtures")]).unwrap();
	assert_eq!(selected.name(), "fixtures");
	let selected = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap();
	assert_eq!(selected.name(), "main");
}

#[test]
fn differing_capabilities_flag_conflict() {
	init();
	let mut options = ResolverOptions::default();
	options.set_prefer_default_capability(false);
	let selector = VariantSelector::with_options(Arc::new(AttributeMatchingSchema::empty()), &options);
	let c = library("lib", [
		variant("main", strings(&[("usage", "api")])).build(),
		variant("fixtures", strings(&[("usage", "api")]))
			.capability(Capability::new("org.example", "lib-test-fixtures", None))
			.build(),
	]);

	let failure = select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap_err();
	let ResolutionFailure::AmbiguousVariants(ambiguous) = &failure else { panic!("unexpected failure {failure}") };
	assert!(ambiguous.capability_conflict());
}

#[test]
fn jvm_schema_prefers_newest_compatible() {
	init();
	let schema = jvm_schema();
	let selector = VariantSelector::new(schema.clone());
	let c = library("lib", [
		variant("jvm8", attrs(&schema, &[("usage", "runtime"), ("jvm", "8")])).build(),
		variant("jvm11", attrs(&schema, &[("usage", "runtime"), ("jvm", "11")])).build(),
		variant("jvm17", attrs(&schema, &[("usage", "runtime"), ("jvm", "17")])).build(),
	]);

	let selected = select(&selector, &c, attrs(&schema, &[("usage", "api"), ("jvm", "11")]), vec![]).unwrap();
	assert_eq!(selected.name(), "jvm11");

	let failure = select(&selector, &c, attrs(&schema, &[("usage", "api"), ("jvm", "6")]), vec![]).unwrap_err();
	assert_eq!(failure.kind(), FailureKind::NoCompatibleVariants);
	assert_eq!(failure.assessed_candidates().len(), 3);
}

#[test]
fn selection_is_deterministic() {
	init();
	let selector = plain_selector();
	let c = library("lib", [
		variant("a", strings(&[("usage", "api"), ("flavor", "x")])).build(),
		variant("b", strings(&[("usage", "api"), ("flavor", "y")])).build(),
		variant("c", strings(&[("usage", "runtime")])).build(),
	]);

	let first = select(&selector, &c, strings(&[("usage", "api")]), vec![]);
	for _ in 0..10 {
		assert_eq!(select(&selector, &c, strings(&[("usage", "api")]), vec![]), first);
	}
}

#[test]
fn compatibility_ignores_candidate_order() {
	init();
	let selector = plain_selector();
	let requested = strings(&[("usage", "api")]);
	let variants = [
		variant("a", strings(&[("usage", "api")])).build(),
		variant("b", strings(&[("usage", "runtime")])).build(),
		variant("c", strings(&[("usage", "api"), ("debug", "true")])).build(),
	];
	let compatible = |order: &[usize]| -> std::collections::BTreeSet<String> {
		let candidates: Vec<&Variant> = order.iter().map(|i| &variants[*i]).collect();
		let assessed = selector.assessor().assess(&requested, candidates.iter().copied()).unwrap();
		assert_eq!(assessed.iter().map(|a| a.name()).collect::<Vec<_>>(), candidates.iter().map(|v| v.name()).collect::<Vec<_>>());
		assessed.into_iter().filter(|a| a.is_compatible()).map(|a| a.name().to_string()).collect()
	};

	let expected = compatible(&[0, 1, 2]);
	assert_eq!(compatible(&[2, 1, 0]), expected);
	assert_eq!(compatible(&[1, 2, 0]), expected);
}

#[test]
fn assessment_covers_every_candidate() {
	init();
	let schema = jvm_schema();
	let selector = VariantSelector::new(schema.clone());
	let variants: Vec<Variant> = (0..5).map(|i| {
		let usage = if i % 2 == 0 { "api" } else { "runtime" };
		let jvm = (8 + i).to_string();
		variant(&format!("v{i}"), attrs(&schema, &[("usage", usage), ("jvm", jvm.as_str())])).build()
	}).collect();

	let assessed = selector.assessor().assess(&attrs(&schema, &[("usage", "api"), ("jvm", "10")]), &variants).unwrap();
	assert_eq!(assessed.len(), variants.len());
}

#[test]
fn disambiguation_only_narrows() {
	init();
	let schema = jvm_schema();
	let selector = VariantSelector::new(schema.clone());
	let c = library("lib", [
		variant("a", attrs(&schema, &[("usage", "api"), ("jvm", "8"), ("debug", "true")])).build(),
		variant("b", attrs(&schema, &[("usage", "api"), ("jvm", "8"), ("debug", "true")])).build(),
		variant("c", attrs(&schema, &[("usage", "runtime"), ("jvm", "8")])).build(),
	]);

	let failure = select(&selector, &c, attrs(&schema, &[("usage", "api"), ("jvm", "11")]), vec![]).unwrap_err();
	let ResolutionFailure::AmbiguousVariants(ambiguous) = &failure else { panic!("unexpected failure {failure}") };
	let compatible = selector.assessor().assess(&attrs(&schema, &[("usage", "api"), ("jvm", "11")]), c.variants()).unwrap()
		.into_iter().filter(|a| a.is_compatible()).count();
	assert!(ambiguous.candidates().len() <= compatible);
	assert_eq!(ambiguous.candidates().iter().map(|c| c.name()).collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn invalid_request_is_rejected_early() {
	init();
	let schema = AttributeMatchingSchema::builder()
		.attribute(Attribute::named("usage"), |s| s)
		.require("usage")
		.build().unwrap();
	assert!(matches!(SelectionRequest::new(&schema, AttributeContainer::empty(), vec![]), Err(Error::Validation(_))));
}

#[test]
fn preferred_value_beats_missing_value() {
	init();
	let schema = jvm_schema();
	let selector = VariantSelector::new(schema.clone());
	let c = library("lib", [
		variant("release", attrs(&schema, &[("usage", "api"), ("debug", "false")])).build(),
		variant("bare", attrs(&schema, &[("usage", "api")])).build(),
	]);

	let selected = select(&selector, &c, attrs(&schema, &[("usage", "api"), ("debug", "false")]), vec![]).unwrap();
	assert_eq!(selected.name(), "release");
	let selected = select(&selector, &c, attrs(&schema, &[("usage", "api")]), vec![]).unwrap();
	assert_eq!(selected.name(), "release");
}

#[test]
fn fewer_extra_attributes_break_tie() {
	init();
	let selector = plain_selector();
	let c = library("lib", [
		variant("flavored", strings(&[("usage", "api"), ("flavor", "x")])).build(),
		variant("plain", strings(&[("usage", "api")])).build(),
	]);

	assert_eq!(select(&selector, &c, strings(&[("usage", "api")]), vec![]).unwrap().name(), "plain");
}

fn flavored_selector(rule: impl DisambiguationRule + 'static) -> VariantSelector {
	let schema = AttributeMatchingSchema::builder()
		.attribute(Attribute::string("flavor"), |s| s.disambiguation(rule))
		.build().unwrap();
	VariantSelector::new(Arc::new(schema))
}

fn flavored_library() -> Component {
	library("lib", [
		variant("x", strings(&[("usage", "api"), ("flavor", "x")]))
			.artifact(ArtifactVariant::new("x-jar", strings(&[("artifactType", "jar"), ("flavor", "x")]), ["lib-x.jar".to_string()]))
			.artifact(ArtifactVariant::new("y-jar", strings(&[("artifactType", "jar"), ("flavor", "y")]), ["lib-y.jar".to_string()]))
			.build(),
		variant("y", strings(&[("usage", "api"), ("flavor", "y")])).build(),
	])
}

fn unknown_causes(selector: &VariantSelector) -> Vec<SelectionError> {
	let c = flavored_library();
	let graph = select(selector, &c, strings(&[("usage", "api")]), vec![]).unwrap_err();
	let artifact = selector.select_artifact(&c, &c.variants()[0], &strings(&[("artifactType", "jar")]), &TransformRegistry::new()).unwrap_err();
	[graph, artifact].into_iter().map(|failure| {
		assert_eq!(failure.kind(), FailureKind::UnknownSelection);
		let ResolutionFailure::UnknownSelection(unknown) = &failure else { panic!("unexpected failure {failure}") };
		unknown.cause().clone()
	}).collect()
}

#[test]
fn failing_disambiguation_rule_is_wrapped() {
	init();
	let selector = flavored_selector(disambiguation_fn("throws", |_, _| Err(RuleError::new("rule failed"))));
	for cause in unknown_causes(&selector) {
		assert!(matches!(cause, SelectionError::DisambiguationRule { ref attribute, .. } if attribute == "flavor"));
	}
}

#[test]
fn unoffered_disambiguation_values_are_wrapped() {
	init();
	let selector = flavored_selector(disambiguation_fn("invents", |_, _| Ok([AttributeValue::from("z")].into_iter().collect())));
	for cause in unknown_causes(&selector) {
		assert!(matches!(cause, SelectionError::UnofferedValues { ref attribute, .. } if attribute == "flavor"));
	}
}

#[test]
fn panicking_disambiguation_rule_is_wrapped() {
	init();
	let selector = flavored_selector(disambiguation_fn("panics", |_, _| panic!("rule exploded")));
	for cause in unknown_causes(&selector) {
		assert_eq!(cause, SelectionError::Panicked("rule exploded".to_string()));
	}
}
