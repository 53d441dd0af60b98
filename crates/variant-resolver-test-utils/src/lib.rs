//! Fixtures shared by the integration tests.
//!
//! Builders here panic on bad input, they only ever see fixtures written by hand.
//! Anything touching the filesystem returns a result instead.

use std::io::Write;
use std::sync::Arc;

use variant_resolver::attribute::*;
use variant_resolver::component::*;
use variant_resolver::schema::*;

/// A schema shaped like a JVM build:
/// - `usage` (named): `api` requests also accept `runtime`, exact matches win.
/// - `jvm` (integer): candidates built for an older or equal version are compatible, the newest wins.
/// - `debug` (boolean): undeclared is fine, release builds win.
/// - `usage` is disambiguated first.
pub fn jvm_schema() -> Arc<AttributeMatchingSchema> {
	let schema = AttributeMatchingSchema::builder()
		.attribute(Attribute::named("usage"), |s| s
			.compatibility(AcceptedValuesRule::new().accept(AttributeValue::named("api"), AttributeValue::named("runtime"))))
		.attribute(Attribute::integer("jvm"), |s| s
			.compatibility(AtMostRule)
			.disambiguation(PreferHighestRule))
		.attribute(Attribute::boolean("debug"), |s| s
			.disambiguation(PreferValuesRule::new([false.into()]))
			.missing(MissingValuePolicy::Compatible))
		.precedence(["usage"])
		.build()
		.expect("fixture schema is valid");
	Arc::new(schema)
}

/// The same schema as [`jvm_schema()`] as a serialized definition.
pub const JVM_SCHEMA_JSON: &str = r#"{
	"attributes": [
		{ "name": "usage", "type": "named",
		  "compatibility": { "rule": "accepted-values", "accepts": [ { "requested": "api", "candidates": ["runtime"] } ] } },
		{ "name": "jvm", "type": "integer", "compatibility": { "rule": "at-most" }, "disambiguation": { "rule": "prefer-highest" } },
		{ "name": "debug", "type": "boolean", "disambiguation": { "rule": "prefer-values", "order": [false] }, "missing": "compatible" }
	],
	"precedence": ["usage"]
}"#;

/// Attributes from `name=value` pairs, typed by `schema`.
///
/// `true`/`false` become booleans, numbers integers, everything else a named value.
pub fn attrs(schema: &AttributeMatchingSchema, pairs: &[(&str, &str)]) -> AttributeContainer {
	let raw = pairs.iter().map(|(name, value)| {
		let value = if let Ok(b) = value.parse::<bool>() {
			AttributeValue::from(b)
		} else if let Ok(i) = value.parse::<i64>() {
			AttributeValue::from(i)
		} else {
			AttributeValue::named(*value)
		};
		(name.to_string(), value)
	}).collect();
	schema.typed_container(&raw).expect("fixture attributes are valid")
}

pub fn coordinates(name: &str) -> ModuleCoordinates {
	ModuleCoordinates::new("org.example", name, "1.0")
}

pub fn module_id(name: &str) -> ComponentIdentifier {
	ComponentIdentifier::Module(coordinates(name))
}

pub fn variant(name: &str, attributes: AttributeContainer) -> VariantBuilder {
	Variant::builder(name).attributes(attributes)
}

/// A module `org.example:<name>:1.0` offering `variants`.
pub fn library(name: &str, variants: impl IntoIterator<Item = Variant>) -> Component {
	variants.into_iter()
		.fold(Component::module(coordinates(name)), |b, v| b.variant(v))
		.build()
		.expect("fixture component is valid")
}

/// A library with the usual `apiElements`/`runtimeElements` pair, both depending on `dependencies`.
pub fn java_library(schema: &AttributeMatchingSchema, name: &str, dependencies: &[&str]) -> Component {
	let variants = [("apiElements", "api"), ("runtimeElements", "runtime")].map(|(variant_name, usage)| {
		dependencies.iter().fold(variant(variant_name, attrs(schema, &[("usage", usage), ("jvm", "8")])), |b, d| {
			b.dependency(DependencyRequest::new(module_id(d)).with_attributes(attrs(schema, &[("usage", usage)])))
		}).build()
	});
	library(name, variants)
}

pub fn repository(components: impl IntoIterator<Item = Component>) -> Arc<ComponentRepository> {
	let mut repository = ComponentRepository::new();
	for c in components {
		repository.insert(c);
	}
	Arc::new(repository)
}

/// Writes `contents` to a temporary file that lives as long as the returned handle.
pub fn write_fixture(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
	let mut file = tempfile::NamedTempFile::new()?;
	file.write_all(contents.as_bytes())?;
	file.flush()?;
	Ok(file)
}

/// Writes `repository` as JSON to a temporary file.
pub fn write_repository(repository: &ComponentRepository) -> std::io::Result<tempfile::NamedTempFile> {
	let json = serde_json::to_string_pretty(repository)?;
	write_fixture(&json)
}
