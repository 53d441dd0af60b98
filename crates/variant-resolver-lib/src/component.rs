//! Components and the variants they offer.
//!
//! Everything here is immutable once built. A derived variant, such as the output of an
//! artifact transform, is always a new value.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::attribute::AttributeContainer;
use crate::capability::*;

/// The `group:name:version` coordinates of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleCoordinates {
	group: String,
	name: String,
	version: ComponentVersion,
}

impl ModuleCoordinates {
	pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
		Self { group: group.into(), name: name.into(), version: ComponentVersion::new(version) }
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> &ComponentVersion {
		&self.version
	}

	/// The capability every variant provides unless it declares its own.
	pub fn default_capability(&self) -> Capability {
		Capability::new(self.group.as_str(), self.name.as_str(), Some(self.version.clone()))
	}
}

impl std::fmt::Display for ModuleCoordinates {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.group, self.name, self.version)
	}
}

/// Identifies the owner of a set of variants, used for diagnostics and lookups only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ComponentIdentifier {
	Module(ModuleCoordinates),
	Project {
		build: String,
		path: String,
	},
}

impl ComponentIdentifier {
	pub fn module(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
		ComponentIdentifier::Module(ModuleCoordinates::new(group, name, version))
	}

	pub fn project(build: impl Into<String>, path: impl Into<String>) -> Self {
		ComponentIdentifier::Project { build: build.into(), path: path.into() }
	}

	pub fn display_name(&self) -> String {
		self.to_string()
	}
}

impl std::fmt::Display for ComponentIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ComponentIdentifier::Module(m) => write!(f, "{}", m),
			ComponentIdentifier::Project { build, path } if build == ":" => write!(f, "project {}", path),
			ComponentIdentifier::Project { build, path } => write!(f, "project :{}{}", build, path),
		}
	}
}

/// What a dependency asks of its target component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRequest {
	target: ComponentIdentifier,
	#[serde(default)]
	attributes: AttributeContainer,
	#[serde(default)]
	capabilities: Vec<CapabilitySelector>,
	/// Asks for a configuration by name instead of selecting a variant by attributes.
	#[serde(default)]
	configuration: Option<String>,
	/// Failures of optional requests are dropped rather than reported.
	#[serde(default)]
	optional: bool,
}

impl DependencyRequest {
	pub fn new(target: ComponentIdentifier) -> Self {
		Self { target, attributes: Default::default(), capabilities: Default::default(), configuration: None, optional: false }
	}

	pub fn with_attributes(mut self, attributes: AttributeContainer) -> Self {
		self.attributes = attributes;
		self
	}

	pub fn with_capability(mut self, selector: CapabilitySelector) -> Self {
		self.capabilities.push(selector);
		self
	}

	pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
		self.configuration = Some(configuration.into());
		self
	}

	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	pub fn target(&self) -> &ComponentIdentifier {
		&self.target
	}

	pub fn attributes(&self) -> &AttributeContainer {
		&self.attributes
	}

	pub fn capabilities(&self) -> &[CapabilitySelector] {
		&self.capabilities
	}

	pub fn configuration(&self) -> Option<&str> {
		self.configuration.as_deref()
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}
}

/// A set of files with their own attributes, published by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVariant {
	name: String,
	#[serde(default)]
	attributes: AttributeContainer,
	#[serde(default)]
	files: Vec<String>,
}

impl ArtifactVariant {
	pub fn new(name: impl Into<String>, attributes: AttributeContainer, files: impl IntoIterator<Item = String>) -> Self {
		Self { name: name.into(), attributes, files: files.into_iter().collect() }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn attributes(&self) -> &AttributeContainer {
		&self.attributes
	}

	pub fn files(&self) -> &[String] {
		&self.files
	}
}

/// One selectable form of a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
	name: String,
	#[serde(default)]
	attributes: AttributeContainer,
	#[serde(default)]
	capabilities: Vec<Capability>,
	#[serde(default)]
	dependencies: Vec<DependencyRequest>,
	#[serde(default)]
	artifacts: Vec<ArtifactVariant>,
}

impl Variant {
	pub fn builder(name: impl Into<String>) -> VariantBuilder {
		VariantBuilder {
			variant: Variant {
				name: name.into(),
				attributes: Default::default(),
				capabilities: Default::default(),
				dependencies: Default::default(),
				artifacts: Default::default(),
			}
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn attributes(&self) -> &AttributeContainer {
		&self.attributes
	}

	/// Declared capabilities, once part of a [`Component`] this is never empty.
	pub fn capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	pub fn dependencies(&self) -> &[DependencyRequest] {
		&self.dependencies
	}

	pub fn artifacts(&self) -> &[ArtifactVariant] {
		&self.artifacts
	}
}

#[derive(Debug)]
pub struct VariantBuilder {
	variant: Variant,
}

impl VariantBuilder {
	pub fn attributes(mut self, attributes: AttributeContainer) -> Self {
		self.variant.attributes = attributes;
		self
	}

	pub fn capability(mut self, capability: Capability) -> Self {
		self.variant.capabilities.push(capability);
		self
	}

	pub fn dependency(mut self, dependency: DependencyRequest) -> Self {
		self.variant.dependencies.push(dependency);
		self
	}

	pub fn artifact(mut self, artifact: ArtifactVariant) -> Self {
		self.variant.artifacts.push(artifact);
		self
	}

	pub fn build(self) -> Variant {
		self.variant
	}
}

/// A variant that can also be requested by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
	variant: Variant,
	/// Configurations that aren't consumable exist for the owning build only.
	#[serde(default = "consumable_default")]
	consumable: bool,
}

fn consumable_default() -> bool { true }

impl Configuration {
	pub fn new(variant: Variant, consumable: bool) -> Self {
		Self { variant, consumable }
	}

	pub fn name(&self) -> &str {
		self.variant.name()
	}

	pub fn variant(&self) -> &Variant {
		&self.variant
	}

	pub fn is_consumable(&self) -> bool {
		self.consumable
	}
}

/// A component with its candidate variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComponentData")]
pub struct Component {
	id: ComponentIdentifier,
	coordinates: ModuleCoordinates,
	variants: Vec<Variant>,
	configurations: Vec<Configuration>,
}

#[doc(hidden)]
#[derive(Deserialize)]
pub struct ComponentData {
	id: ComponentIdentifier,
	coordinates: ModuleCoordinates,
	#[serde(default)]
	variants: Vec<Variant>,
	#[serde(default)]
	configurations: Vec<Configuration>,
}

impl TryFrom<ComponentData> for Component {
	type Error = crate::Error;
	fn try_from(value: ComponentData) -> Result<Self, Self::Error> {
		let builder = value.variants.into_iter().fold(Component::builder(value.id, value.coordinates), |b, v| b.variant(v));
		value.configurations.into_iter().fold(builder, |b, c| b.configuration(c)).build()
	}
}

impl Component {
	pub fn builder(id: ComponentIdentifier, coordinates: ModuleCoordinates) -> ComponentBuilder {
		ComponentBuilder { id, coordinates, variants: Default::default(), configurations: Default::default() }
	}

	/// A builder for a published module, identified by its coordinates.
	pub fn module(coordinates: ModuleCoordinates) -> ComponentBuilder {
		Self::builder(ComponentIdentifier::Module(coordinates.clone()), coordinates)
	}

	pub fn id(&self) -> &ComponentIdentifier {
		&self.id
	}

	pub fn coordinates(&self) -> &ModuleCoordinates {
		&self.coordinates
	}

	pub fn variants(&self) -> &[Variant] {
		&self.variants
	}

	pub fn variant(&self, name: &str) -> Option<&Variant> {
		self.variants.iter().find(|v| v.name == name)
	}

	pub fn configurations(&self) -> &[Configuration] {
		&self.configurations
	}

	pub fn configuration(&self, name: &str) -> Option<&Configuration> {
		self.configurations.iter().find(|c| c.name() == name)
	}

	pub fn default_capability(&self) -> Capability {
		self.coordinates.default_capability()
	}
}

#[derive(Debug)]
pub struct ComponentBuilder {
	id: ComponentIdentifier,
	coordinates: ModuleCoordinates,
	variants: Vec<Variant>,
	configurations: Vec<Configuration>,
}

impl ComponentBuilder {
	pub fn variant(mut self, variant: Variant) -> Self {
		self.variants.push(variant);
		self
	}

	pub fn configuration(mut self, configuration: Configuration) -> Self {
		self.configurations.push(configuration);
		self
	}

	/// Checks names are unique and gives variants without capabilities the component's own.
	pub fn build(self) -> crate::Result<Component> {
		fn check_unique<'a>(kind: &str, id: &ComponentIdentifier, names: impl Iterator<Item = &'a str>) -> crate::Result<()> {
			let mut seen = BTreeSet::new();
			for name in names {
				if !seen.insert(name) {
					return Err(crate::Error::Validation(format!("{} `{}` declared twice in {}", kind, name, id)))
				}
			}
			Ok(())
		}
		check_unique("variant", &self.id, self.variants.iter().map(|v| v.name()))?;
		check_unique("configuration", &self.id, self.configurations.iter().map(|c| c.name()))?;

		let default = self.coordinates.default_capability();
		let with_default = |mut v: Variant| {
			if v.capabilities.is_empty() {
				v.capabilities.push(default.clone());
			}
			v
		};

		Ok(Component {
			variants: self.variants.into_iter().map(with_default).collect(),
			configurations: self.configurations.into_iter().map(|c| Configuration { variant: with_default(c.variant), consumable: c.consumable }).collect(),
			id: self.id,
			coordinates: self.coordinates,
		})
	}
}

/// In-memory component metadata the graph resolver reads from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Component>", into = "Vec<Component>")]
pub struct ComponentRepository {
	components: BTreeMap<ComponentIdentifier, Arc<Component>>,
}

impl From<Vec<Component>> for ComponentRepository {
	fn from(value: Vec<Component>) -> Self {
		value.into_iter().fold(ComponentRepository::new(), |mut r, c| { r.insert(c); r })
	}
}

impl From<ComponentRepository> for Vec<Component> {
	fn from(value: ComponentRepository) -> Self {
		value.components.into_values().map(|c| Arc::try_unwrap(c).unwrap_or_else(|c| (*c).clone())).collect()
	}
}

impl ComponentRepository {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `component`, replacing any component with the same identifier.
	pub fn insert(&mut self, component: Component) {
		self.components.insert(component.id.clone(), Arc::new(component));
	}

	pub fn get(&self, id: &ComponentIdentifier) -> Option<&Arc<Component>> {
		self.components.get(id)
	}

	pub fn len(&self) -> usize {
		self.components.len()
	}

	pub fn is_empty(&self) -> bool {
		self.components.is_empty()
	}

	pub fn from_json(json: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn load_from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		let data = std::fs::read_to_string(path)?;
		Self::from_json(&data)
	}
}
