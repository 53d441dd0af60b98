//! Capabilities: the `group:name:version` identities a variant claims to provide.

use serde::{Serialize, Deserialize};

use crate::component::ModuleCoordinates;

mod version;
pub use version::ComponentVersion;
pub use version::ComponentVersionBounds;
pub use version::VersionBounds;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capability {
	group: String,
	name: String,
	#[serde(default)]
	version: Option<ComponentVersion>,
}

impl Capability {
	pub fn new(group: impl Into<String>, name: impl Into<String>, version: Option<ComponentVersion>) -> Self {
		Self { group: group.into(), name: name.into(), version }
	}

	pub fn group(&self) -> &str {
		&self.group
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> Option<&ComponentVersion> {
		self.version.as_ref()
	}
}

impl std::fmt::Display for Capability {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.version {
			Some(v) => write!(f, "{}:{}:{}", self.group, self.name, v),
			None => write!(f, "{}:{}", self.group, self.name),
		}
	}
}

/// Request side matcher for a capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CapabilitySelector {
	/// Matches on group and name, and the version when bounds are given.
	Specific {
		group: String,
		name: String,
		#[serde(default)]
		version: ComponentVersionBounds,
	},
	/// A feature of the target component, the capability `<group>:<name>-<feature>`.
	Feature {
		feature: String,
	},
}

impl CapabilitySelector {
	pub fn specific(group: impl Into<String>, name: impl Into<String>) -> Self {
		CapabilitySelector::Specific { group: group.into(), name: name.into(), version: VersionBounds::Any }
	}

	pub fn specific_version(group: impl Into<String>, name: impl Into<String>, version: ComponentVersionBounds) -> Self {
		CapabilitySelector::Specific { group: group.into(), name: name.into(), version }
	}

	pub fn feature(feature: impl Into<String>) -> Self {
		CapabilitySelector::Feature { feature: feature.into() }
	}

	pub fn matches(&self, component: &ModuleCoordinates, capability: &Capability) -> bool {
		match self {
			CapabilitySelector::Specific { group, name, version } => {
				if capability.group != *group || capability.name != *name {
					return false
				}
				match version {
					VersionBounds::Any => true,
					bounds => capability.version.as_ref().map_or(false, |v| bounds.is_version_within(v)),
				}
			},
			CapabilitySelector::Feature { feature } => {
				capability.group == component.group() && capability.name == format!("{}-{}", component.name(), feature)
			},
		}
	}

	/// `true` when any of `capabilities` matches.
	pub fn is_satisfied_by(&self, component: &ModuleCoordinates, capabilities: &[Capability]) -> bool {
		capabilities.iter().any(|c| self.matches(component, c))
	}
}

impl std::fmt::Display for CapabilitySelector {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CapabilitySelector::Specific { group, name, version: VersionBounds::Any } => write!(f, "{}:{}", group, name),
			CapabilitySelector::Specific { group, name, version } => write!(f, "{}:{}:{}", group, name, version),
			CapabilitySelector::Feature { feature } => write!(f, "feature '{}'", feature),
		}
	}
}

/// Checks every selector is satisfied by `capabilities`.
pub fn satisfies_all(selectors: &[CapabilitySelector], component: &ModuleCoordinates, capabilities: &[Capability]) -> bool {
	selectors.iter().all(|s| s.is_satisfied_by(component, capabilities))
}
