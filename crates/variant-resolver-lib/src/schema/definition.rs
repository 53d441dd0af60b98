//! Serialized schema descriptions using the built-in rules.
//!
//! ```json
//! {
//!   "attributes": [
//!     { "name": "usage", "type": "named", "disambiguation": { "rule": "prefer-values", "order": ["api"] } },
//!     { "name": "jvm", "type": "integer", "compatibility": { "rule": "at-most" }, "disambiguation": { "rule": "prefer-highest" } }
//!   ],
//!   "precedence": ["usage"],
//!   "required": ["usage"]
//! }
//! ```

use serde::{Serialize, Deserialize};

use super::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
	#[serde(default)]
	pub attributes: Vec<AttributeDefinition>,
	#[serde(default)]
	pub precedence: Vec<String>,
	#[serde(default)]
	pub required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: AttributeType,
	#[serde(default)]
	pub compatibility: CompatibilityDefinition,
	#[serde(default)]
	pub disambiguation: Option<DisambiguationDefinition>,
	#[serde(default)]
	pub missing: MissingValuePolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum CompatibilityDefinition {
	#[default] Equality,
	AcceptAny,
	AtMost,
	AcceptedValues { accepts: Vec<AcceptedValues> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedValues {
	pub requested: AttributeValue,
	pub candidates: Vec<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum DisambiguationDefinition {
	PreferRequested,
	PreferValues { order: Vec<AttributeValue> },
	PreferHighest,
	PreferLowest,
}

impl SchemaDefinition {
	pub fn from_json(json: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn load_from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		let data = std::fs::read_to_string(path)?;
		Self::from_json(&data)
	}

	/// Builds the schema, values in the rules are typed using their attribute.
	pub fn build(&self) -> crate::Result<AttributeMatchingSchema> {
		let mut builder = AttributeMatchingSchema::builder();

		for definition in &self.attributes {
			let ty = definition.ty;
			let typed = |value: &AttributeValue| -> crate::Result<AttributeValue> {
				value.clone().coerce(ty).ok_or_else(|| crate::Error::Validation(
					format!("value `{}` in the rules of `{}` is not a {} value", value, definition.name, ty)
				))
			};

			let compatibility: Box<dyn FnOnce(StrategyBuilder) -> StrategyBuilder> = match &definition.compatibility {
				CompatibilityDefinition::Equality => Box::new(|s: StrategyBuilder| s.compatibility(EqualityRule)),
				CompatibilityDefinition::AcceptAny => Box::new(|s: StrategyBuilder| s.compatibility(AcceptAnyRule)),
				CompatibilityDefinition::AtMost => {
					if ty != AttributeType::Integer {
						return Err(crate::Error::Validation(format!("`at-most` rule used on {} attribute `{}`", ty, definition.name)))
					}
					Box::new(|s: StrategyBuilder| s.compatibility(AtMostRule))
				},
				CompatibilityDefinition::AcceptedValues { accepts } => {
					let mut rule = AcceptedValuesRule::new();
					for a in accepts {
						let requested = typed(&a.requested)?;
						for c in &a.candidates {
							rule = rule.accept(requested.clone(), typed(c)?);
						}
					}
					Box::new(move |s: StrategyBuilder| s.compatibility(rule))
				},
			};

			let disambiguation: Option<Box<dyn FnOnce(StrategyBuilder) -> StrategyBuilder>> = match &definition.disambiguation {
				None => None,
				Some(DisambiguationDefinition::PreferRequested) => Some(Box::new(|s: StrategyBuilder| s.disambiguation(PreferRequestedRule))),
				Some(DisambiguationDefinition::PreferHighest) => Some(Box::new(|s: StrategyBuilder| s.disambiguation(PreferHighestRule))),
				Some(DisambiguationDefinition::PreferLowest) => Some(Box::new(|s: StrategyBuilder| s.disambiguation(PreferLowestRule))),
				Some(DisambiguationDefinition::PreferValues { order }) => {
					let order = order.iter().map(typed).collect::<crate::Result<Vec<_>>>()?;
					Some(Box::new(move |s: StrategyBuilder| s.disambiguation(PreferValuesRule::new(order))))
				},
			};

			let missing = definition.missing;
			builder = builder.attribute(Attribute::new(definition.name.as_str(), ty), move |s| {
				let s = compatibility(s).missing(missing);
				match disambiguation {
					Some(d) => d(s),
					None => s,
				}
			});
		}

		for required in &self.required {
			builder = builder.require(required.as_str());
		}

		builder.precedence(self.precedence.iter().cloned()).build()
	}
}
