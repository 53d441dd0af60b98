//! The attribute matching schema: per attribute compatibility and disambiguation rules.
//!
//! # Usage
//! 1. Create a [`SchemaBuilder`] with [`AttributeMatchingSchema::builder()`].
//! 1. Register a strategy for each attribute that needs more than plain equality.
//! 1. [`SchemaBuilder::build()`] to get the frozen schema, wrap it in an `Arc` to share it between resolutions.
//!
//! A schema can't be changed once built, resolutions running at the same time all read the same snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Serialize, Deserialize};

use crate::attribute::*;
use crate::{RuleError, SelectionError};

pub mod rules;
pub use rules::*;

mod definition;
pub use definition::SchemaDefinition;
pub use definition::AttributeDefinition;
pub use definition::CompatibilityDefinition;
pub use definition::DisambiguationDefinition;
pub use definition::AcceptedValues;

/// Answer of a [`CompatibilityRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compatibility {
	Compatible,
	Incompatible,
	/// The rule has no opinion, value equality decides.
	Unknown,
}

/// Final verdict for one attribute of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchVerdict {
	Compatible,
	Incompatible,
	/// Only the candidate declares the attribute, it plays no part in compatibility.
	NotRequested,
}

/// Decides if a candidate's value satisfies a requested value.
pub trait CompatibilityRule: std::fmt::Debug + Send + Sync {
	fn check(&self, requested: &AttributeValue, candidate: &AttributeValue) -> Result<Compatibility, RuleError>;

	/// Called when the candidate doesn't declare the attribute at all and the policy is [`MissingValuePolicy::AskRule`].
	fn check_missing(&self, _requested: &AttributeValue) -> Result<Compatibility, RuleError> {
		Ok(Compatibility::Incompatible)
	}
}

/// Picks the preferred values out of the values offered by compatible candidates.
///
/// Returning every value, or none, leaves the candidates as they are.
pub trait DisambiguationRule: std::fmt::Debug + Send + Sync {
	fn disambiguate(&self, requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError>;
}

/// How a candidate that doesn't declare a requested attribute is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
	/// Ask [`CompatibilityRule::check_missing`], which says incompatible unless the rule overrides it.
	#[default] AskRule,
	Compatible,
	Incompatible,
}

#[derive(Debug, Clone)]
pub struct AttributeMatchingStrategy {
	attribute: Attribute,
	compatibility: Arc<dyn CompatibilityRule>,
	disambiguation: Option<Arc<dyn DisambiguationRule>>,
	missing: MissingValuePolicy,
}

impl AttributeMatchingStrategy {
	pub fn attribute(&self) -> &Attribute {
		&self.attribute
	}

	pub fn compatibility(&self) -> &dyn CompatibilityRule {
		self.compatibility.as_ref()
	}

	pub fn disambiguation(&self) -> Option<&dyn DisambiguationRule> {
		self.disambiguation.as_deref()
	}

	pub fn missing(&self) -> MissingValuePolicy {
		self.missing
	}
}

/// Configures a single [`AttributeMatchingStrategy`], see [`SchemaBuilder::attribute`].
#[derive(Debug)]
pub struct StrategyBuilder {
	compatibility: Option<Arc<dyn CompatibilityRule>>,
	disambiguation: Option<Arc<dyn DisambiguationRule>>,
	missing: MissingValuePolicy,
}

impl StrategyBuilder {
	/// Defaults to [`EqualityRule`] when not set.
	pub fn compatibility(mut self, rule: impl CompatibilityRule + 'static) -> Self {
		self.compatibility = Some(Arc::new(rule));
		self
	}

	pub fn disambiguation(mut self, rule: impl DisambiguationRule + 'static) -> Self {
		self.disambiguation = Some(Arc::new(rule));
		self
	}

	pub fn missing(mut self, missing: MissingValuePolicy) -> Self {
		self.missing = missing;
		self
	}
}

static PREFER_REQUESTED: PreferRequestedRule = PreferRequestedRule;

#[derive(Debug)]
pub struct AttributeMatchingSchema {
	strategies: BTreeMap<String, AttributeMatchingStrategy>,
	precedence: Vec<String>,
	required: BTreeSet<String>,
}

impl AttributeMatchingSchema {
	pub fn builder() -> SchemaBuilder {
		SchemaBuilder::default()
	}

	/// A schema with no registered attributes, every attribute is matched on equality.
	pub fn empty() -> Self {
		Self { strategies: Default::default(), precedence: Default::default(), required: Default::default() }
	}

	pub fn strategy(&self, name: &str) -> Option<&AttributeMatchingStrategy> {
		self.strategies.get(name)
	}

	pub fn declared_attribute(&self, name: &str) -> Option<&Attribute> {
		self.strategies.get(name).map(|s| &s.attribute)
	}

	pub fn precedence(&self) -> &[String] {
		&self.precedence
	}

	/// Attributes a request must contain.
	pub fn required(&self) -> impl Iterator<Item = &str> {
		self.required.iter().map(|s| s.as_str())
	}

	/// Evaluates the compatibility of one attribute.
	///
	/// `requested` and `candidate` are the entries of the same attribute name on each side, either may be absent.
	pub fn compatibility(&self, requested: Option<&AttributeEntry>, candidate: Option<&AttributeEntry>) -> Result<MatchVerdict, SelectionError> {
		let Some(requested) = requested else { return Ok(MatchVerdict::NotRequested) };
		let name = requested.attribute().name();
		let strategy = self.strategies.get(name);

		let answer = match candidate {
			Some(candidate) => {
				/* Attributes only compare with the exact same attribute */
				if candidate.attribute().ty() != requested.attribute().ty() {
					return Ok(MatchVerdict::Incompatible)
				}
				let answer = match strategy {
					Some(s) => s.compatibility.check(requested.value(), candidate.value())
						.map_err(|source| SelectionError::CompatibilityRule { attribute: name.to_string(), source })?,
					None => Compatibility::Unknown,
				};
				match answer {
					Compatibility::Unknown if requested.value() == candidate.value() => Compatibility::Compatible,
					Compatibility::Unknown => Compatibility::Incompatible,
					a => a,
				}
			},
			None => match strategy {
				None => Compatibility::Incompatible,
				Some(s) => match s.missing {
					MissingValuePolicy::Incompatible => Compatibility::Incompatible,
					MissingValuePolicy::Compatible => Compatibility::Compatible,
					MissingValuePolicy::AskRule => s.compatibility.check_missing(requested.value())
						.map_err(|source| SelectionError::CompatibilityRule { attribute: name.to_string(), source })?,
				},
			},
		};

		Ok(if answer == Compatibility::Compatible { MatchVerdict::Compatible } else { MatchVerdict::Incompatible })
	}

	/// Two declared values can live side by side when either direction is compatible.
	pub fn values_compatible(&self, lhs: &AttributeEntry, rhs: &AttributeEntry) -> Result<bool, SelectionError> {
		Ok(self.compatibility(Some(lhs), Some(rhs))? == MatchVerdict::Compatible
			|| self.compatibility(Some(rhs), Some(lhs))? == MatchVerdict::Compatible)
	}

	/// The order attributes are disambiguated in: the precedence list first, then by name.
	pub fn disambiguation_order<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
		let mut names: Vec<&str> = names.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
		names.sort_by_key(|n| {
			self.precedence.iter().position(|p| p == n).unwrap_or(usize::MAX)
		});
		names
	}

	/// The rule used to narrow candidates on `name`.
	///
	/// Attributes without a registered rule still prefer exact matches when the consumer asked for them.
	pub fn disambiguation_rule(&self, name: &str, requested: bool) -> Option<&dyn DisambiguationRule> {
		match self.strategies.get(name).and_then(|s| s.disambiguation()) {
			Some(rule) => Some(rule),
			None if requested => Some(&PREFER_REQUESTED),
			None => None,
		}
	}

	/// Types raw values using the declared attributes, undeclared attributes keep the type of their value.
	pub fn typed_container(&self, raw: &BTreeMap<String, AttributeValue>) -> crate::Result<AttributeContainer> {
		raw.iter().fold(AttributeContainer::builder(), |b, (name, value)| {
			let attribute = match self.declared_attribute(name) {
				Some(a) => a.clone(),
				None => Attribute::new(name.as_str(), value.ty()),
			};
			b.attribute(attribute, value.clone())
		}).build()
	}
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
	strategies: BTreeMap<String, AttributeMatchingStrategy>,
	precedence: Vec<String>,
	required: BTreeSet<String>,
	problems: Vec<String>,
}

impl SchemaBuilder {
	/// Registers the strategy for `attribute`, replacing any earlier registration for the name.
	pub fn attribute(mut self, attribute: Attribute, configure: impl FnOnce(StrategyBuilder) -> StrategyBuilder) -> Self {
		if let Some(existing) = self.strategies.get(attribute.name()) {
			if existing.attribute.ty() != attribute.ty() {
				self.problems.push(format!("attribute `{}` registered as both {} and {}", attribute.name(), existing.attribute.ty(), attribute.ty()));
				return self
			}
		}
		let b = configure(StrategyBuilder { compatibility: None, disambiguation: None, missing: Default::default() });
		let strategy = AttributeMatchingStrategy {
			attribute: attribute.clone(),
			compatibility: b.compatibility.unwrap_or_else(|| Arc::new(EqualityRule)),
			disambiguation: b.disambiguation,
			missing: b.missing,
		};
		self.strategies.insert(attribute.name().to_string(), strategy);
		self
	}

	/// Attributes listed here are disambiguated first, in this order.
	pub fn precedence<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
		for name in names {
			let name = name.into();
			if self.precedence.contains(&name) {
				self.problems.push(format!("attribute `{}` listed twice in the precedence", name));
			} else {
				self.precedence.push(name);
			}
		}
		self
	}

	/// Requests must contain `name`.
	pub fn require(mut self, name: impl Into<String>) -> Self {
		self.required.insert(name.into());
		self
	}

	pub fn build(self) -> crate::Result<AttributeMatchingSchema> {
		if !self.problems.is_empty() {
			return Err(crate::Error::Validation(self.problems.join("; ")))
		}
		Ok(AttributeMatchingSchema {
			strategies: self.strategies,
			precedence: self.precedence,
			required: self.required,
		})
	}
}
