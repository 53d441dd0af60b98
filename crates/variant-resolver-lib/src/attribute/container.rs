use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use super::*;

/// One attribute and its value inside an [`AttributeContainer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeEntry {
	attribute: Attribute,
	value: AttributeValue,
}

impl AttributeEntry {
	pub fn attribute(&self) -> &Attribute {
		&self.attribute
	}

	pub fn value(&self) -> &AttributeValue {
		&self.value
	}
}

/// Serialized form of an entry.
#[doc(hidden)]
#[derive(Serialize, Deserialize)]
pub struct RawEntry {
	name: String,
	#[serde(rename = "type")]
	ty: AttributeType,
	value: AttributeValue,
}

/// An immutable set of attribute values, keyed by attribute name.
///
/// Entries are kept sorted by name which is the canonical order used for display, hashing and comparison.
/// Use [`AttributeContainer::builder`] to create one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawEntry>", into = "Vec<RawEntry>")]
pub struct AttributeContainer {
	entries: BTreeMap<String, AttributeEntry>,
}

impl AttributeContainer {
	pub fn builder() -> AttributeContainerBuilder {
		AttributeContainerBuilder::default()
	}

	pub fn empty() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn get(&self, name: &str) -> Option<&AttributeValue> {
		self.entries.get(name).map(|e| &e.value)
	}

	pub fn entry(&self, name: &str) -> Option<&AttributeEntry> {
		self.entries.get(name)
	}

	/// Entries in canonical order.
	pub fn iter(&self) -> impl Iterator<Item = &AttributeEntry> {
		self.entries.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(|k| k.as_str())
	}

	/// A new container holding these entries with any entry from `other` replacing the one of the same name.
	pub fn overridden_by(&self, other: &AttributeContainer) -> AttributeContainer {
		let mut entries = self.entries.clone();
		for (name, entry) in &other.entries {
			entries.insert(name.clone(), entry.clone());
		}
		AttributeContainer { entries }
	}
}

impl std::fmt::Display for AttributeContainer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{{")?;
		for (i, entry) in self.entries.values().enumerate() {
			if i > 0 { write!(f, ", ")?; }
			write!(f, "{}={}", entry.attribute.name(), entry.value)?;
		}
		write!(f, "}}")
	}
}

impl TryFrom<Vec<RawEntry>> for AttributeContainer {
	type Error = crate::Error;
	fn try_from(value: Vec<RawEntry>) -> Result<Self, Self::Error> {
		value.into_iter()
			.fold(AttributeContainer::builder(), |b, e| b.attribute(Attribute::new(e.name, e.ty), e.value))
			.build()
	}
}

impl From<AttributeContainer> for Vec<RawEntry> {
	fn from(value: AttributeContainer) -> Self {
		value.entries.into_values().map(|e| RawEntry { name: e.attribute.name, ty: e.attribute.ty, value: e.value }).collect()
	}
}

/// Collects entries for an [`AttributeContainer`].
///
/// Problems are collected as entries are added and reported together by [`AttributeContainerBuilder::build`].
#[derive(Debug, Default)]
pub struct AttributeContainerBuilder {
	entries: BTreeMap<String, AttributeEntry>,
	problems: Vec<String>,
}

impl AttributeContainerBuilder {
	/// Adds or replaces the value for `attribute`.
	pub fn attribute(mut self, attribute: Attribute, value: impl Into<AttributeValue>) -> Self {
		let value = value.into();
		let Some(value) = value.clone().coerce(attribute.ty()) else {
			self.problems.push(format!("value `{}` of attribute `{}` is not a {} value", value, attribute.name(), attribute.ty()));
			return self
		};

		if let Some(existing) = self.entries.get(attribute.name()) {
			if existing.attribute.ty() != attribute.ty() {
				self.problems.push(format!(
					"attribute `{}` used as both {} and {}",
					attribute.name(), existing.attribute.ty(), attribute.ty()
				));
				return self
			}
		}

		self.entries.insert(attribute.name().to_string(), AttributeEntry { attribute, value });
		self
	}

	pub fn string(self, name: &str, value: &str) -> Self {
		self.attribute(Attribute::string(name), value)
	}

	pub fn named(self, name: &str, value: &str) -> Self {
		self.attribute(Attribute::named(name), value)
	}

	pub fn boolean(self, name: &str, value: bool) -> Self {
		self.attribute(Attribute::boolean(name), value)
	}

	pub fn integer(self, name: &str, value: i64) -> Self {
		self.attribute(Attribute::integer(name), value)
	}

	/// Adds every entry of `container`.
	pub fn extend(self, container: &AttributeContainer) -> Self {
		container.iter().fold(self, |b, e| b.attribute(e.attribute.clone(), e.value.clone()))
	}

	pub fn build(self) -> crate::Result<AttributeContainer> {
		if self.problems.is_empty() {
			Ok(AttributeContainer { entries: self.entries })
		} else {
			Err(crate::Error::Validation(self.problems.join("; ")))
		}
	}
}
