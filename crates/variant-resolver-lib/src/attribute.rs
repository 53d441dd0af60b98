//! Typed attributes used to describe what a variant is and what a consumer wants.
//!
//! Attributes are only ever compared against an attribute with the same name *and* type,
//! the value types are kept small so values can be ordered and hashed for stable diagnostics.

use serde::{Serialize, Deserialize};

mod container;
pub use container::AttributeContainer;
pub use container::AttributeContainerBuilder;
pub use container::AttributeEntry;

/// The type of value an [`Attribute`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
	String,
	Boolean,
	Integer,
	/// A string from a closed set of well known names, for example a usage of `java-api`.
	Named,
}

impl std::fmt::Display for AttributeType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AttributeType::String => write!(f, "string"),
			AttributeType::Boolean => write!(f, "boolean"),
			AttributeType::Integer => write!(f, "integer"),
			AttributeType::Named => write!(f, "named"),
		}
	}
}

/// A named and typed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
	name: String,
	#[serde(rename = "type")]
	ty: AttributeType,
}

impl Attribute {
	pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
		Self { name: name.into(), ty }
	}

	pub fn string(name: impl Into<String>) -> Self { Self::new(name, AttributeType::String) }
	pub fn boolean(name: impl Into<String>) -> Self { Self::new(name, AttributeType::Boolean) }
	pub fn integer(name: impl Into<String>) -> Self { Self::new(name, AttributeType::Integer) }
	pub fn named(name: impl Into<String>) -> Self { Self::new(name, AttributeType::Named) }

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn ty(&self) -> AttributeType {
		self.ty
	}
}

impl std::fmt::Display for Attribute {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}

/// The value of an attribute.
///
/// Serialized without a tag, a `Named` value reads back as a `String` until it is
/// coerced against its attribute, see [`AttributeValue::coerce`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
	Boolean(bool),
	Integer(i64),
	String(String),
	Named(String),
}

impl AttributeValue {
	pub fn string(value: impl Into<String>) -> Self {
		AttributeValue::String(value.into())
	}

	pub fn named(value: impl Into<String>) -> Self {
		AttributeValue::Named(value.into())
	}

	pub fn ty(&self) -> AttributeType {
		match self {
			AttributeValue::Boolean(_) => AttributeType::Boolean,
			AttributeValue::Integer(_) => AttributeType::Integer,
			AttributeValue::String(_) => AttributeType::String,
			AttributeValue::Named(_) => AttributeType::Named,
		}
	}

	/// Converts the value to `ty` where the representation allows it.
	///
	/// Only strings and names convert into each other, anything else must already have the right type.
	pub fn coerce(self, ty: AttributeType) -> Option<AttributeValue> {
		match (self, ty) {
			(AttributeValue::String(s), AttributeType::Named) => Some(AttributeValue::Named(s)),
			(AttributeValue::Named(s), AttributeType::String) => Some(AttributeValue::String(s)),
			(v, ty) if v.ty() == ty => Some(v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttributeValue::String(s) | AttributeValue::Named(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_integer(&self) -> Option<i64> {
		if let AttributeValue::Integer(i) = self { Some(*i) } else { None }
	}

	pub fn as_bool(&self) -> Option<bool> {
		if let AttributeValue::Boolean(b) = self { Some(*b) } else { None }
	}
}

impl std::fmt::Display for AttributeValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AttributeValue::Boolean(b) => write!(f, "{}", b),
			AttributeValue::Integer(i) => write!(f, "{}", i),
			AttributeValue::String(s) | AttributeValue::Named(s) => write!(f, "{}", s),
		}
	}
}

impl From<&str> for AttributeValue {
	fn from(value: &str) -> Self { AttributeValue::String(value.to_string()) }
}

impl From<String> for AttributeValue {
	fn from(value: String) -> Self { AttributeValue::String(value) }
}

impl From<bool> for AttributeValue {
	fn from(value: bool) -> Self { AttributeValue::Boolean(value) }
}

impl From<i64> for AttributeValue {
	fn from(value: i64) -> Self { AttributeValue::Integer(value) }
}

impl From<i32> for AttributeValue {
	fn from(value: i32) -> Self { AttributeValue::Integer(value.into()) }
}
