//! Library error types.

pub type Result<T> = std::result::Result<T, Error>;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("validation error: {0}")]
	Validation(String),
}

/// Returned by compatibility and disambiguation rule implementations when they can't give an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct RuleError {
	message: String,
}

impl RuleError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Errors raised below the selector boundary.
///
/// These never leave a [`crate::VariantSelector`] as-is, they are wrapped into
/// [`crate::failure::ResolutionFailure::UnknownSelection`] with the error kept as the source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SelectionError {
	#[error("compatibility rule for attribute `{attribute}` failed")]
	CompatibilityRule {
		attribute: String,
		#[source]
		source: RuleError,
	},
	#[error("disambiguation rule for attribute `{attribute}` failed")]
	DisambiguationRule {
		attribute: String,
		#[source]
		source: RuleError,
	},
	/// A disambiguation rule answered with values none of the candidates offered.
	#[error("disambiguation rule for attribute `{attribute}` chose values that were not offered: {values}")]
	UnofferedValues {
		attribute: String,
		values: String,
	},
	#[error("variant selection panicked: {0}")]
	Panicked(String),
}

impl SelectionError {
	/// Turns the payload of a caught panic into an error.
	pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
		let message = if let Some(s) = payload.downcast_ref::<&str>() {
			s.to_string()
		} else if let Some(s) = payload.downcast_ref::<String>() {
			s.clone()
		} else {
			"unknown panic payload".to_string()
		};
		SelectionError::Panicked(message)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn panic_payload_str_is_kept() { assert_eq!(SelectionError::from_panic(Box::new("boom")), SelectionError::Panicked("boom".to_string())) }
	#[test] fn panic_payload_string_is_kept() { assert_eq!(SelectionError::from_panic(Box::new("boom".to_string())), SelectionError::Panicked("boom".to_string())) }
	#[test] fn panic_payload_other_is_described() { assert_eq!(SelectionError::from_panic(Box::new(3_u8)), SelectionError::Panicked("unknown panic payload".to_string())) }
	#[test] fn rule_error_is_source() {
		use std::error::Error as _;
		let e = SelectionError::CompatibilityRule { attribute: "usage".to_string(), source: RuleError::new("bad") };
		assert_eq!(e.source().map(|s| s.to_string()), Some("bad".to_string()))
	}
}
