//! Built-in compatibility and disambiguation rules.

use std::collections::{BTreeMap, BTreeSet};

use super::*;

/// Compatible only when the values are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualityRule;

impl CompatibilityRule for EqualityRule {
	fn check(&self, requested: &AttributeValue, candidate: &AttributeValue) -> Result<Compatibility, RuleError> {
		Ok(if requested == candidate { Compatibility::Compatible } else { Compatibility::Incompatible })
	}
}

/// Every value is compatible, including a missing one.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyRule;

impl CompatibilityRule for AcceptAnyRule {
	fn check(&self, _requested: &AttributeValue, _candidate: &AttributeValue) -> Result<Compatibility, RuleError> {
		Ok(Compatibility::Compatible)
	}

	fn check_missing(&self, _requested: &AttributeValue) -> Result<Compatibility, RuleError> {
		Ok(Compatibility::Compatible)
	}
}

/// Lists candidate values acceptable for a requested value on top of the value itself.
///
/// Pairs that aren't listed are left to value equality.
#[derive(Debug, Clone, Default)]
pub struct AcceptedValuesRule {
	accepted: BTreeMap<AttributeValue, BTreeSet<AttributeValue>>,
}

impl AcceptedValuesRule {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn accept(mut self, requested: AttributeValue, candidate: AttributeValue) -> Self {
		self.accepted.entry(requested).or_default().insert(candidate);
		self
	}
}

impl CompatibilityRule for AcceptedValuesRule {
	fn check(&self, requested: &AttributeValue, candidate: &AttributeValue) -> Result<Compatibility, RuleError> {
		match self.accepted.get(requested) {
			Some(accepted) if accepted.contains(candidate) => Ok(Compatibility::Compatible),
			_ => Ok(Compatibility::Unknown),
		}
	}
}

/// Integer values where a candidate is compatible when it is no greater than the requested value.
///
/// e.g. a consumer running on JVM 11 can use a library built for JVM 8.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtMostRule;

impl CompatibilityRule for AtMostRule {
	fn check(&self, requested: &AttributeValue, candidate: &AttributeValue) -> Result<Compatibility, RuleError> {
		match (requested.as_integer(), candidate.as_integer()) {
			(Some(r), Some(c)) => Ok(if c <= r { Compatibility::Compatible } else { Compatibility::Incompatible }),
			_ => Err(RuleError::new(format!("can only compare integers, got `{}` and `{}`", requested, candidate))),
		}
	}
}

/// Prefers the requested value when a candidate offers it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferRequestedRule;

impl DisambiguationRule for PreferRequestedRule {
	fn disambiguate(&self, requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> {
		match requested {
			Some(r) if candidates.contains(r) => Ok(BTreeSet::from([r.clone()])),
			_ => Ok(candidates.clone()),
		}
	}
}

/// Prefers values in the given order, falling back to the requested value.
#[derive(Debug, Clone, Default)]
pub struct PreferValuesRule {
	order: Vec<AttributeValue>,
}

impl PreferValuesRule {
	pub fn new(order: impl IntoIterator<Item = AttributeValue>) -> Self {
		Self { order: order.into_iter().collect() }
	}
}

impl DisambiguationRule for PreferValuesRule {
	fn disambiguate(&self, requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> {
		if let Some(preferred) = self.order.iter().find(|v| candidates.contains(*v)) {
			return Ok(BTreeSet::from([preferred.clone()]))
		}
		PreferRequestedRule.disambiguate(requested, candidates)
	}
}

/// Prefers the greatest value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferHighestRule;

impl DisambiguationRule for PreferHighestRule {
	fn disambiguate(&self, _requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> {
		Ok(candidates.last().cloned().into_iter().collect())
	}
}

/// Prefers the smallest value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferLowestRule;

impl DisambiguationRule for PreferLowestRule {
	fn disambiguate(&self, _requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> {
		Ok(candidates.first().cloned().into_iter().collect())
	}
}

/// Adapts a closure into a [`CompatibilityRule`], see [`compatibility_fn`].
pub struct FnCompatibility<F> {
	name: &'static str,
	f: F,
}

impl<F> std::fmt::Debug for FnCompatibility<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("FnCompatibility").field(&self.name).finish()
	}
}

impl<F> CompatibilityRule for FnCompatibility<F>
where F: Fn(&AttributeValue, &AttributeValue) -> Result<Compatibility, RuleError> + Send + Sync,
{
	fn check(&self, requested: &AttributeValue, candidate: &AttributeValue) -> Result<Compatibility, RuleError> {
		(self.f)(requested, candidate)
	}
}

pub fn compatibility_fn<F>(name: &'static str, f: F) -> FnCompatibility<F>
where F: Fn(&AttributeValue, &AttributeValue) -> Result<Compatibility, RuleError> + Send + Sync,
{
	FnCompatibility { name, f }
}

/// Adapts a closure into a [`DisambiguationRule`], see [`disambiguation_fn`].
pub struct FnDisambiguation<F> {
	name: &'static str,
	f: F,
}

impl<F> std::fmt::Debug for FnDisambiguation<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("FnDisambiguation").field(&self.name).finish()
	}
}

impl<F> DisambiguationRule for FnDisambiguation<F>
where F: Fn(Option<&AttributeValue>, &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> + Send + Sync,
{
	fn disambiguate(&self, requested: Option<&AttributeValue>, candidates: &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> {
		(self.f)(requested, candidates)
	}
}

pub fn disambiguation_fn<F>(name: &'static str, f: F) -> FnDisambiguation<F>
where F: Fn(Option<&AttributeValue>, &BTreeSet<AttributeValue>) -> Result<BTreeSet<AttributeValue>, RuleError> + Send + Sync,
{
	FnDisambiguation { name, f }
}

#[cfg(test)]
mod test {
	use super::*;

	fn set(values: &[AttributeValue]) -> BTreeSet<AttributeValue> {
		values.iter().cloned().collect()
	}

	fn n(s: &str) -> AttributeValue {
		AttributeValue::named(s)
	}

	#[test] fn equality_rejects_other_values() { assert_eq!(EqualityRule.check(&n("api"), &n("runtime")).unwrap(), Compatibility::Incompatible) }
	#[test] fn accept_any_accepts_missing() { assert_eq!(AcceptAnyRule.check_missing(&n("api")).unwrap(), Compatibility::Compatible) }
	#[test] fn accepted_values_accepts_listed_pair() { assert_eq!(AcceptedValuesRule::new().accept(n("api"), n("runtime")).check(&n("api"), &n("runtime")).unwrap(), Compatibility::Compatible) }
	#[test] fn accepted_values_is_directional() { assert_eq!(AcceptedValuesRule::new().accept(n("api"), n("runtime")).check(&n("runtime"), &n("api")).unwrap(), Compatibility::Unknown) }
	#[test] fn at_most_accepts_older() { assert_eq!(AtMostRule.check(&11.into(), &8.into()).unwrap(), Compatibility::Compatible) }
	#[test] fn at_most_rejects_newer() { assert_eq!(AtMostRule.check(&8.into(), &11.into()).unwrap(), Compatibility::Incompatible) }
	#[test] fn at_most_fails_on_strings() { assert!(AtMostRule.check(&n("8"), &11.into()).is_err()) }
	#[test] fn prefer_requested_picks_exact() { assert_eq!(PreferRequestedRule.disambiguate(Some(&n("api")), &set(&[n("api"), n("runtime")])).unwrap(), set(&[n("api")])) }
	#[test] fn prefer_requested_keeps_all_without_exact() { assert_eq!(PreferRequestedRule.disambiguate(Some(&n("x")), &set(&[n("api"), n("runtime")])).unwrap(), set(&[n("api"), n("runtime")])) }
	#[test] fn prefer_values_follows_order() { assert_eq!(PreferValuesRule::new([false.into(), true.into()]).disambiguate(None, &set(&[true.into(), false.into()])).unwrap(), set(&[false.into()])) }
	#[test] fn prefer_highest_picks_max() { assert_eq!(PreferHighestRule.disambiguate(None, &set(&[8.into(), 11.into(), 9.into()])).unwrap(), set(&[11.into()])) }
	#[test] fn prefer_lowest_picks_min() { assert_eq!(PreferLowestRule.disambiguate(None, &set(&[8.into(), 11.into()])).unwrap(), set(&[8.into()])) }
	#[test] fn prefer_highest_of_nothing_is_nothing() { assert!(PreferHighestRule.disambiguate(None, &BTreeSet::new()).unwrap().is_empty()) }
	#[test] fn closures_can_be_rules() {
		let rule = compatibility_fn("prefix", |r, c| Ok(if c.to_string().starts_with(&r.to_string()) { Compatibility::Compatible } else { Compatibility::Unknown }));
		assert_eq!(rule.check(&n("java"), &n("java-api")).unwrap(), Compatibility::Compatible);
		assert_eq!(format!("{:?}", rule), "FnCompatibility(\"prefix\")");
	}
}
