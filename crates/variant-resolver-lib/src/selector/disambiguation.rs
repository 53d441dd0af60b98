//! Narrowing a set of compatible candidates down to the preferred ones.

use std::collections::BTreeSet;

use super::*;

/// Narrows compatible candidates down to the preferred ones. Input order is kept.
///
/// # Steps
/// 1. A candidate matching a strict superset of the requested attributes every other candidate matched wins.
/// 1. Rules are applied attribute by attribute, in [`AttributeMatchingSchema::disambiguation_order()`].
/// 1. Candidates still tied prefer those not declaring extra attributes some other candidate lacks.
pub(super) fn narrow<'c, C: Candidate + ?Sized>(schema: &AttributeMatchingSchema, requested: &AttributeContainer, compatible: Vec<&'c C>) -> Result<Vec<&'c C>, SelectionError> {
	if compatible.len() <= 1 { return Ok(compatible) }
	if let Some(longest) = longest_match(requested, &compatible) {
		log::trace!("'{}' matches every requested attribute the others do and more", longest.name());
		return Ok(vec![longest])
	}

	let remaining = apply_rules(schema, requested, compatible.clone())?;
	if remaining.len() <= 1 { return Ok(remaining) }
	Ok(prefer_without_extras(requested, &compatible, remaining))
}

/// The candidate whose requested attributes are a strict superset of every other candidate's.
fn longest_match<'c, C: Candidate + ?Sized>(requested: &AttributeContainer, candidates: &[&'c C]) -> Option<&'c C> {
	if requested.is_empty() { return None }
	let matched: Vec<BTreeSet<&str>> = candidates.iter()
		.map(|c| requested.names().filter(|n| c.attributes().contains(n)).collect())
		.collect();

	let mut longest = 0;
	for (i, m) in matched.iter().enumerate() {
		if m.len() > matched[longest].len() { longest = i }
	}
	let superset = matched.iter().enumerate()
		.filter(|(i, _)| *i != longest)
		.all(|(_, m)| m.len() < matched[longest].len() && m.is_subset(&matched[longest]));
	superset.then(|| candidates[longest])
}

/// Applies the disambiguation rules attribute by attribute.
///
/// On a requested attribute a rule only narrows when it prefers a strict, non empty subset of the offered values.
/// On any other attribute a non empty answer also drops the candidates without a value for it.
fn apply_rules<'c, C: Candidate + ?Sized>(schema: &AttributeMatchingSchema, requested: &AttributeContainer, mut remaining: Vec<&'c C>) -> Result<Vec<&'c C>, SelectionError> {
	let keys: BTreeSet<String> = remaining.iter()
		.flat_map(|c| c.attributes().names())
		.map(str::to_string)
		.collect();

	for key in schema.disambiguation_order(keys.iter().map(String::as_str)) {
		if remaining.len() <= 1 { break }

		let values: BTreeSet<AttributeValue> = remaining.iter()
			.filter_map(|c| c.attributes().get(key))
			.cloned()
			.collect();
		if values.is_empty() { continue }

		let is_requested = requested.contains(key);
		let Some(rule) = schema.disambiguation_rule(key, is_requested) else { continue };
		let best = rule.disambiguate(requested.get(key), &values)
			.map_err(|source| SelectionError::DisambiguationRule { attribute: key.to_string(), source })?;

		if !best.is_subset(&values) {
			let unoffered: Vec<String> = best.difference(&values).map(|v| v.to_string()).collect();
			return Err(SelectionError::UnofferedValues { attribute: key.to_string(), values: unoffered.join(", ") })
		}
		if best.is_empty() { continue }
		if is_requested && best.len() == values.len() { continue }
		if remaining.iter().all(|c| c.attributes().get(key).is_some_and(|v| best.contains(v))) { continue }

		log::trace!("disambiguating on `{}` keeps {:?}", key, best);
		remaining.retain(|c| c.attributes().get(key).is_some_and(|v| best.contains(v)));
	}

	Ok(remaining)
}

/// Prefers candidates that leave out an attribute nobody asked for.
///
/// Only attributes declared by some but not all compatible candidates count. An attribute every remaining
/// candidate declares is skipped.
fn prefer_without_extras<'c, C: Candidate + ?Sized>(requested: &AttributeContainer, compatible: &[&'c C], mut remaining: Vec<&'c C>) -> Vec<&'c C> {
	if requested.is_empty() { return remaining }
	let extras: BTreeSet<&str> = compatible.iter()
		.flat_map(|c| c.attributes().names())
		.filter(|n| !requested.contains(n))
		.collect();

	for extra in extras {
		if remaining.len() <= 1 { break }
		let declaring = compatible.iter().filter(|c| c.attributes().contains(extra)).count();
		if declaring == compatible.len() { continue }

		let without: Vec<&C> = remaining.iter().copied().filter(|c| !c.attributes().contains(extra)).collect();
		if !without.is_empty() {
			log::trace!("preferring candidates without `{}`", extra);
			remaining = without;
		}
	}
	remaining
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::component::Variant;
	use crate::schema::*;

	fn variant(name: &str, attrs: AttributeContainer) -> Variant {
		Variant::builder(name).attributes(attrs).build()
	}

	#[test] fn requested_value_wins() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::named("usage"), |s| s.compatibility(AcceptAnyRule))
			.build().unwrap();
		let a = variant("a", AttributeContainer::builder().named("usage", "api").build().unwrap());
		let b = variant("b", AttributeContainer::builder().named("usage", "runtime").build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "runtime").build().unwrap();
		let remaining = narrow(&schema, &requested, vec![&a, &b]).unwrap();
		assert_eq!(remaining.iter().map(|v| v.name()).collect::<Vec<_>>(), vec!["b"]);
	}
	#[test] fn precedence_decides_first() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::boolean("debug"), |s| s.disambiguation(PreferValuesRule::new([false.into()])))
			.attribute(Attribute::integer("jvm"), |s| s.disambiguation(PreferHighestRule))
			.precedence(["debug"])
			.build().unwrap();
		let a = variant("a", AttributeContainer::builder().boolean("debug", false).integer("jvm", 8).build().unwrap());
		let b = variant("b", AttributeContainer::builder().boolean("debug", true).integer("jvm", 17).build().unwrap());
		let remaining = narrow(&schema, &AttributeContainer::empty(), vec![&a, &b]).unwrap();
		assert_eq!(remaining.iter().map(|v| v.name()).collect::<Vec<_>>(), vec!["a"]);
	}
	#[test] fn no_rule_no_narrowing() {
		let schema = AttributeMatchingSchema::empty();
		let a = variant("a", AttributeContainer::builder().string("flavor", "x").build().unwrap());
		let b = variant("b", AttributeContainer::builder().string("flavor", "y").build().unwrap());
		assert_eq!(narrow(&schema, &AttributeContainer::empty(), vec![&a, &b]).unwrap().len(), 2);
	}
	#[test] fn preferred_value_drops_candidates_without_one() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::boolean("debug"), |s| s.disambiguation(PreferValuesRule::new([false.into()])))
			.build().unwrap();
		let release = variant("release", AttributeContainer::builder().named("usage", "api").boolean("debug", false).build().unwrap());
		let bare = variant("bare", AttributeContainer::builder().named("usage", "api").build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "api").build().unwrap();
		let remaining = narrow(&schema, &requested, vec![&bare, &release]).unwrap();
		assert_eq!(remaining.iter().map(|v| v.name()).collect::<Vec<_>>(), vec!["release"]);
	}
	#[test] fn requested_attribute_needs_a_strict_subset() {
		let schema = AttributeMatchingSchema::empty();
		let a = variant("a", AttributeContainer::builder().named("usage", "api").build().unwrap());
		let b = variant("b", AttributeContainer::builder().string("flavor", "x").build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "runtime").build().unwrap();
		assert_eq!(apply_rules(&schema, &requested, vec![&a, &b]).unwrap().len(), 2);
	}
	#[test] fn superset_match_wins_before_rules() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::boolean("debug"), |s| s.disambiguation(PreferValuesRule::new([false.into()])))
			.build().unwrap();
		let full = variant("full", AttributeContainer::builder().named("usage", "api").string("flavor", "x").boolean("debug", true).build().unwrap());
		let partial = variant("partial", AttributeContainer::builder().named("usage", "api").boolean("debug", false).build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "api").string("flavor", "x").build().unwrap();
		let remaining = narrow(&schema, &requested, vec![&partial, &full]).unwrap();
		assert_eq!(remaining.iter().map(|v| v.name()).collect::<Vec<_>>(), vec!["full"]);
	}
	#[test] fn equal_matches_are_not_a_superset() {
		let a = variant("a", AttributeContainer::builder().named("usage", "api").string("flavor", "x").build().unwrap());
		let b = variant("b", AttributeContainer::builder().named("usage", "api").boolean("debug", true).build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "api").build().unwrap();
		assert!(longest_match(&requested, &[&a, &b]).is_none());
	}
	#[test] fn undeclared_extra_attribute_is_preferred() {
		let schema = AttributeMatchingSchema::empty();
		let plain = variant("plain", AttributeContainer::builder().named("usage", "api").build().unwrap());
		let flavored = variant("flavored", AttributeContainer::builder().named("usage", "api").string("flavor", "x").build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "api").build().unwrap();
		let remaining = narrow(&schema, &requested, vec![&flavored, &plain]).unwrap();
		assert_eq!(remaining.iter().map(|v| v.name()).collect::<Vec<_>>(), vec!["plain"]);
	}
	#[test] fn extra_attribute_on_every_candidate_is_ignored() {
		let schema = AttributeMatchingSchema::empty();
		let a = variant("a", AttributeContainer::builder().named("usage", "api").string("flavor", "x").build().unwrap());
		let b = variant("b", AttributeContainer::builder().named("usage", "api").string("flavor", "y").build().unwrap());
		let requested = AttributeContainer::builder().named("usage", "api").build().unwrap();
		assert_eq!(narrow(&schema, &requested, vec![&a, &b]).unwrap().len(), 2);
	}
	#[test] fn unoffered_values_are_an_error() {
		let schema = AttributeMatchingSchema::builder()
			.attribute(Attribute::string("flavor"), |s| s.disambiguation(disambiguation_fn("invent", |_, _| {
				Ok([AttributeValue::from("z")].into_iter().collect())
			})))
			.build().unwrap();
		let a = variant("a", AttributeContainer::builder().string("flavor", "x").build().unwrap());
		let b = variant("b", AttributeContainer::builder().string("flavor", "y").build().unwrap());
		let err = narrow(&schema, &AttributeContainer::empty(), vec![&a, &b]).unwrap_err();
		assert!(matches!(err, SelectionError::UnofferedValues { .. }));
	}
}
