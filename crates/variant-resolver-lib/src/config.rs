//! Options shared by every resolution run.

/// Environment variable enabling the full candidate breakdown when logging failures.
pub const FULL_FAILURES_VAR: &str = "VARIANT_RESOLVER_FULL_FAILURES";
/// Environment variable limiting how many nodes are resolved at once.
pub const PARALLELISM_VAR: &str = "VARIANT_RESOLVER_PARALLELISM";

#[derive(Debug, Clone)]
pub struct ResolverOptions {
	full_failures: bool,
	max_concurrent_resolutions: usize,
	prefer_default_capability: bool,
}

impl Default for ResolverOptions {
	fn default() -> Self {
		Self {
			full_failures: {
				match std::env::var(FULL_FAILURES_VAR) {
					Ok(v) => parse_flag(&v).unwrap_or_else(|| {
						log::warn!("ignoring unrecognised value `{}` for {}", v, FULL_FAILURES_VAR);
						false
					}),
					Err(_) => false,
				}
			},
			max_concurrent_resolutions: {
				let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
				match std::env::var(PARALLELISM_VAR) {
					Ok(v) => match v.trim().parse::<usize>() {
						Ok(n) if n > 0 => n,
						_ => {
							log::warn!("ignoring invalid value `{}` for {}", v, PARALLELISM_VAR);
							available
						}
					},
					Err(_) => available,
				}
			},
			prefer_default_capability: true,
		}
	}
}

fn parse_flag(s: &str) -> Option<bool> {
	match s.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" | "" => Some(false),
		_ => None,
	}
}

impl ResolverOptions {
	/// When set, failures collected during graph resolution are logged with every assessed candidate.
	pub fn full_failures(&self) -> bool {
		self.full_failures
	}
	pub fn set_full_failures(&mut self, full_failures: bool) {
		self.full_failures = full_failures;
	}

	pub fn max_concurrent_resolutions(&self) -> usize {
		self.max_concurrent_resolutions
	}
	/// returns if the value is valid or not, zero is rejected.
	pub fn set_max_concurrent_resolutions(&mut self, max: usize) -> bool {
		if max > 0 {
			self.max_concurrent_resolutions = max;
			true
		} else {
			false
		}
	}

	/// Prefer variants providing only the component's own capability when nothing else can break a tie.
	pub fn prefer_default_capability(&self) -> bool {
		self.prefer_default_capability
	}
	pub fn set_prefer_default_capability(&mut self, prefer: bool) {
		self.prefer_default_capability = prefer;
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test] fn flag_accepts_true_spellings() { assert_eq!(parse_flag(" TRUE "), Some(true)); assert_eq!(parse_flag("1"), Some(true)) }
	#[test] fn flag_accepts_false_spellings() { assert_eq!(parse_flag("off"), Some(false)); assert_eq!(parse_flag(""), Some(false)) }
	#[test] fn flag_rejects_garbage() { assert_eq!(parse_flag("maybe"), None) }
	#[test] fn zero_parallelism_is_rejected() {
		let mut options = ResolverOptions::default();
		let before = options.max_concurrent_resolutions();
		assert!(!options.set_max_concurrent_resolutions(0));
		assert_eq!(options.max_concurrent_resolutions(), before);
		assert!(options.set_max_concurrent_resolutions(3));
		assert_eq!(options.max_concurrent_resolutions(), 3);
	}
}
