use serde::{Serialize, Deserialize};

/// A component or capability version such as `1.2.10` or `v2.0-rc1`.
///
/// Versions compare segment by segment, alternating between text and numbers,
/// so `1.2.4` sorts before `1.2.10`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentVersion {
	version: String,
}

impl ComponentVersion {
	pub fn new(version: impl Into<String>) -> Self {
		ComponentVersion { version: version.into() }
	}

	pub fn as_str(&self) -> &str {
		&self.version
	}
}

impl From<&str> for ComponentVersion {
	fn from(value: &str) -> Self { Self::new(value) }
}

impl PartialEq for ComponentVersion {
	fn eq(&self, other: &Self) -> bool {
		self.version == other.version
	}
}

/// Splits `s` into its leading run of characters where `numeric` matches, and the rest.
fn split_run(s: &str, numeric: bool) -> (&str, &str) {
	let i = s.char_indices()
		.find(|(_, c)| c.is_ascii_digit() != numeric)
		.map(|(i, _)| i)
		.unwrap_or(s.len());
	s.split_at(i)
}

impl Ord for ComponentVersion {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		let mut lhs: &str = &self.version;
		let mut rhs: &str = &other.version;

		while !lhs.is_empty() && !rhs.is_empty() {
			let (l, lrest) = split_run(lhs, false);
			let (r, rrest) = split_run(rhs, false);
			match l.cmp(r) {
				std::cmp::Ordering::Equal => {},
				ord => return ord
			}

			let (l, lrest) = split_run(lrest, true);
			let (r, rrest) = split_run(rrest, true);
			if !l.is_empty() && !r.is_empty() {
				/* Numbers too long for u64 still compare correctly once leading zeros are gone */
				let l = l.trim_start_matches('0');
				let r = r.trim_start_matches('0');
				match l.len().cmp(&r.len()).then_with(|| l.cmp(r)) {
					std::cmp::Ordering::Equal => {},
					ord => return ord
				}
			} else if l.is_empty() != r.is_empty() {
				/* A number sorts after text in the same position */
				return if l.is_empty() { std::cmp::Ordering::Less } else { std::cmp::Ordering::Greater }
			}

			lhs = lrest;
			rhs = rrest;
		}

		/* Fall back to the text so `Ord` agrees with `Eq` for versions like `1.02` and `1.2` */
		lhs.len().cmp(&rhs.len()).then_with(|| self.version.cmp(&other.version))
	}
}

impl PartialOrd for ComponentVersion {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl std::hash::Hash for ComponentVersion {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.version.hash(state);
	}
}

impl std::fmt::Display for ComponentVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.version)
	}
}

/// A generic enum to describe a range of versions.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	#[default] Any,
	Explicit(T),
	MinOnly(T),
	MaxOnly(T),
	MinMax(T, T),
}

impl<T> VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone,
{
	/// When all arguments are `None` will return `Any`
	pub fn new(explicit: Option<T>, min: Option<T>, max: Option<T>) -> crate::Result<VersionBounds<T>> {
		match (explicit, min, max) {
			(None, None, None) => Ok(VersionBounds::Any),
			(None, None, Some(max)) => Ok(VersionBounds::MaxOnly(max)),
			(None, Some(min), None) => Ok(VersionBounds::MinOnly(min)),
			(None, Some(min), Some(max)) => Ok(VersionBounds::MinMax(min, max)),
			(Some(e), None, None) => Ok(VersionBounds::Explicit(e)),
			_ => Err(crate::Error::Parse("Attempted to create bounds with both explicit and min or max version constraint".to_string()))
		}
	}

	pub fn is_version_within(&self, other: &T) -> bool {
		match self {
			VersionBounds::Any => true,
			VersionBounds::Explicit(v) => other == v,
			VersionBounds::MinOnly(min) => other >= min,
			VersionBounds::MaxOnly(max) => other <= max,
			VersionBounds::MinMax(min, max) => min <= other && other <= max,
		}
	}
}

impl<T> std::fmt::Display for VersionBounds<T>
where T: std::cmp::PartialEq + std::cmp::Ord + std::clone::Clone + std::fmt::Display,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			VersionBounds::Any => write!(f, "*"),
			VersionBounds::Explicit(v) => write!(f, "{}", v),
			VersionBounds::MinOnly(min) => write!(f, "[{},)", min),
			VersionBounds::MaxOnly(max) => write!(f, "(,{}]", max),
			VersionBounds::MinMax(min, max) => write!(f, "[{},{}]", min, max),
		}
	}
}

pub type ComponentVersionBounds = VersionBounds<ComponentVersion>;
