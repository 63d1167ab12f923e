use std::fmt;

use crate::errors::ServiceError;

const SEPARATOR: char = ':';

/// Identifies one counter: a (target, branch) pair.
///
/// The store key is `"<target>:<branch>"`. Targets may not contain `:`, so the
/// key splits unambiguously at its first colon and distinct pairs never share
/// a key. Branches may contain colons (`release:2024`).
///
/// Compatibility: earlier deployments accepted any target, so counters stored
/// under a colon-bearing target such as `org:repo` are no longer reachable
/// through this type. Rename such targets (e.g. `org/repo`) when migrating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey {
    target: String,
    branch: String,
}

impl VersionKey {
    pub fn new(target: impl Into<String>, branch: impl Into<String>) -> Result<Self, ServiceError> {
        let target = target.into();
        let branch = branch.into();
        if target.is_empty() || branch.is_empty() {
            return Err(ServiceError::Validation("target and branch are required".into()));
        }
        if target.contains(SEPARATOR) {
            return Err(ServiceError::Validation(format!(
                "target must not contain `{SEPARATOR}`: {target}"
            )));
        }
        Ok(Self { target, branch })
    }

    /// Build from optional query parameters; a missing or empty one is a
    /// validation error.
    pub fn from_parts(target: Option<&str>, branch: Option<&str>) -> Result<Self, ServiceError> {
        Self::new(target.unwrap_or_default(), branch.unwrap_or_default())
    }

    pub fn target(&self) -> &str { &self.target }

    pub fn branch(&self) -> &str { &self.branch }

    pub fn storage_key(&self) -> String {
        format!("{}{}{}", self.target, SEPARATOR, self.branch)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.target, SEPARATOR, self.branch)
    }
}

/// A counter value as read back from the store.
///
/// The integer counter is the authoritative representation; this wrapper keeps
/// the stored text verbatim so reads return exactly what was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionString(String);

impl VersionString {
    pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// The integer counter, when the stored text is one.
    pub fn counter(&self) -> Option<u64> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    pub fn into_inner(self) -> String { self.0 }
}

impl From<u64> for VersionString {
    fn from(n: u64) -> Self { Self(n.to_string()) }
}

impl fmt::Display for VersionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
