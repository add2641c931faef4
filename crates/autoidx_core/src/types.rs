//! Core type definitions.

use std::fmt;
use std::str::FromStr;

/// Identifier of an index.
///
/// Identifiers are positive, allocated monotonically and never reused within
/// a process. The decimal form doubles as the index directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexId(pub u64);

impl IndexId {
    /// Creates a new index ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Parses a directory name as an identifier.
    ///
    /// Only the canonical decimal form of a positive value is accepted, so
    /// `"0"`, `"03"`, `"+3"` or `"7.tmp"` are not identifiers.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        if name.starts_with('0') || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse::<u64>().ok().map(Self)
    }

    /// Returns the directory name for this identifier.
    #[must_use]
    pub fn dir_name(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IndexId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A reference to an index by identifier or by name.
///
/// Lifecycle operations accept either form:
///
/// ```rust
/// use autoidx_core::{IndexId, IndexRef};
///
/// let by_id: IndexRef<'_> = IndexId::new(3).into();
/// let by_name: IndexRef<'_> = "Auto/Users/ByName".into();
/// assert_eq!(by_id.to_string(), "3");
/// assert_eq!(by_name.to_string(), "Auto/Users/ByName");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexRef<'a> {
    /// Lookup by identifier.
    Id(IndexId),
    /// Lookup by case-insensitive name.
    Name(&'a str),
}

impl From<IndexId> for IndexRef<'_> {
    fn from(id: IndexId) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a str> for IndexRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl<'a> From<&'a String> for IndexRef<'a> {
    fn from(name: &'a String) -> Self {
        Self::Name(name.as_str())
    }
}

impl fmt::Display for IndexRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names() {
        assert_eq!(IndexId::from_dir_name("42"), Some(IndexId::new(42)));
        assert_eq!(IndexId::new(42).dir_name(), "42");
        assert_eq!(IndexId::from_dir_name("0"), None);
        assert_eq!(IndexId::from_dir_name(""), None);
        assert_eq!(IndexId::from_dir_name("+3"), None);
        assert_eq!(IndexId::from_dir_name("03"), None);
        assert_eq!(IndexId::from_dir_name("7.tmp"), None);
        assert_eq!(IndexId::from_dir_name("LOCK"), None);
        assert_eq!(IndexId::from_dir_name("99999999999999999999999"), None);
    }

    #[test]
    fn ordering() {
        assert!(IndexId::new(1) < IndexId::new(2));
    }
}
