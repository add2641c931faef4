//! Index definitions.
//!
//! A definition describes *what* an index indexes; it never changes once
//! built. Definitions form a closed variant set:
//!
//! - [`AutoIndexDefinition`]: generated from a query shape, name derived from its fields
//! - [`StaticIndexDefinition`]: authored by hand, explicitly named (map or map-reduce)
//!
//! What each variant may do is answered by [`IndexKind`] rather than by
//! type checks spread through the lifecycle code.

mod authored;
mod auto;
mod compare;
mod field;
mod naming;

pub use authored::{StaticIndexDefinition, StaticIndexDefinitionBuilder};
pub use auto::AutoIndexDefinition;
pub use compare::{decide, definitions_equal, CompareOptions, IndexCreationDecision};
pub use field::{FieldStorage, IndexField, SortOption};
pub use naming::{
    derive_auto_index_name, field_display_token, is_auto_index_name, name_key,
    validate_index_name, AUTO_INDEX_PREFIX,
};

use crate::error::CoreError;
use std::fmt;

/// Policy controlling whether a later create request may overwrite an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LockMode {
    /// Later definitions replace this one.
    #[default]
    Unlocked = 0,
    /// Later definitions are silently ignored.
    LockedIgnore = 1,
    /// Later definitions are rejected with an error.
    LockedError = 2,
    /// Later definitions build next to this one and swap in when caught up.
    SideBySide = 3,
}

impl LockMode {
    /// Returns the persisted code of this mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for LockMode {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LockMode::Unlocked),
            1 => Ok(LockMode::LockedIgnore),
            2 => Ok(LockMode::LockedError),
            3 => Ok(LockMode::SideBySide),
            _ => Err(CoreError::corrupt_definition(format!(
                "unknown lock mode: {value}"
            ))),
        }
    }
}

/// The kind of a running index, with its capability table.
///
/// | kind        | self-recreate (reset) | map-reduce |
/// |-------------|-----------------------|------------|
/// | `AutoMap`   | yes                   | no         |
/// | `Map`       | no                    | no         |
/// | `MapReduce` | no                    | yes        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IndexKind {
    /// Auto-generated map index.
    AutoMap = 0,
    /// Authored map index.
    Map = 1,
    /// Authored map-reduce index.
    MapReduce = 2,
}

impl IndexKind {
    /// Returns the persisted code of this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether the index can be rebuilt from its own definition by `reset`.
    #[must_use]
    pub const fn can_self_recreate(self) -> bool {
        matches!(self, IndexKind::AutoMap)
    }

    /// Whether the index has a reduce step.
    #[must_use]
    pub const fn is_map_reduce(self) -> bool {
        matches!(self, IndexKind::MapReduce)
    }
}

impl TryFrom<i64> for IndexKind {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IndexKind::AutoMap),
            1 => Ok(IndexKind::Map),
            2 => Ok(IndexKind::MapReduce),
            _ => Err(CoreError::corrupt_definition(format!(
                "unknown index kind: {value}"
            ))),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::AutoMap => "AutoMap",
            IndexKind::Map => "Map",
            IndexKind::MapReduce => "MapReduce",
        };
        f.write_str(name)
    }
}

/// Any index definition the catalog can manage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexDefinition {
    /// Auto-generated definition.
    Auto(AutoIndexDefinition),
    /// Authored definition.
    Static(StaticIndexDefinition),
}

impl IndexDefinition {
    /// Returns the definition's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Auto(def) => def.name(),
            Self::Static(def) => def.name(),
        }
    }

    /// Returns the source collections.
    #[must_use]
    pub fn collections(&self) -> &[String] {
        match self {
            Self::Auto(def) => def.collections(),
            Self::Static(def) => def.collections(),
        }
    }

    /// Returns the lock mode.
    #[must_use]
    pub fn lock_mode(&self) -> LockMode {
        match self {
            Self::Auto(def) => def.lock_mode(),
            Self::Static(def) => def.lock_mode(),
        }
    }

    /// Returns the indexed fields.
    #[must_use]
    pub fn fields(&self) -> &[IndexField] {
        match self {
            Self::Auto(def) => def.fields(),
            Self::Static(def) => def.fields(),
        }
    }

    /// Returns the kind of index this definition produces.
    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::Auto(_) => IndexKind::AutoMap,
            Self::Static(def) if def.is_map_reduce() => IndexKind::MapReduce,
            Self::Static(_) => IndexKind::Map,
        }
    }
}

impl From<AutoIndexDefinition> for IndexDefinition {
    fn from(def: AutoIndexDefinition) -> Self {
        Self::Auto(def)
    }
}

impl From<StaticIndexDefinition> for IndexDefinition {
    fn from(def: StaticIndexDefinition) -> Self {
        Self::Static(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_mode_codes() {
        for mode in [
            LockMode::Unlocked,
            LockMode::LockedIgnore,
            LockMode::LockedError,
            LockMode::SideBySide,
        ] {
            assert_eq!(LockMode::try_from(i64::from(mode.code())).unwrap(), mode);
        }
        assert!(LockMode::try_from(4).is_err());
    }

    #[test]
    fn capability_table() {
        assert!(IndexKind::AutoMap.can_self_recreate());
        assert!(!IndexKind::Map.can_self_recreate());
        assert!(!IndexKind::MapReduce.can_self_recreate());
        assert!(IndexKind::MapReduce.is_map_reduce());
        assert!(!IndexKind::Map.is_map_reduce());
    }

    #[test]
    fn kind_follows_variant() {
        let auto: IndexDefinition = AutoIndexDefinition::new("Users", vec![IndexField::new("Name")])
            .unwrap()
            .into();
        assert_eq!(auto.kind(), IndexKind::AutoMap);

        let map = StaticIndexDefinition::builder("Users/Search")
            .collection("Users")
            .map("from u in docs.Users select new { u.Name }");
        let reduce = map.clone().reduce("from r in results select r");

        assert_eq!(IndexDefinition::from(map.build().unwrap()).kind(), IndexKind::Map);
        assert_eq!(
            IndexDefinition::from(reduce.build().unwrap()).kind(),
            IndexKind::MapReduce
        );
    }
}
