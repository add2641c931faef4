//! Indexed field descriptors.

use crate::error::{CoreError, CoreResult};

/// How the values of a field are sorted by queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SortOption {
    /// Default ordering.
    #[default]
    None = 0,
    /// Lexical ordering.
    String = 1,
    /// Numeric ordering.
    Numeric = 2,
}

impl SortOption {
    /// Returns the persisted code of this option.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for SortOption {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SortOption::None),
            1 => Ok(SortOption::String),
            2 => Ok(SortOption::Numeric),
            _ => Err(CoreError::corrupt_definition(format!(
                "unknown sort option: {value}"
            ))),
        }
    }
}

/// Whether the raw field value is kept in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FieldStorage {
    /// Value is not stored.
    #[default]
    No = 0,
    /// Value is stored.
    Yes = 1,
}

impl FieldStorage {
    /// Returns the persisted code of this mode.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for FieldStorage {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FieldStorage::No),
            1 => Ok(FieldStorage::Yes),
            _ => Err(CoreError::corrupt_definition(format!(
                "unknown field storage: {value}"
            ))),
        }
    }
}

/// One indexed field of a definition.
///
/// ```rust
/// use autoidx_core::{IndexField, SortOption};
///
/// let field = IndexField::new("Age").sorted(SortOption::Numeric).highlighted();
/// assert!(field.has_custom_sort());
/// assert!(field.highlighted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexField {
    /// Field name, unique within a definition.
    pub name: String,
    /// Sort option requested for the field.
    pub sort_option: SortOption,
    /// Whether query results highlight matches in this field.
    pub highlighted: bool,
    /// Storage mode.
    pub storage: FieldStorage,
}

impl IndexField {
    /// Creates a field with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_option: SortOption::None,
            highlighted: false,
            storage: FieldStorage::No,
        }
    }

    /// Sets the sort option.
    #[must_use]
    pub fn sorted(mut self, sort_option: SortOption) -> Self {
        self.sort_option = sort_option;
        self
    }

    /// Marks the field as highlighted.
    #[must_use]
    pub fn highlighted(mut self) -> Self {
        self.highlighted = true;
        self
    }

    /// Sets the storage mode.
    #[must_use]
    pub fn stored(mut self, storage: FieldStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Returns true if the field asks for a non-default sort.
    #[must_use]
    pub fn has_custom_sort(&self) -> bool {
        self.sort_option != SortOption::None
    }
}

/// Checks that every field has a non-empty name and that names are unique.
pub(crate) fn validate_fields(fields: &[IndexField]) -> CoreResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(fields.len());
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(CoreError::invalid_definition("field name must not be empty"));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(CoreError::invalid_definition(format!(
                "field '{}' is declared more than once",
                field.name
            )));
        }
    }
    Ok(())
}

/// Compares two field lists as order-independent multisets.
pub(crate) fn same_field_multiset(a: &[IndexField], b: &[IndexField]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: std::collections::HashMap<&IndexField, isize> =
        std::collections::HashMap::with_capacity(a.len());
    for field in a {
        *counts.entry(field).or_default() += 1;
    }
    for field in b {
        match counts.get_mut(field) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}
