//! Auto-index definitions.

use crate::definition::field::{validate_fields, FieldStorage, IndexField};
use crate::definition::naming::derive_auto_index_name;
use crate::definition::LockMode;
use crate::error::CoreResult;
use std::slice;

/// Definition of an index generated from an observed query shape.
///
/// The name is derived from the collection and fields at construction and
/// never changes afterwards. Auto-index fields are never stored, so any
/// requested storage mode is normalized to [`FieldStorage::No`].
///
/// ```rust
/// use autoidx_core::{AutoIndexDefinition, IndexField};
///
/// let def = AutoIndexDefinition::new("Users", vec![IndexField::new("Name")]).unwrap();
/// assert_eq!(def.name(), "Auto/Users/ByName");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoIndexDefinition {
    name: String,
    collection: String,
    lock_mode: LockMode,
    fields: Vec<IndexField>,
}

impl AutoIndexDefinition {
    /// Creates an unlocked auto definition.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidDefinition`] for a blank collection,
    /// an empty field list, blank field names or duplicate field names.
    pub fn new(collection: impl Into<String>, fields: Vec<IndexField>) -> CoreResult<Self> {
        let collection = collection.into();
        validate_fields(&fields)?;
        let name = derive_auto_index_name(&collection, &fields)?;
        let fields = fields
            .into_iter()
            .map(|f| f.stored(FieldStorage::No))
            .collect();

        Ok(Self {
            name,
            collection,
            lock_mode: LockMode::Unlocked,
            fields,
        })
    }

    /// Sets the lock mode.
    #[must_use]
    pub fn with_lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// Returns the derived name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the indexed collection.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the collections as a one-element slice.
    #[must_use]
    pub fn collections(&self) -> &[String] {
        slice::from_ref(&self.collection)
    }

    /// Returns the lock mode.
    #[must_use]
    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    /// Returns the indexed fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::field::SortOption;
    use crate::error::CoreError;

    #[test]
    fn name_is_derived() {
        let def = AutoIndexDefinition::new(
            "Users",
            vec![
                IndexField::new("Name"),
                IndexField::new("Age").sorted(SortOption::Numeric),
            ],
        )
        .unwrap();
        assert_eq!(def.name(), "Auto/Users/ByAgeAndNameSortByAge");
        assert_eq!(def.collections(), ["Users".to_string()]);
        assert_eq!(def.lock_mode(), LockMode::Unlocked);
    }

    #[test]
    fn storage_is_normalized() {
        let def = AutoIndexDefinition::new(
            "Users",
            vec![IndexField::new("Name").stored(FieldStorage::Yes)],
        )
        .unwrap();
        assert_eq!(def.fields()[0].storage, FieldStorage::No);
    }

    #[test]
    fn lock_mode_does_not_change_name() {
        let def = AutoIndexDefinition::new("Users", vec![IndexField::new("Name")])
            .unwrap()
            .with_lock_mode(LockMode::LockedError);
        assert_eq!(def.name(), "Auto/Users/ByName");
        assert_eq!(def.lock_mode(), LockMode::LockedError);
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(matches!(
            AutoIndexDefinition::new(" ", vec![IndexField::new("Name")]),
            Err(CoreError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            AutoIndexDefinition::new("Users", vec![]),
            Err(CoreError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            AutoIndexDefinition::new(
                "Users",
                vec![IndexField::new("Name"), IndexField::new("Name").highlighted()]
            ),
            Err(CoreError::InvalidDefinition { .. })
        ));
    }
}
