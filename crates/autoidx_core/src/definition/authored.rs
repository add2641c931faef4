//! Explicitly authored map and map-reduce definitions.

use crate::definition::field::{validate_fields, IndexField};
use crate::definition::naming::{name_key, validate_index_name};
use crate::definition::LockMode;
use crate::error::{CoreError, CoreResult};

/// Definition of an index written by hand rather than generated.
///
/// A definition with a reduce function is a map-reduce index, otherwise a
/// map index. Build one with [`StaticIndexDefinition::builder`]:
///
/// ```rust
/// use autoidx_core::{IndexField, StaticIndexDefinition};
///
/// let def = StaticIndexDefinition::builder("Orders/Totals")
///     .collection("Orders")
///     .map("from o in docs.Orders select new { o.Company, o.Total }")
///     .reduce("from r in results group r by r.Company into g select new { g.Key, Total = g.Sum(x => x.Total) }")
///     .field(IndexField::new("Company"))
///     .build()
///     .unwrap();
/// assert!(def.is_map_reduce());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIndexDefinition {
    name: String,
    collections: Vec<String>,
    lock_mode: LockMode,
    fields: Vec<IndexField>,
    maps: Vec<String>,
    reduce: Option<String>,
    max_outputs_per_document: Option<u32>,
}

impl StaticIndexDefinition {
    /// Starts building a definition with an explicit name.
    pub fn builder(name: impl Into<String>) -> StaticIndexDefinitionBuilder {
        StaticIndexDefinitionBuilder {
            name: name.into(),
            collections: Vec::new(),
            lock_mode: LockMode::Unlocked,
            fields: Vec::new(),
            maps: Vec::new(),
            reduce: None,
            max_outputs_per_document: None,
        }
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source collections in declaration order.
    #[must_use]
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Returns the lock mode.
    #[must_use]
    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    /// Returns the per-field options.
    #[must_use]
    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    /// Returns the map function sources.
    #[must_use]
    pub fn maps(&self) -> &[String] {
        &self.maps
    }

    /// Returns the reduce function source, if any.
    #[must_use]
    pub fn reduce(&self) -> Option<&str> {
        self.reduce.as_deref()
    }

    /// Returns the per-document output cap, if any.
    #[must_use]
    pub fn max_outputs_per_document(&self) -> Option<u32> {
        self.max_outputs_per_document
    }

    /// Returns true if the definition has a reduce step.
    #[must_use]
    pub fn is_map_reduce(&self) -> bool {
        self.reduce.is_some()
    }
}

/// Builder for [`StaticIndexDefinition`].
#[derive(Debug, Clone)]
pub struct StaticIndexDefinitionBuilder {
    name: String,
    collections: Vec<String>,
    lock_mode: LockMode,
    fields: Vec<IndexField>,
    maps: Vec<String>,
    reduce: Option<String>,
    max_outputs_per_document: Option<u32>,
}

impl StaticIndexDefinitionBuilder {
    /// Adds a source collection.
    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collections.push(collection.into());
        self
    }

    /// Adds a map function.
    #[must_use]
    pub fn map(mut self, source: impl Into<String>) -> Self {
        self.maps.push(source.into());
        self
    }

    /// Sets the reduce function.
    #[must_use]
    pub fn reduce(mut self, source: impl Into<String>) -> Self {
        self.reduce = Some(source.into());
        self
    }

    /// Adds per-field options.
    #[must_use]
    pub fn field(mut self, field: IndexField) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the lock mode.
    #[must_use]
    pub fn lock_mode(mut self, lock_mode: LockMode) -> Self {
        self.lock_mode = lock_mode;
        self
    }

    /// Caps the number of entries a single document may produce.
    #[must_use]
    pub fn max_outputs_per_document(mut self, limit: u32) -> Self {
        self.max_outputs_per_document = Some(limit);
        self
    }

    /// Validates and builds the definition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDefinition`] if the name is invalid or
    /// reserved, no collection or map is given, a collection is blank or
    /// repeated, a map or reduce source is blank, or field names collide.
    pub fn build(self) -> CoreResult<StaticIndexDefinition> {
        validate_index_name(&self.name)?;

        if self.collections.is_empty() {
            return Err(CoreError::invalid_definition(format!(
                "index '{}' must target at least one collection",
                self.name
            )));
        }
        for (i, collection) in self.collections.iter().enumerate() {
            if collection.trim().is_empty() {
                return Err(CoreError::invalid_definition("collection must not be empty"));
            }
            let key = name_key(collection);
            if self.collections[..i].iter().any(|c| name_key(c) == key) {
                return Err(CoreError::invalid_definition(format!(
                    "collection '{collection}' is listed more than once"
                )));
            }
        }

        if self.maps.is_empty() || self.maps.iter().any(|m| m.trim().is_empty()) {
            return Err(CoreError::invalid_definition(format!(
                "index '{}' needs at least one non-empty map",
                self.name
            )));
        }
        if matches!(&self.reduce, Some(r) if r.trim().is_empty()) {
            return Err(CoreError::invalid_definition(format!(
                "index '{}' has an empty reduce",
                self.name
            )));
        }

        validate_fields(&self.fields)?;

        Ok(StaticIndexDefinition {
            name: self.name,
            collections: self.collections,
            lock_mode: self.lock_mode,
            fields: self.fields,
            maps: self.maps,
            reduce: self.reduce,
            max_outputs_per_document: self.max_outputs_per_document,
        })
    }
}
