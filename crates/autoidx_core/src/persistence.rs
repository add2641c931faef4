//! Definition persistence.
//!
//! Each index environment holds its definition as one CBOR record under the
//! `Definition` key of the `Definition` tree:
//!
//! ```text
//! {
//!   Kind?:                  0 | 1 | 2          (absent = auto map)
//!   Name?:                  string             (authored definitions only)
//!   Collections:            [string]
//!   LockMode:               int
//!   MapFields:              [{ Name, Highlighted, SortOption, Storage? }]
//!   Maps?, Reduce?, MaxOutputsPerDocument?
//! }
//! ```
//!
//! Auto definitions do not store their name or field storage modes; the
//! name is derived again on load and storage is always `No`.
//!
//! The codec never opens a transaction of its own. Callers hand in the
//! transaction and decide when it commits.

use crate::definition::{
    AutoIndexDefinition, FieldStorage, IndexDefinition, IndexField, IndexKind, LockMode,
    SortOption, StaticIndexDefinition,
};
use crate::error::{CoreError, CoreResult};
use autoidx_storage::{ReadTransaction, StorageError, WriteTransaction};
use serde::{Deserialize, Serialize};

/// Tree holding the definition record.
pub const DEFINITION_TREE: &str = "Definition";

/// Key of the definition record inside [`DEFINITION_TREE`].
pub const DEFINITION_KEY: &[u8] = b"Definition";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DefinitionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    collections: Vec<String>,
    lock_mode: i64,
    map_fields: Vec<FieldRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    maps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reduce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_outputs_per_document: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FieldRecord {
    name: String,
    highlighted: bool,
    sort_option: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage: Option<i64>,
}

impl FieldRecord {
    fn from_field(field: &IndexField, with_storage: bool) -> Self {
        Self {
            name: field.name.clone(),
            highlighted: field.highlighted,
            sort_option: i64::from(field.sort_option.code()),
            storage: with_storage.then(|| i64::from(field.storage.code())),
        }
    }

    fn into_field(self) -> CoreResult<IndexField> {
        let mut field = IndexField::new(self.name).sorted(SortOption::try_from(self.sort_option)?);
        if self.highlighted {
            field = field.highlighted();
        }
        if let Some(storage) = self.storage {
            field = field.stored(FieldStorage::try_from(storage)?);
        }
        Ok(field)
    }
}

impl DefinitionRecord {
    fn from_definition(definition: &IndexDefinition) -> Self {
        match definition {
            IndexDefinition::Auto(def) => Self {
                kind: None,
                name: None,
                collections: vec![def.collection().to_string()],
                lock_mode: i64::from(def.lock_mode().code()),
                map_fields: def
                    .fields()
                    .iter()
                    .map(|f| FieldRecord::from_field(f, false))
                    .collect(),
                maps: Vec::new(),
                reduce: None,
                max_outputs_per_document: None,
            },
            IndexDefinition::Static(def) => Self {
                kind: Some(i64::from(definition.kind().code())),
                name: Some(def.name().to_string()),
                collections: def.collections().to_vec(),
                lock_mode: i64::from(def.lock_mode().code()),
                map_fields: def
                    .fields()
                    .iter()
                    .map(|f| FieldRecord::from_field(f, true))
                    .collect(),
                maps: def.maps().to_vec(),
                reduce: def.reduce().map(str::to_string),
                max_outputs_per_document: def.max_outputs_per_document(),
            },
        }
    }

    fn into_definition(self) -> CoreResult<IndexDefinition> {
        let kind = match self.kind {
            None => IndexKind::AutoMap,
            Some(code) => IndexKind::try_from(code)?,
        };
        let lock_mode = LockMode::try_from(self.lock_mode)?;
        let fields = self
            .map_fields
            .into_iter()
            .map(FieldRecord::into_field)
            .collect::<CoreResult<Vec<_>>>()?;

        match kind {
            IndexKind::AutoMap => {
                let [collection]: [String; 1] = self.collections.try_into().map_err(|c: Vec<_>| {
                    CoreError::corrupt_definition(format!(
                        "auto definition must have exactly one collection, found {}",
                        c.len()
                    ))
                })?;
                let def = AutoIndexDefinition::new(collection, fields)
                    .map_err(|e| CoreError::corrupt_definition(e.to_string()))?
                    .with_lock_mode(lock_mode);
                Ok(def.into())
            }
            IndexKind::Map | IndexKind::MapReduce => {
                let name = self
                    .name
                    .ok_or_else(|| CoreError::corrupt_definition("authored definition has no name"))?;
                let mut builder = StaticIndexDefinition::builder(name).lock_mode(lock_mode);
                for collection in self.collections {
                    builder = builder.collection(collection);
                }
                for map in self.maps {
                    builder = builder.map(map);
                }
                for field in fields {
                    builder = builder.field(field);
                }
                if let Some(limit) = self.max_outputs_per_document {
                    builder = builder.max_outputs_per_document(limit);
                }
                match (kind, self.reduce) {
                    (IndexKind::MapReduce, Some(reduce)) => builder = builder.reduce(reduce),
                    (IndexKind::MapReduce, None) => {
                        return Err(CoreError::corrupt_definition(
                            "map-reduce definition has no reduce",
                        ))
                    }
                    (_, Some(_)) => {
                        return Err(CoreError::corrupt_definition(
                            "map definition carries a reduce",
                        ))
                    }
                    (_, None) => {}
                }
                let def = builder
                    .build()
                    .map_err(|e| CoreError::corrupt_definition(e.to_string()))?;
                Ok(def.into())
            }
        }
    }
}

/// Encodes a definition into its persisted byte form.
///
/// # Errors
///
/// Returns [`CoreError::Storage`] if CBOR encoding fails.
pub fn encode_definition(definition: &IndexDefinition) -> CoreResult<Vec<u8>> {
    let record = DefinitionRecord::from_definition(definition);
    let mut bytes = Vec::new();
    ciborium::into_writer(&record, &mut bytes)
        .map_err(|e| StorageError::Encoding(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a definition from its persisted byte form.
///
/// # Errors
///
/// Returns [`CoreError::CorruptDefinition`] if the bytes are not a record,
/// required entries are missing, or enum codes are unknown.
pub fn decode_definition(bytes: &[u8]) -> CoreResult<IndexDefinition> {
    let record: DefinitionRecord = ciborium::from_reader(bytes)
        .map_err(|e| CoreError::corrupt_definition(e.to_string()))?;
    record.into_definition()
}

/// Writes `definition` into the caller's write transaction.
///
/// Nothing is visible until the caller commits.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn persist_definition(
    definition: &IndexDefinition,
    txn: &mut WriteTransaction<'_>,
) -> CoreResult<()> {
    let bytes = encode_definition(definition)?;
    txn.create_tree(DEFINITION_TREE).put(DEFINITION_KEY, &bytes);
    Ok(())
}

/// Reads the definition visible to `txn`.
///
/// Returns `Ok(None)` when nothing has been written yet.
///
/// # Errors
///
/// Returns [`CoreError::CorruptDefinition`] if the record cannot be decoded.
pub fn load_definition(txn: &ReadTransaction) -> CoreResult<Option<IndexDefinition>> {
    let Some(tree) = txn.tree(DEFINITION_TREE) else {
        return Ok(None);
    };
    tree.get(DEFINITION_KEY).map(decode_definition).transpose()
}
