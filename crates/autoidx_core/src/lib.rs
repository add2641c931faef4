//! # autoidx Core
//!
//! Index catalog and lifecycle manager for a document database.
//!
//! This crate provides:
//! - Index definitions (auto-generated and authored) and canonical name derivation
//! - The create/replace decision, including lock-mode enforcement
//! - Definition persistence inside an index's transactional tree
//! - A concurrent catalog keyed by identifier and case-insensitive name
//! - Background recovery of indexes from the storage root
//! - [`IndexStore`], which orchestrates create, reset, delete, start and stop
//!
//! ## Layout on disk
//!
//! ```text
//! <index_storage_path>/
//! ├─ LOCK
//! └─ <id>/            # one environment per index
//!    └─ trees.cbor    # holds the "Definition" tree
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod change_feed;
mod config;
mod definition;
mod dir;
mod error;
mod handle;
mod persistence;
mod recovery;
mod store;
mod types;

pub use catalog::IndexCatalog;
pub use change_feed::{IndexChangeEvent, IndexChangeFeed, IndexChangeType, IndexNotifier};
pub use config::{IndexingConfig, DEFAULT_INDEX_STORAGE_PATH};
pub use definition::{
    decide, definitions_equal, derive_auto_index_name, field_display_token, is_auto_index_name,
    name_key, validate_index_name, AutoIndexDefinition, CompareOptions, FieldStorage,
    IndexCreationDecision, IndexDefinition, IndexField, IndexKind, LockMode, SortOption,
    StaticIndexDefinition, StaticIndexDefinitionBuilder, AUTO_INDEX_PREFIX,
};
pub use dir::{list_subdirectories, IndexStorageRoot};
pub use error::{CoreError, CoreResult};
pub use handle::{Index, IndexState};
pub use persistence::{
    decode_definition, encode_definition, load_definition, persist_definition, DEFINITION_KEY,
    DEFINITION_TREE,
};
pub use recovery::{parse_index_directory_ids, plan_recovery, RecoveryPlan, RecoveryReport};
pub use store::IndexStore;
pub use types::{IndexId, IndexRef};
