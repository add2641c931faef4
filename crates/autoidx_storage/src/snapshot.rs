//! CBOR encoding of committed tree state.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot format version.
const SNAPSHOT_FORMAT: u8 = 1;

/// Entries of a single tree, ordered by key.
pub(crate) type TreeEntries = BTreeMap<Vec<u8>, Vec<u8>>;

/// All trees of an environment, ordered by name.
pub(crate) type Trees = BTreeMap<String, TreeEntries>;

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    format: u8,
    trees: Vec<TreeRecord>,
}

#[derive(Serialize, Deserialize)]
struct TreeRecord {
    name: String,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

pub(crate) fn encode(trees: &Trees) -> StorageResult<Vec<u8>> {
    let record = SnapshotRecord {
        format: SNAPSHOT_FORMAT,
        trees: trees
            .iter()
            .map(|(name, entries)| TreeRecord {
                name: name.clone(),
                entries: entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect(),
    };

    let mut buf = Vec::new();
    ciborium::into_writer(&record, &mut buf)
        .map_err(|e| StorageError::Encoding(e.to_string()))?;
    Ok(buf)
}

pub(crate) fn decode(data: &[u8]) -> StorageResult<Trees> {
    let record: SnapshotRecord =
        ciborium::from_reader(data).map_err(|e| StorageError::Corrupted(e.to_string()))?;

    if record.format != SNAPSHOT_FORMAT {
        return Err(StorageError::Corrupted(format!(
            "unsupported snapshot format: {}",
            record.format
        )));
    }

    let mut trees = Trees::new();
    for tree in record.trees {
        if trees.contains_key(&tree.name) {
            return Err(StorageError::Corrupted(format!(
                "duplicate tree '{}'",
                tree.name
            )));
        }
        trees.insert(tree.name, tree.entries.into_iter().collect());
    }
    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn trees_strategy() -> impl Strategy<Value = Trees> {
        let entries = prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 0..16),
            prop::collection::vec(any::<u8>(), 0..64),
            0..8,
        );
        prop::collection::btree_map("[A-Za-z]{1,12}", entries, 0..5)
    }

    #[test]
    fn empty_snapshot() {
        let bytes = encode(&Trees::new()).unwrap();
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn trees_survive_encoding() {
        let mut trees = Trees::new();
        trees
            .entry("Definition".to_string())
            .or_default()
            .insert(b"Definition".to_vec(), vec![1, 2, 3]);
        trees.entry("Empty".to_string()).or_default();

        let decoded = decode(&encode(&trees).unwrap()).unwrap();
        assert_eq!(decoded, trees);
    }

    #[test]
    fn garbage_is_corrupted() {
        let result = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }

    proptest! {
        #[test]
        fn any_trees_survive_encoding(trees in trees_strategy()) {
            let decoded = decode(&encode(&trees).unwrap()).unwrap();
            prop_assert_eq!(decoded, trees);
        }

        #[test]
        fn truncated_snapshot_is_rejected(trees in trees_strategy(), cut in any::<prop::sample::Index>()) {
            let bytes = encode(&trees).unwrap();
            let len = cut.index(bytes.len());
            prop_assert!(matches!(decode(&bytes[..len]), Err(StorageError::Corrupted(_))));
        }
    }
}
