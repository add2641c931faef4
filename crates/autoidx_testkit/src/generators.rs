//! Property-based test generators using proptest.
//!
//! Strategies only produce values that pass validation, so properties can
//! unwrap construction results.

use autoidx_core::{
    AutoIndexDefinition, IndexDefinition, IndexField, LockMode, SortOption, StaticIndexDefinition,
};
use proptest::prelude::*;

/// Strategy for collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for field names, including nested paths like `Address.City`.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,10}(\\.[A-Za-z][A-Za-z0-9]{0,6})?")
        .expect("Invalid regex")
}

/// Strategy for sort options.
pub fn sort_option_strategy() -> impl Strategy<Value = SortOption> {
    prop_oneof![
        Just(SortOption::None),
        Just(SortOption::String),
        Just(SortOption::Numeric),
    ]
}

/// Strategy for lock modes.
pub fn lock_mode_strategy() -> impl Strategy<Value = LockMode> {
    prop_oneof![
        Just(LockMode::Unlocked),
        Just(LockMode::LockedIgnore),
        Just(LockMode::LockedError),
        Just(LockMode::SideBySide),
    ]
}

/// Strategy for a list of fields with unique names.
pub fn field_set_strategy(max_fields: usize) -> impl Strategy<Value = Vec<IndexField>> {
    prop::collection::btree_map(
        field_name_strategy(),
        (sort_option_strategy(), any::<bool>()),
        1..=max_fields.max(1),
    )
    .prop_map(|fields| {
        fields
            .into_iter()
            .map(|(name, (sort, highlighted))| {
                let field = IndexField::new(name).sorted(sort);
                if highlighted {
                    field.highlighted()
                } else {
                    field
                }
            })
            .collect()
    })
}

/// Strategy for auto definitions with any lock mode.
pub fn auto_definition_strategy() -> impl Strategy<Value = AutoIndexDefinition> {
    (
        collection_name_strategy(),
        field_set_strategy(6),
        lock_mode_strategy(),
    )
        .prop_map(|(collection, fields, lock)| {
            AutoIndexDefinition::new(collection, fields)
                .expect("Generated auto definition should be valid")
                .with_lock_mode(lock)
        })
}

/// Strategy for authored map or map-reduce definitions.
pub fn static_definition_strategy() -> impl Strategy<Value = StaticIndexDefinition> {
    (
        prop::string::string_regex("(Orders|Users|Items)/[A-Z][a-z]{1,8}").expect("Invalid regex"),
        collection_name_strategy(),
        prop::collection::vec("[a-z]{1,6}( [a-z]{1,6}){0,4}", 1..3),
        prop::option::of("[a-z]{1,6}( [a-z]{1,6}){0,4}"),
        prop::option::of(1u32..64),
        lock_mode_strategy(),
    )
        .prop_map(|(name, collection, maps, reduce, max_outputs, lock)| {
            let mut builder = StaticIndexDefinition::builder(name)
                .collection(collection)
                .lock_mode(lock);
            for map in maps {
                builder = builder.map(map);
            }
            if let Some(reduce) = reduce {
                builder = builder.reduce(reduce);
            }
            if let Some(limit) = max_outputs {
                builder = builder.max_outputs_per_document(limit);
            }
            builder
                .build()
                .expect("Generated static definition should be valid")
        })
}

/// Strategy for any definition variant.
pub fn definition_strategy() -> impl Strategy<Value = IndexDefinition> {
    prop_oneof![
        auto_definition_strategy().prop_map(IndexDefinition::from),
        static_definition_strategy().prop_map(IndexDefinition::from),
    ]
}

/// Strategy for a permutation of `fields`.
pub fn shuffled(fields: Vec<IndexField>) -> impl Strategy<Value = Vec<IndexField>> {
    Just(fields).prop_shuffle()
}
