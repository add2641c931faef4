//! Definition equality and the create/replace decision.

use crate::definition::field::same_field_multiset;
use crate::definition::naming::name_key;
use crate::definition::{IndexDefinition, LockMode, StaticIndexDefinition};
use crate::error::{CoreError, CoreResult};
use std::collections::BTreeSet;

/// Tolerances applied when comparing two definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareOptions {
    /// Compare map/reduce sources with whitespace collapsed.
    pub ignore_formatting: bool,
    /// Ignore differences in the per-document output cap.
    pub ignore_output_count_limits: bool,
}

impl CompareOptions {
    /// Every difference counts.
    pub const STRICT: Self = Self {
        ignore_formatting: false,
        ignore_output_count_limits: false,
    };

    /// Formatting and output-count limits are ignored. Used by the create path.
    pub const LENIENT: Self = Self {
        ignore_formatting: true,
        ignore_output_count_limits: true,
    };
}

/// Outcome of comparing an incoming definition with the registered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreationDecision {
    /// No index has this name yet.
    Create,
    /// The registered index already matches; keep it and its identifier.
    Noop,
    /// Delete the registered index and create a new one with a fresh identifier.
    Replace,
}

/// Returns true if two definitions describe the same index.
///
/// Definitions are equal when names match case-insensitively, collections
/// match as sets, fields match as a multiset (name, sort option, highlight,
/// storage), and for authored definitions the map and reduce sources match.
/// Lock modes are not part of identity.
#[must_use]
pub fn definitions_equal(
    existing: &IndexDefinition,
    new: &IndexDefinition,
    options: CompareOptions,
) -> bool {
    if name_key(existing.name()) != name_key(new.name()) {
        return false;
    }
    if collection_set(existing.collections()) != collection_set(new.collections()) {
        return false;
    }
    if !same_field_multiset(existing.fields(), new.fields()) {
        return false;
    }

    match (existing, new) {
        (IndexDefinition::Auto(_), IndexDefinition::Auto(_)) => true,
        (IndexDefinition::Static(a), IndexDefinition::Static(b)) => {
            static_sources_equal(a, b, options)
        }
        _ => false,
    }
}

fn collection_set(collections: &[String]) -> BTreeSet<String> {
    collections.iter().map(String::as_str).map(name_key).collect()
}

fn static_sources_equal(
    a: &StaticIndexDefinition,
    b: &StaticIndexDefinition,
    options: CompareOptions,
) -> bool {
    let normalize = |source: &str| {
        if options.ignore_formatting {
            source.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            source.to_string()
        }
    };

    let mut maps_a: Vec<String> = a.maps().iter().map(|m| normalize(m)).collect();
    let mut maps_b: Vec<String> = b.maps().iter().map(|m| normalize(m)).collect();
    maps_a.sort();
    maps_b.sort();
    if maps_a != maps_b {
        return false;
    }

    if a.reduce().map(normalize) != b.reduce().map(normalize) {
        return false;
    }

    options.ignore_output_count_limits
        || a.max_outputs_per_document() == b.max_outputs_per_document()
}

/// Decides what a create request for `new` must do given the registered
/// definition with the same name, if any.
///
/// The existing definition's lock mode is checked first:
/// - `LockedError` rejects the request
/// - `LockedIgnore` keeps the existing index regardless of differences
/// - `SideBySide` is not implemented and fails with [`CoreError::Unsupported`]
///
/// # Errors
///
/// Returns [`CoreError::LockConflict`] or [`CoreError::Unsupported`] as above.
pub fn decide(
    new: &IndexDefinition,
    existing: Option<&IndexDefinition>,
) -> CoreResult<IndexCreationDecision> {
    let Some(existing) = existing else {
        return Ok(IndexCreationDecision::Create);
    };

    match existing.lock_mode() {
        LockMode::LockedError => Err(CoreError::lock_conflict(existing.name())),
        LockMode::LockedIgnore => Ok(IndexCreationDecision::Noop),
        LockMode::SideBySide => Err(CoreError::unsupported(format!(
            "side-by-side replacement of index '{}' is not implemented",
            existing.name()
        ))),
        LockMode::Unlocked => {
            if definitions_equal(existing, new, CompareOptions::LENIENT) {
                Ok(IndexCreationDecision::Noop)
            } else {
                Ok(IndexCreationDecision::Replace)
            }
        }
    }
}
