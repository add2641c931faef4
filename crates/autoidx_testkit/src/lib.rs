//! # autoidx Testkit
//!
//! Test utilities for the autoidx index catalog.
//!
//! This crate provides:
//! - Ready-made stores over memory or a temporary index root
//! - Helpers that lay out index directories on disk, valid or damaged
//! - Property-based generators for fields and definitions
//! - Concurrency stress helpers for the lifecycle manager
//!
//! ## Usage
//!
//! ```rust
//! use autoidx_testkit::prelude::*;
//!
//! with_memory_store(|store| {
//!     let id = store.create_auto_index(users_by(&["Name"])).unwrap();
//!     assert!(store.get_index(id).is_some());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
