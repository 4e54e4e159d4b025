#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Error kinds shared by every table operation.
pub mod error;

/// A HashMap built on the coalesced hash table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with pluggable key policies.
pub mod hash_map;

/// A hash set built on the coalesced hash table.
///
/// This module provides a `HashSet` that wraps a `HashMap` with no payload.
pub mod hash_set;

/// The coalesced hashing engine with a cellar.
pub mod hash_table;

/// Key hashing and equality policies.
pub mod key_hash;

/// Detached copies of table contents.
pub mod snapshot;

pub use error::Error;
pub use error::Result;
#[cfg(feature = "foldhash")]
pub use hash_map::FoldHashMap;
pub use hash_map::HashMap;
pub use hash_map::IntHashMap;
pub use hash_map::StrHashMap;
#[cfg(feature = "foldhash")]
pub use hash_set::FoldHashSet;
pub use hash_set::HashSet;
pub use hash_set::IntHashSet;
pub use hash_set::StrHashSet;
pub use hash_table::HashTable;
#[cfg(feature = "foldhash")]
pub use key_hash::FoldHash;
pub use key_hash::Djb2;
pub use key_hash::IdentityHash;
pub use key_hash::KeyFns;
pub use key_hash::KeyHasher;
pub use snapshot::Snapshot;
