#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation using coalesced hashing.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::CapacityError;
pub use hash_table::HashTable;

#[cfg(feature = "foldhash")]
use core::hash::BuildHasher;

/// Default hash builder for the `S` type parameter of [`HashMap`], backed by
/// foldhash's fast `RandomState`.
///
/// This only implements `BuildHasher` when the `foldhash` feature is
/// enabled; otherwise it serves as a placeholder, and a custom `S` must be
/// supplied through [`HashMap::with_hasher`] for a functional map.
#[derive(Clone, Debug, Default)]
pub struct DefaultHashBuilder {
    #[cfg(feature = "foldhash")]
    inner: foldhash::fast::RandomState,
}

#[cfg(feature = "foldhash")]
impl BuildHasher for DefaultHashBuilder {
    type Hasher = <foldhash::fast::RandomState as BuildHasher>::Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}
