//! Fast hash map type alias.
//!
//! The module registry is keyed by module root paths, which are hashed on
//! every lookup made for an incoming change notification. The Fx hash from
//! `rustc-hash` is considerably faster than SipHash for these keys, and the
//! keys never come from an untrusted network source.
//!
//! # Examples
//!
//! ```
//! use cw_core::{FxHashMap, fx_hash_map};
//!
//! let mut watched: FxHashMap<String, u64> = fx_hash_map();
//! watched.insert("/work/service".to_owned(), 1);
//! assert_eq!(watched.get("/work/service"), Some(&1));
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}
