use std::hash::BuildHasherDefault;

use indexmap::IndexMap;

pub mod bit_field;
pub mod histogram;
pub mod index;
pub mod index_storage;

pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub use rustc_hash::{FxHashMap, FxHasher};
