//! Hash containers used throughout streamline. Keys are resource ids and other values generated
//! in-process, so the DoS-resistant std hasher is swapped for ahash.

pub type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
pub type HashSet<T> = std::collections::HashSet<T, ahash::RandomState>;
