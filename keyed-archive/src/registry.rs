use std::collections::HashMap;

/// Key table of a RegisterMap archive.
///
/// A top archive carries every key string once, together with a parallel
/// table of 32-bit hashes. Entries of the top archive and of all nested sub
/// archives are then keyed by hash only. The registry lives for the duration
/// of one top-level decode.
///
/// Hash collisions are not detected: a later duplicate hash replaces the
/// earlier key.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    keys: HashMap<u32, String>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Pairs up the key table with its hash table, in order.
    pub fn from_tables(keys: Vec<String>, hashes: &[u32]) -> Registry {
        let mut registry = Registry::new();
        for (key, hash) in keys.into_iter().zip(hashes.iter()) {
            registry.insert(*hash, key);
        }
        registry
    }

    pub fn insert(&mut self, hash: u32, key: String) {
        self.keys.insert(hash, key);
    }

    pub fn resolve(&self, hash: u32) -> Option<&str> {
        self.keys.get(&hash).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
