//! Decision cache
//!
//! Memoizes decisions per normalized description/destination pair for the
//! lifetime of the owning matcher. Entries are snapshots: values are cloned
//! on the way in and on the way out, so callers can never mutate what is
//! stored. There is no eviction.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::{Decision, NormalizedText};

/// Cache key for a normalized transaction
pub fn cache_key(description: &NormalizedText, destination: &NormalizedText) -> String {
    format!(
        "{}::{}",
        description.normalized_text, destination.normalized_text
    )
}

/// Thread-safe map from cache key to decision
#[derive(Debug, Default)]
pub struct DecisionCache {
    entries: RwLock<HashMap<String, Decision>>,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the cached decision for `key`, if any
    pub fn get(&self, key: &str) -> Option<Decision> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    /// Store a copy of `decision` under `key`, replacing any previous entry
    pub fn insert(&self, key: impl Into<String>, decision: &Decision) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), decision.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::normalize::normalize;
    use crate::matcher::types::Decision;

    #[test]
    fn test_cache_key_format() {
        let key = cache_key(&normalize("COMPRA EN STARBUCKS 1234"), &normalize("Starbucks"));
        assert_eq!(key, "starbucks::starbucks");

        let key = cache_key(&normalize("Bar Pepe"), &NormalizedText::default());
        assert_eq!(key, "bar pepe::");
    }

    #[test]
    fn test_cache_returns_snapshots() {
        let cache = DecisionCache::new();
        let mut decision = Decision::create("Bar Pepe", "");
        cache.insert("k", &decision);

        // Mutating the original does not touch the stored entry
        if let Decision::Create { account } = &mut decision {
            account.name = "Changed".to_string();
        }
        assert_eq!(cache.get("k").unwrap().account_name(), "Bar Pepe");

        // Mutating a retrieved copy does not either
        let mut fetched = cache.get("k").unwrap();
        if let Decision::Create { account } = &mut fetched {
            account.description = "mutated".to_string();
        }
        assert_eq!(cache.get("k").unwrap(), Decision::create("Bar Pepe", ""));
    }

    #[test]
    fn test_cache_len_and_clear() {
        let cache = DecisionCache::new();
        assert!(cache.is_empty());
        cache.insert("a", &Decision::create("A", ""));
        cache.insert("b", &Decision::create("B", ""));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }
}
