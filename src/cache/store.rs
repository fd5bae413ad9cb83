//! Entry Store Module
//!
//! HashMap-backed expiring storage with the key-count admission policy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Entry Store ==
/// Expiring key/value storage.
///
/// Expired entries stay in the map until a sweep or an overwrite removes
/// them; lookups simply ignore them.
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Admission cap, `None` = unbounded
    max_entries: Option<usize>,
}

impl<V> EntryStore<V> {
    // == Constructor ==
    /// Creates an empty store. A cap of `Some(0)` is treated as unbounded.
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.filter(|&max| max > 0),
        }
    }

    // == Insert ==
    /// Stores `value` under `key` for `ttl`, replacing any prior entry.
    ///
    /// The admission check looks at the raw entry count only: once the cap is
    /// reached every write is rejected, overwrites of existing keys included.
    pub fn insert(&mut self, key: &str, value: V, ttl: Duration) -> Result<()> {
        validate_key(key)?;

        if let Some(max) = self.max_entries {
            if self.entries.len() >= max {
                return Err(CacheError::CapacityExceeded { max });
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        Ok(())
    }

    // == Get ==
    /// Returns the entry for `key` if it is still live at `now`.
    pub fn get_live(&self, key: &str, now: Instant) -> Option<&CacheEntry<V>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
    }

    // == Remove ==
    /// Removes an entry by key, returning whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Remove Expired ==
    /// Removes every entry expired at `now` whose key is not `held`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired<F>(&mut self, now: Instant, held: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries
            .retain(|key, entry| !entry.is_expired_at(now) || held(key));
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the raw number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key must not be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const LONG: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_new() {
        let store: EntryStore<String> = EntryStore::new(None);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_insert_and_get() {
        let mut store = EntryStore::new(None);

        store.insert("key1", "value1", LONG).unwrap();
        let entry = store.get_live("key1", Instant::now()).unwrap();

        assert_eq!(entry.value, "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store: EntryStore<u8> = EntryStore::new(None);
        assert!(store.get_live("nonexistent", Instant::now()).is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = EntryStore::new(None);

        store.insert("key1", 1, LONG).unwrap();
        store.insert("key1", 2, LONG).unwrap();

        assert_eq!(store.get_live("key1", Instant::now()).unwrap().value, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_expired_entry_is_not_served() {
        let mut store = EntryStore::new(None);

        store.insert("key1", "value1", Duration::from_millis(20)).unwrap();
        assert!(store.get_live("key1", Instant::now()).is_some());

        sleep(Duration::from_millis(40));

        assert!(store.get_live("key1", Instant::now()).is_none());
        // Still counted until a sweep removes it
        assert!(store.contains_key("key1"));
    }

    #[test]
    fn test_store_capacity_rejects_new_keys() {
        let mut store = EntryStore::new(Some(2));

        store.insert("a", 1, LONG).unwrap();
        store.insert("b", 2, LONG).unwrap();

        let result = store.insert("c", 3, LONG);
        assert_eq!(result, Err(CacheError::CapacityExceeded { max: 2 }));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_capacity_rejects_overwrite_when_full() {
        let mut store = EntryStore::new(Some(2));

        store.insert("a", 1, LONG).unwrap();
        store.insert("b", 2, LONG).unwrap();

        // Raw-count admission: the key exists but the cache is full
        let result = store.insert("a", 10, LONG);
        assert!(matches!(result, Err(CacheError::CapacityExceeded { .. })));
        assert_eq!(store.get_live("a", Instant::now()).unwrap().value, 1);
    }

    #[test]
    fn test_store_zero_cap_is_unbounded() {
        let mut store = EntryStore::new(Some(0));
        for i in 0..50 {
            store.insert(&format!("key{i}"), i, LONG).unwrap();
        }
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_store_remove() {
        let mut store = EntryStore::new(None);

        store.insert("key1", "value1", LONG).unwrap();
        assert!(store.remove("key1"));
        assert!(!store.remove("key1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_remove_expired_skips_held_keys() {
        let mut store = EntryStore::new(None);

        store.insert("short", 1, Duration::from_millis(10)).unwrap();
        store.insert("held", 2, Duration::from_millis(10)).unwrap();
        store.insert("long", 3, LONG).unwrap();

        sleep(Duration::from_millis(30));

        let removed = store.remove_expired(Instant::now(), |key| key == "held");
        assert_eq!(removed, 1);
        assert!(!store.contains_key("short"));
        assert!(store.contains_key("held"));
        assert!(store.contains_key("long"));
    }

    #[test]
    fn test_store_rejects_invalid_keys() {
        let mut store = EntryStore::new(None);

        assert!(matches!(
            store.insert("", 1, LONG),
            Err(CacheError::InvalidKey(_))
        ));

        let long_key = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(matches!(
            store.insert(&long_key, 1, LONG),
            Err(CacheError::InvalidKey(_))
        ));
        assert!(store.is_empty());
    }
}
