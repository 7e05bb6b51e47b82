use super::AttributeStorage;
use crate::core::{CachedValue, Result, SubjectId};
use log::debug;
use std::collections::HashMap;

/// Hit/miss counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Per-subject attribute cache.
///
/// Each key is fetched at most once for the lifetime of the cache and is
/// never invalidated; build a new cache to observe fresh data.
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: HashMap<String, CachedValue>,
    stats: CacheStats,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `key` for `subject_id`, reading storage only on a miss.
    ///
    /// A missing row and a row whose value is NULL both become
    /// [`CachedValue::Unset`]; a stored empty string stays `Set("")`.
    pub async fn resolve(
        &mut self,
        storage: &dyn AttributeStorage,
        table: &str,
        subject_id: Option<SubjectId>,
        key: &str,
    ) -> Result<CachedValue> {
        if let Some(cached) = self.entries.get(key) {
            self.stats.hits += 1;
            return Ok(cached.clone());
        }

        self.stats.misses += 1;
        let resolved = match subject_id {
            Some(subject_id) => {
                debug!("attribute cache miss: table='{table}' subject={subject_id} key='{key}'");
                storage
                    .find(table, subject_id, key)
                    .await?
                    .map_or(CachedValue::Unset, |row| CachedValue::from(row.value))
            }
            // An unsaved subject cannot own rows yet.
            None => CachedValue::Unset,
        };

        self.entries.insert(key.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Seeds entries from a bulk read without touching the counters.
    pub fn prime<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, CachedValue)>,
    {
        for (key, value) in entries {
            self.entries.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&CachedValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
