//! Bounded FIFO cache of extracted fields.
//!
//! Extraction runs three hundred relaxation sweeps over a canvas of up to a
//! million cells, so repeat requests for the same logo are worth remembering.
//! The cache is a plain owned value; whoever drives extraction owns one.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::field::RenderableField;
use crate::source::SourceImage;
use crate::{extract, ExtractError};

/// Default number of retained fields, matching the extraction-level limit of
/// the rendering stack this feeds.
pub const DEFAULT_CAPACITY: usize = 10;

/// Identity of a logo file: name, byte size and last-modified time. Any
/// edit to the file produces a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub name: String,
    pub len: u64,
    pub modified_ms: u64,
}

impl FieldKey {
    pub fn new(name: impl Into<String>, len: u64, modified_ms: u64) -> Self {
        Self {
            name: name.into(),
            len,
            modified_ms,
        }
    }

    /// Builds the key from a path's metadata. Filesystems without
    /// modification times key on zero.
    pub fn for_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|err| ExtractError::InvalidInput {
            reason: format!("failed to stat {}: {err}", path.display()),
        })?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            len: metadata.len(),
            modified_ms,
        })
    }
}

/// Keyed store evicting its oldest insertion once full. Re-inserting an
/// existing key replaces the value but keeps the key's original position in
/// the eviction order.
#[derive(Debug)]
pub struct FieldCache {
    capacity: usize,
    order: VecDeque<FieldKey>,
    entries: HashMap<FieldKey, Arc<RenderableField>>,
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl FieldCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup without any recency effect.
    pub fn get(&self, key: &FieldKey) -> Option<Arc<RenderableField>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: FieldKey, value: Arc<RenderableField>) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    debug!(name = %oldest.name, "evicting oldest cached field");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Returns the cached raster for `key`, extracting and storing it on a
    /// miss. A hit hands back the stored allocation untouched.
    pub fn get_or_extract(
        &mut self,
        key: &FieldKey,
        source: &SourceImage,
    ) -> Result<Arc<RenderableField>, ExtractError> {
        if let Some(hit) = self.get(key) {
            debug!(name = %key.name, "field cache hit");
            return Ok(hit);
        }
        debug!(name = %key.name, "field cache miss");
        let extraction = extract(source)?;
        let raster = Arc::new(extraction.raster);
        self.insert(key.clone(), Arc::clone(&raster));
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> FieldKey {
        FieldKey::new(name, 1, 1)
    }

    fn raster(tag: u8) -> Arc<RenderableField> {
        Arc::new(RenderableField::from_raw(1, 1, vec![tag, tag, tag, 255]))
    }

    #[test]
    fn evicts_oldest_insertion_first() {
        let mut cache = FieldCache::new(2);
        cache.insert(key("a"), raster(1));
        cache.insert(key("b"), raster(2));
        cache.insert(key("c"), raster(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn overwrite_keeps_original_position() {
        let mut cache = FieldCache::new(2);
        cache.insert(key("a"), raster(1));
        cache.insert(key("b"), raster(2));
        cache.insert(key("a"), raster(9));
        cache.insert(key("c"), raster(3));

        // "a" kept its slot at the front of the queue, so it goes first.
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.get(&key("b")).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn overwritten_value_is_visible() {
        let mut cache = FieldCache::new(2);
        cache.insert(key("a"), raster(1));
        cache.insert(key("a"), raster(7));
        let stored = cache.get(&key("a")).expect("entry");
        assert_eq!(stored.pixels()[0], 7);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = FieldCache::new(3);
        cache.insert(key("a"), raster(1));
        cache.insert(key("b"), raster(2));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&key("a")).is_none());
    }

    #[test]
    fn hit_returns_the_stored_allocation() {
        let mut cache = FieldCache::new(2);
        let stored = raster(5);
        cache.insert(key("a"), Arc::clone(&stored));
        let fetched = cache.get(&key("a")).expect("entry");
        assert!(Arc::ptr_eq(&stored, &fetched));
    }

    #[test]
    fn metadata_differences_produce_distinct_keys() {
        assert_ne!(FieldKey::new("logo.png", 10, 5), FieldKey::new("logo.png", 11, 5));
        assert_ne!(FieldKey::new("logo.png", 10, 5), FieldKey::new("logo.png", 10, 6));
        assert_ne!(FieldKey::new("logo.png", 10, 5), FieldKey::new("other.png", 10, 5));
        assert_eq!(FieldKey::new("logo.png", 10, 5), FieldKey::new("logo.png", 10, 5));
    }

    #[test]
    fn key_for_path_reads_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"0123456789").expect("write");
        let key = FieldKey::for_path(&path).expect("key");
        assert_eq!(key.name, "logo.png");
        assert_eq!(key.len, 10);

        std::fs::write(&path, b"0123456789ab").expect("rewrite");
        let rewritten = FieldKey::for_path(&path).expect("key");
        assert_ne!(key, rewritten);
    }

    #[test]
    fn missing_path_is_invalid_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FieldKey::for_path(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidInput { .. }));
    }
}
