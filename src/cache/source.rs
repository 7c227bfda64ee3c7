//! File-keyed cache that validates entries against on-disk state.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::LruCache;

/// Cache keyed by source path, with the LRU/TTL policy of [`LruCache`] plus
/// a stricter freshness check against the backing file's mtime.
pub struct SourceCache<T> {
    inner: LruCache<PathBuf, T>,
}

impl<T: Clone> SourceCache<T> {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: LruCache::new(max_size, ttl),
        }
    }

    pub fn get(&mut self, path: &Path) -> Option<T> {
        self.inner.get(&path.to_path_buf())
    }

    pub fn set(&mut self, path: &Path, data: T, modified: Option<SystemTime>) {
        self.inner.set(path.to_path_buf(), data, modified);
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.inner.remove(&path.to_path_buf())
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn has(&self, path: &Path) -> bool {
        self.inner.has(&path.to_path_buf())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Check whether the cached entry for `path` still reflects the file on
    /// disk.
    ///
    /// Not fresh when: there is no entry, the file is missing, its mtime is
    /// strictly newer than the entry's stamp, or the mtime lookup fails for
    /// any reason. Every not-fresh outcome drops the entry, so callers can
    /// always recompute from source after a miss.
    pub fn is_fresh(&mut self, path: &Path) -> bool {
        let key = path.to_path_buf();
        let Some(cached_at) = self.inner.modified(&key) else {
            return false;
        };

        let disk_mtime = std::fs::metadata(path).and_then(|m| m.modified());
        match disk_mtime {
            Ok(mtime) if mtime <= cached_at => true,
            _ => {
                self.inner.remove(&key);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "hello").unwrap();

        let mut cache: SourceCache<String> = SourceCache::new(8, Duration::ZERO);
        cache.set(&path, "processed".into(), None);

        assert!(cache.is_fresh(&path));
        assert_eq!(cache.get(&path), Some("processed".into()));
    }

    #[test]
    fn test_stale_after_backing_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "v1").unwrap();

        let mut cache: SourceCache<String> = SourceCache::new(8, Duration::ZERO);
        // Stamp the entry before the file's mtime to simulate an edit after
        // caching without depending on filesystem timestamp granularity.
        let before = SystemTime::now() - Duration::from_secs(60);
        cache.set(&path, "processed".into(), Some(before));
        fs::write(&path, "v2").unwrap();

        assert!(!cache.is_fresh(&path));
        // Stale entry was dropped as a side effect
        assert!(!cache.has(&path));
    }

    #[test]
    fn test_missing_backing_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.md");
        fs::write(&path, "x").unwrap();

        let mut cache: SourceCache<String> = SourceCache::new(8, Duration::ZERO);
        cache.set(&path, "processed".into(), None);
        fs::remove_file(&path).unwrap();

        assert!(!cache.is_fresh(&path));
        assert!(!cache.has(&path));
    }

    #[test]
    fn test_no_entry_is_not_fresh() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("never-cached.md");
        fs::write(&path, "x").unwrap();

        let mut cache: SourceCache<String> = SourceCache::new(8, Duration::ZERO);
        assert!(!cache.is_fresh(&path));
    }
}
