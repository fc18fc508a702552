//! Memoized dataset loading keyed by file path and modification time

use crate::data::{load_customers, CustomerTable, LoadError};
use crate::model::RiskModel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    path: PathBuf,
    modified: SystemTime,
}

impl CacheKey {
    fn for_file(path: &Path) -> Result<Self, LoadError> {
        let metadata = std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }
}

/// Holds the most recently loaded table and the key it was loaded under.
///
/// `get` re-reads the file whenever the path or its modification time
/// differs from the cached key; the scored table is shared read-only.
pub struct DatasetCache {
    model: Box<dyn RiskModel>,
    entry: Option<(CacheKey, Arc<CustomerTable>)>,
    loads: usize,
}

impl DatasetCache {
    pub fn new(model: Box<dyn RiskModel>) -> Self {
        Self {
            model,
            entry: None,
            loads: 0,
        }
    }

    /// Return the table for `path`, loading it if the cache is cold or stale
    pub fn get(&mut self, path: &Path) -> Result<Arc<CustomerTable>, LoadError> {
        let key = CacheKey::for_file(path)?;

        if let Some((cached_key, table)) = &self.entry {
            if *cached_key == key {
                tracing::trace!(path = %path.display(), "dataset cache hit");
                return Ok(Arc::clone(table));
            }
            tracing::info!(path = %path.display(), "dataset changed on disk, reloading");
        }

        self.load(key)
    }

    /// Re-read `path` regardless of the cached key
    pub fn reload(&mut self, path: &Path) -> Result<Arc<CustomerTable>, LoadError> {
        let key = CacheKey::for_file(path)?;
        self.load(key)
    }

    /// Drop the cached table so the next `get` reads the file again
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            tracing::debug!("dataset cache invalidated");
        }
    }

    /// Number of times the file has actually been read
    pub fn loads(&self) -> usize {
        self.loads
    }

    fn load(&mut self, key: CacheKey) -> Result<Arc<CustomerTable>, LoadError> {
        let table = Arc::new(load_customers(&key.path, self.model.as_ref())?);
        self.loads += 1;
        self.entry = Some((key, Arc::clone(&table)));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SimulatedRiskModel;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::tempdir;

    const HEADER: &str = "customerID,tenure,Contract,MonthlyCharges,TotalCharges,Churn";

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut file = File::create(path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
    }

    fn bump_mtime(path: &Path, seconds: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(seconds))
            .unwrap();
    }

    #[test]
    fn test_get_reuses_unchanged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        write_csv(&path, &["a,1,Month-to-month,50,50,Yes", "b,24,Two year,80,1920,No"]);

        let mut cache = DatasetCache::new(Box::new(SimulatedRiskModel));
        let first = cache.get(&path).unwrap();
        let second = cache.get(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.loads(), 1);
    }

    #[test]
    fn test_get_reloads_modified_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        write_csv(&path, &["a,1,Month-to-month,50,50,Yes"]);

        let mut cache = DatasetCache::new(Box::new(SimulatedRiskModel));
        assert_eq!(cache.get(&path).unwrap().len(), 1);

        write_csv(&path, &["a,1,Month-to-month,50,50,Yes", "b,24,Two year,80,1920,No"]);
        bump_mtime(&path, 60);

        assert_eq!(cache.get(&path).unwrap().len(), 2);
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn test_invalidate_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("churn.csv");
        write_csv(&path, &["a,1,Month-to-month,50,50,Yes"]);

        let mut cache = DatasetCache::new(Box::new(SimulatedRiskModel));
        let first = cache.get(&path).unwrap();

        cache.invalidate();
        let second = cache.get(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        cache.reload(&path).unwrap();
        assert_eq!(cache.loads(), 3);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let mut cache = DatasetCache::new(Box::new(SimulatedRiskModel));

        let result = cache.get(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
        assert_eq!(cache.loads(), 0);
    }
}
