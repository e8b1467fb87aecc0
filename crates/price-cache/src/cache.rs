use crate::error::CacheError;
use chrono::NaiveDate;
use core_types::RawObservation;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw observations on disk, one `{SYMBOL}_{start}_{end}.csv` file per fetch.
#[derive(Debug, Clone)]
pub struct CsvPriceCache {
    dir: PathBuf,
}

impl CsvPriceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.csv",
            symbol.to_uppercase(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ))
    }

    /// Writes `observations` for the range, replacing any earlier file.
    pub fn save(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        observations: &[RawObservation],
    ) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(symbol, start, end);
        let csv_err = |source| CacheError::Csv {
            path: path.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;
        for observation in observations {
            writer.serialize(observation).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(symbol, path = %path.display(), rows = observations.len(), "Cached prices");
        Ok(path)
    }

    /// Reads the cached range, or `None` when nothing was cached for it.
    pub fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Vec<RawObservation>>, CacheError> {
        let path = self.path_for(symbol, start, end);
        if !path.exists() {
            tracing::debug!(symbol, path = %path.display(), "Cache miss");
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|source| CacheError::Csv {
            path: path.clone(),
            source,
        })?;
        let observations = reader
            .deserialize::<RawObservation>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CacheError::Csv {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(symbol, rows = observations.len(), "Cache hit");
        Ok(Some(observations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn file_name_encodes_symbol_and_range() {
        let cache = CsvPriceCache::new("data/raw");
        let path = cache.path_for("aapl", d(2020, 1, 1), d(2024, 6, 30));
        assert_eq!(path, Path::new("data/raw/AAPL_2020-01-01_2024-06-30.csv"));
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvPriceCache::new(dir.path());
        assert!(cache.load("MSFT", d(2021, 1, 1), d(2021, 2, 1)).unwrap().is_none());
    }

    #[test]
    fn garbage_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CsvPriceCache::new(dir.path());
        let path = cache.path_for("GS", d(2021, 1, 1), d(2021, 2, 1));
        fs::write(&path, "date,close\nnot-a-date,12.5\n").unwrap();

        let err = cache.load("GS", d(2021, 1, 1), d(2021, 2, 1)).unwrap_err();
        assert!(matches!(err, CacheError::Csv { .. }));
        assert_eq!(err.path(), &path);
    }
}
