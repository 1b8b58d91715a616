use crate::error::MatchError;
use log::info;
use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DATA_DIR_NAME: &str = "weather_match";

/// Default location of the station and observation files, `<data dir>/weather_match`.
pub fn get_data_dir() -> Result<PathBuf, MatchError> {
    dirs::data_dir()
        .ok_or(MatchError::DataDirResolution)
        .map(|p| p.join(DATA_DIR_NAME))
}

pub async fn ensure_data_dir_exists(path: &Path) -> Result<(), MatchError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(MatchError::DataDirCreation(
                    path.to_path_buf(),
                    io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "path exists but is not a directory",
                    ),
                ));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| MatchError::DataDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(MatchError::DataDirCreation(path.to_path_buf(), e)),
    }
}

/// What to do with a cache file derived from a CSV source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheState {
    /// The cache exists and is at least as new as the source (or the source is gone).
    Current,
    /// The source exists and the cache is absent or older.
    Rebuild,
    /// Neither file exists.
    Missing,
}

async fn modified(path: &Path) -> io::Result<Option<SystemTime>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.modified().map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) async fn cache_state<E>(
    source: &Path,
    cache: &Path,
    on_error: impl Fn(PathBuf, io::Error) -> E,
) -> Result<CacheState, E> {
    let source_modified = modified(source)
        .await
        .map_err(|e| on_error(source.to_path_buf(), e))?;
    let cache_modified = modified(cache)
        .await
        .map_err(|e| on_error(cache.to_path_buf(), e))?;

    Ok(match (source_modified, cache_modified) {
        (None, None) => CacheState::Missing,
        (None, Some(_)) => CacheState::Current,
        (Some(_), None) => CacheState::Rebuild,
        (Some(source), Some(cache)) if cache >= source => CacheState::Current,
        (Some(_), Some(_)) => CacheState::Rebuild,
    })
}

/// Reads a headed CSV file with every column as text, leaving type conversion to the caller.
pub(crate) fn read_csv_as_strings(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

pub(crate) fn get_opt_str(series: &Column, idx: usize) -> Option<String> {
    series
        .str()
        .ok()
        .and_then(|ca| ca.get(idx))
        .map(str::to_string)
}

pub(crate) fn get_opt_float(series: &Column, idx: usize) -> Option<f64> {
    series.f64().ok().and_then(|ca| ca.get(idx))
}

pub(crate) fn get_opt_int(series: &Column, idx: usize) -> Option<i64> {
    series.i64().ok().and_then(|ca| ca.get(idx))
}
