use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationDataError {
    #[error("Neither 'stations.csv' nor 'stations.bin' exists in '{0}'")]
    SourceMissing(PathBuf),

    #[error("Failed to read metadata for '{0}'")]
    CacheMetadata(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Failed to read station CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Station '{0}' appears more than once")]
    DuplicateStationId(String),

    #[error("Station row {0} has no station id")]
    MissingStationId(usize),

    #[error("Failed building station frame")]
    Frame(#[from] PolarsError),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
