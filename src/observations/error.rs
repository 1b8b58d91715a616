use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationDataError {
    #[error("Neither 'observations.csv' nor 'observations.parquet' exists in '{0}'")]
    SourceMissing(PathBuf),

    #[error("Failed to read metadata for '{0}'")]
    CacheMetadataRead(PathBuf, #[source] std::io::Error),

    // Errors during parquet writing (inside blocking task)
    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet cache file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Failed to read observation CSV '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Required column '{0}' not found in DataFrame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Observation row {row} has no {column}")]
    MissingKey { row: usize, column: &'static str },

    #[error("Station '{station_id}' has more than one observation on {date}")]
    DuplicateObservation { station_id: String, date: NaiveDate },

    #[error("Observation row {row} has out-of-range date value {days}")]
    InvalidDate { row: usize, days: i32 },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
