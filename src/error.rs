use crate::observations::error::ObservationDataError;
use crate::stations::error::StationDataError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid coordinate ({lat}, {lon}): latitude must lie in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("No station found for ({lat}, {lon}) within the configured region")]
    NoStationFound { lat: f64, lon: f64 },

    #[error("No observation found for station '{station_id}'")]
    NoObservationFound { station_id: String },

    // Never produced by station ranking, which only considers located stations.
    #[error("Distance is undefined for station '{station_id}', which has no coordinates")]
    DistanceUndefined { station_id: String },

    #[error("Ranked station '{station_id}' is not in the station catalog")]
    StationNotInCatalog { station_id: String },

    #[error("Ranked row has no {0}")]
    IncompleteRankedRow(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    ConfigParse(PathBuf, #[source] serde_json::Error),

    #[error("Failed to determine data directory")]
    DataDirResolution,

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    StationData(#[from] StationDataError),

    #[error(transparent)]
    ObservationData(#[from] ObservationDataError),

    #[error("Failed to evaluate ranking plan")]
    Frame(#[from] PolarsError),
}
