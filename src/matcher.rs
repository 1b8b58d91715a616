//! The main entry point: [`WeatherMatcher`] resolves a coordinate and a date to the best
//! matching station and daily observation.

use crate::config::MatcherConfig;
use crate::distance::haversine::great_circle_distance;
use crate::error::MatchError;
use crate::observations::observation_store::ObservationStore;
use crate::ranking::{RankedStation, RankingStrategy};
use crate::stations::station_catalog::StationCatalog;
use crate::types::lat_lon::LatLon;
use crate::types::observation::{Completeness, Observation};
use crate::types::station::Station;
use crate::utils::{ensure_data_dir_exists, get_data_dir};
use bon::bon;
use chrono::{Local, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Result of a resolution: the chosen station, its chosen observation, and the distance the
/// station was ranked by (in the unit of the configured radius).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationMatch {
    pub station: Station,
    pub observation: Observation,
    pub distance: f64,
}

/// Resolves coordinates and dates against a station catalog and an observation table.
///
/// Data is loaded once and never modified; clones share it, so a matcher can be handed to as
/// many threads as needed.
///
/// # Examples
///
/// ```no_run
/// use weather_match::{LatLon, MatchError, MatcherConfig, WeatherMatcher};
/// use chrono::NaiveDate;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), MatchError> {
/// let matcher = WeatherMatcher::new(MatcherConfig::default()).await?;
///
/// let found = matcher
///     .resolve()
///     .location(LatLon(31.2304, 121.4737))
///     .date(NaiveDate::from_ymd_opt(2021, 6, 2).unwrap())
///     .call()?;
/// println!(
///     "{} ({:.1} km): wind {:?}",
///     found.station.station_id, found.distance, found.observation.wind_speed
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WeatherMatcher {
    config: MatcherConfig,
    stations: Arc<StationCatalog>,
    observations: Arc<ObservationStore>,
    ranking: Arc<dyn RankingStrategy>,
}

#[bon]
impl WeatherMatcher {
    /// Creates a matcher over `config.data_dir`, or the default data directory
    /// (`<data dir>/weather_match`) when none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::DataDirResolution`] if no data directory can be determined, and
    /// anything [`WeatherMatcher::with_data_dir`] returns.
    pub async fn new(config: MatcherConfig) -> Result<Self, MatchError> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => get_data_dir()?,
        };
        Self::with_data_dir(&data_dir, config).await
    }

    /// Creates a matcher over the files in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidConfig`] for an unusable radius,
    /// [`MatchError::DataDirCreation`] if the directory cannot be created, and
    /// [`MatchError::StationData`] / [`MatchError::ObservationData`] if loading fails.
    pub async fn with_data_dir(data_dir: &Path, config: MatcherConfig) -> Result<Self, MatchError> {
        config.validate()?;
        ensure_data_dir_exists(data_dir).await?;

        let stations = StationCatalog::open(data_dir).await?;
        let observations = ObservationStore::open(data_dir).await?;
        info!(
            "Weather matcher ready over {} ({} stations)",
            data_dir.display(),
            stations.len()
        );
        Ok(Self::assemble(stations, observations, config))
    }

    /// Creates a matcher over in-memory records.
    pub fn from_records(
        stations: Vec<Station>,
        observations: &[Observation],
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let stations = StationCatalog::from_stations(stations)?;
        let observations = ObservationStore::from_observations(observations)?;
        Ok(Self::assemble(stations, observations, config))
    }

    fn assemble(
        mut stations: StationCatalog,
        observations: ObservationStore,
        config: MatcherConfig,
    ) -> Self {
        if config.spatial_index {
            stations.build_spatial_index();
        }
        Self {
            ranking: config.ranking.strategy(config.earth_radius),
            stations: Arc::new(stations),
            observations: Arc::new(observations),
            config,
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn stations(&self) -> &StationCatalog {
        &self.stations
    }

    /// Finds the station nearest to `location`, then its observation closest to `date`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** Query coordinate in decimal degrees.
    /// * `.date(NaiveDate)`: Optional. Target day; defaults to today's local date.
    /// * `.include_incomplete(bool)`: Optional. Also consider observations without a wind speed.
    ///   Defaults to `false`.
    ///
    /// # Errors
    ///
    /// * [`MatchError::InvalidCoordinate`] if `location` is out of range; nothing is queried.
    /// * [`MatchError::NoStationFound`] if no station in the configured region has coordinates.
    /// * [`MatchError::NoObservationFound`] if the chosen station has no eligible observation.
    ///   The search does not fall back to the next station.
    #[builder]
    pub fn resolve(
        &self,
        location: LatLon,
        date: Option<NaiveDate>,
        #[builder(default)] include_incomplete: bool,
    ) -> Result<ObservationMatch, MatchError> {
        location.validate()?;
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let completeness = Completeness::from_include_incomplete(include_incomplete);

        let RankedStation { station, distance } = self.nearest_station(location)?;
        debug!(
            "Nearest station to {:?} is {} at {:.3}",
            location, station.station_id, distance
        );
        let observation = self.nearest_observation(&station.station_id, date, completeness)?;

        Ok(ObservationMatch {
            station,
            observation,
            distance,
        })
    }

    /// Station stage alone: the nearest located station in the configured region.
    pub fn nearest_station(&self, location: LatLon) -> Result<RankedStation, MatchError> {
        location.validate()?;
        self.ranking
            .nearest_station(&self.stations, &self.config.region, location)?
            .ok_or(MatchError::NoStationFound {
                lat: location.0,
                lon: location.1,
            })
    }

    /// Observation stage alone: the observation of `station_id` closest to `date` that
    /// `completeness` admits.
    pub fn nearest_observation(
        &self,
        station_id: &str,
        date: NaiveDate,
        completeness: Completeness,
    ) -> Result<Observation, MatchError> {
        let candidates = self.observations.eligible(station_id, completeness)?;
        self.ranking
            .nearest_observation(candidates, date)?
            .ok_or_else(|| MatchError::NoObservationFound {
                station_id: station_id.to_string(),
            })
    }

    /// Distance from `station` to `location` with the configured radius.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::DistanceUndefined`] if the station lacks a latitude or longitude.
    pub fn distance_to(&self, station: &Station, location: LatLon) -> Result<f64, MatchError> {
        station
            .coordinate()
            .map(|position| great_circle_distance(position, location, self.config.earth_radius))
            .ok_or_else(|| MatchError::DistanceUndefined {
                station_id: station.station_id.clone(),
            })
    }
}
