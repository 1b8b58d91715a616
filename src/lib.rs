//! Find the historic daily weather observation that best matches a coordinate and a date.
//!
//! Resolution runs in two stages: the nearest station (great-circle distance, restricted to a
//! region), then that station's observation closest in time.

mod config;
mod distance;
mod error;
mod matcher;
mod observations;
mod ranking;
mod stations;
mod types;
mod utils;

pub use config::{MatcherConfig, RankingMode};
pub use distance::expr::{day_distance_expr, haversine_expr};
pub use distance::haversine::{
    central_angle, distance_to_optional, great_circle_distance, EARTH_RADIUS_KM,
};
pub use error::MatchError;
pub use matcher::{ObservationMatch, WeatherMatcher};
pub use ranking::{FrameRanking, InProcessRanking, RankedStation, RankingStrategy};
pub use utils::{ensure_data_dir_exists, get_data_dir};

pub use types::lat_lon::LatLon;
pub use types::observation::{day_distance, Completeness, Observation};
pub use types::station::{GeoPoint, RegionFilter, Station, DEFAULT_COUNTRY};
pub use types::weather_events::WeatherEvents;

pub use observations::error::ObservationDataError;
pub use observations::observation_store::ObservationStore;
pub use stations::error::StationDataError;
pub use stations::station_catalog::StationCatalog;
