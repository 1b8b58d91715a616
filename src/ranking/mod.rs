//! Ordered selection for both resolution stages.
//!
//! A [`RankingStrategy`] answers "which eligible station is nearest" and "which eligible
//! observation is closest in time". [`InProcessRanking`] materializes the eligible rows and ranks
//! them with the pure distance functions; [`FrameRanking`] hands the ranking expression, sort and
//! `limit(1)` to polars. Both order stations by `(distance, station_id)` and observations by
//! `(day distance, date)`, so they always agree.

pub mod frame;
pub mod in_process;

pub use frame::FrameRanking;
pub use in_process::InProcessRanking;

use crate::error::MatchError;
use crate::stations::station_catalog::StationCatalog;
use crate::types::lat_lon::LatLon;
use crate::types::observation::Observation;
use crate::types::station::{RegionFilter, Station};
use chrono::NaiveDate;
use polars::prelude::LazyFrame;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Column holding the ranking distance in frame plans.
pub(crate) const DISTANCE_COLUMN: &str = "distance";
/// Column holding the absolute day distance in frame plans.
pub(crate) const DAY_DISTANCE_COLUMN: &str = "day_distance";

/// The station selected by the station stage, with the distance it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStation {
    pub station: Station,
    pub distance: f64,
}

pub trait RankingStrategy: Debug + Send + Sync {
    /// Nearest station to `origin` among the stations `region` admits that have coordinates.
    fn nearest_station(
        &self,
        catalog: &StationCatalog,
        region: &RegionFilter,
        origin: LatLon,
    ) -> Result<Option<RankedStation>, MatchError>;

    /// Observation among `candidates` closest to `target`; the earlier date wins a tie.
    fn nearest_observation(
        &self,
        candidates: LazyFrame,
        target: NaiveDate,
    ) -> Result<Option<Observation>, MatchError>;
}
