//! Daily observation record and the completeness rule applied when picking one.

use crate::types::weather_events::WeatherEvents;
use bon::Builder;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column names of the observation frame, following the GSOD daily summary field codes.
pub(crate) mod columns {
    pub const STATION_ID: &str = "station_id";
    pub const DATE: &str = "date";
    pub const TEMP: &str = "temp";
    pub const DEWP: &str = "dewp";
    pub const SLP: &str = "slp";
    pub const STP: &str = "stp";
    pub const VISIB: &str = "visib";
    pub const WDSP: &str = "wdsp";
    pub const MXSPD: &str = "mxspd";
    pub const GUST: &str = "gust";
    pub const MAX: &str = "max";
    pub const MIN: &str = "min";
    pub const PRCP: &str = "prcp";
    pub const SNDP: &str = "sndp";
    pub const FRSHTT: &str = "frshtt";

    /// Float measurement columns, in frame order.
    pub const MEASUREMENTS: [&str; 12] = [
        TEMP, DEWP, SLP, STP, VISIB, WDSP, MXSPD, GUST, MAX, MIN, PRCP, SNDP,
    ];
}

/// One day of measurements for one station.
///
/// Every measurement is independently optional; a record may exist for a day on which nothing
/// was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Observation {
    #[builder(into)]
    pub station_id: String,
    pub date: NaiveDate,
    pub temperature: Option<f64>,              // temp (mean)
    pub dew_point: Option<f64>,                // dewp (mean)
    pub sea_level_pressure: Option<f64>,       // slp (mean)
    pub station_pressure: Option<f64>,         // stp (mean)
    pub visibility: Option<f64>,               // visib (mean)
    pub wind_speed: Option<f64>,               // wdsp (mean)
    pub max_sustained_wind_speed: Option<f64>, // mxspd
    pub gust: Option<f64>,                     // gust
    pub max_temperature: Option<f64>,          // max
    pub min_temperature: Option<f64>,          // min
    pub precipitation: Option<f64>,            // prcp
    pub snow_depth: Option<f64>,               // sndp
    pub frshtt: Option<i64>,                   // frshtt (raw indicator digits)
}

impl Observation {
    /// Decoded FRSHTT indicators, if the field was recorded.
    pub fn events(&self) -> Option<WeatherEvents> {
        self.frshtt.and_then(WeatherEvents::from_frshtt)
    }

    /// Measurement values in the order of the frame's float columns.
    pub(crate) fn measurements(&self) -> [Option<f64>; 12] {
        [
            self.temperature,
            self.dew_point,
            self.sea_level_pressure,
            self.station_pressure,
            self.visibility,
            self.wind_speed,
            self.max_sustained_wind_speed,
            self.gust,
            self.max_temperature,
            self.min_temperature,
            self.precipitation,
            self.snow_depth,
        ]
    }
}

/// Whether observations missing a wind speed may be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Completeness {
    /// Only observations with a recorded wind speed are eligible.
    #[default]
    RequireWindSpeed,
    /// Every observation of the station is eligible.
    IncludeIncomplete,
}

impl Completeness {
    pub fn from_include_incomplete(include_incomplete: bool) -> Self {
        if include_incomplete {
            Completeness::IncludeIncomplete
        } else {
            Completeness::RequireWindSpeed
        }
    }

    pub fn admits(&self, observation: &Observation) -> bool {
        match self {
            Completeness::RequireWindSpeed => observation.wind_speed.is_some(),
            Completeness::IncludeIncomplete => true,
        }
    }
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    // NaiveDate::default() is 1970-01-01
    (date - NaiveDate::default()).num_days() as i32
}

pub(crate) fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days as i64))
}

/// Whole-day distance between two dates, independent of which one is earlier.
pub fn day_distance(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_epoch_days_round_trip_known_values() {
        assert_eq!(epoch_days(date(1970, 1, 1)), 0);
        assert_eq!(epoch_days(date(1969, 12, 31)), -1);
        assert_eq!(epoch_days(date(2021, 6, 2)), 18780);
        assert_eq!(from_epoch_days(18780), Some(date(2021, 6, 2)));
    }

    #[test]
    fn test_day_distance_is_absolute() {
        assert_eq!(day_distance(date(2020, 1, 4), date(2020, 1, 1)), 3);
        assert_eq!(day_distance(date(2020, 1, 4), date(2020, 1, 10)), 6);
        assert_eq!(day_distance(date(2020, 3, 1), date(2020, 2, 28)), 2);
    }

    #[test]
    fn test_completeness_admits() {
        let complete = Observation::builder()
            .station_id("A")
            .date(date(2021, 6, 3))
            .wind_speed(12.3)
            .build();
        let incomplete = Observation::builder()
            .station_id("A")
            .date(date(2021, 6, 1))
            .build();

        assert!(Completeness::RequireWindSpeed.admits(&complete));
        assert!(!Completeness::RequireWindSpeed.admits(&incomplete));
        assert!(Completeness::IncludeIncomplete.admits(&incomplete));
        assert_eq!(
            Completeness::from_include_incomplete(false),
            Completeness::default()
        );
    }
}
