//! Geographic coordinate type used for queries and station locations.

use crate::error::MatchError;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude, in decimal degrees.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_match::LatLon;
///
/// let shanghai = LatLon(31.2304, 121.4737);
/// assert_eq!(shanghai.0, 31.2304); // Latitude
/// assert_eq!(shanghai.1, 121.4737); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Creates a coordinate, rejecting latitudes outside `[-90, 90]` and longitudes
    /// outside `[-180, 180]` (NaN is rejected as well).
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::InvalidCoordinate`] when either component is out of range.
    ///
    /// ```
    /// use weather_match::{LatLon, MatchError};
    ///
    /// assert!(LatLon::new(52.52, 13.40).is_ok());
    /// assert!(matches!(
    ///     LatLon::new(91.0, 0.0),
    ///     Err(MatchError::InvalidCoordinate { .. })
    /// ));
    /// ```
    pub fn new(lat: f64, lon: f64) -> Result<Self, MatchError> {
        let location = LatLon(lat, lon);
        location.validate()?;
        Ok(location)
    }

    pub fn lat(&self) -> f64 {
        self.0
    }

    pub fn lon(&self) -> f64 {
        self.1
    }

    /// Checks the coordinate ranges without constructing a new value.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(MatchError::InvalidCoordinate {
                lat: self.0,
                lon: self.1,
            })
        }
    }

    /// `true` when both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.0) && is_valid_longitude(self.1)
    }
}

/// Latitude in `[-90, 90]`. NaN is outside every range.
pub(crate) fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat)
}

/// Longitude in `[-180, 180]`.
pub(crate) fn is_valid_longitude(lon: f64) -> bool {
    (-180.0..=180.0).contains(&lon)
}
