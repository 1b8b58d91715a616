//! Great-circle distance between two coordinates on a sphere of configurable radius.

use crate::types::lat_lon::LatLon;

/// Mean earth radius in kilometres, the default sphere for distance ranking.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Central angle (radians) between two coordinates, using the haversine formula in its
/// `atan2` form.
///
/// The haversine term is capped at 1 so rounding near antipodal points can never produce
/// `sqrt` of a negative number. A NaN input stays NaN.
pub fn central_angle(from: LatLon, to: LatLon) -> f64 {
    let lat1 = from.0.to_radians();
    let lat2 = to.0.to_radians();
    let d_lat = (from.0 - to.0).abs().to_radians();
    let d_lon = (from.1 - to.1).abs().to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let h = sin_lat * sin_lat + sin_lon * sin_lon * lat1.cos() * lat2.cos();
    // f64::min would turn NaN into 1
    let h = if h > 1.0 { 1.0 } else { h };

    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance between `from` and `to`, in the unit of `radius`.
///
/// # Examples
///
/// ```
/// use weather_match::{great_circle_distance, LatLon, EARTH_RADIUS_KM};
///
/// let shanghai = LatLon(31.2304, 121.4737);
/// let beijing = LatLon(39.9042, 116.4074);
/// let km = great_circle_distance(shanghai, beijing, EARTH_RADIUS_KM);
/// assert!((km - 1067.0).abs() < 5.0);
/// ```
pub fn great_circle_distance(from: LatLon, to: LatLon, radius: f64) -> f64 {
    central_angle(from, to) * radius
}

/// Distance to a location that may be unknown. An absent location yields `None`, never zero.
pub fn distance_to_optional(from: LatLon, to: Option<LatLon>, radius: f64) -> Option<f64> {
    to.map(|to| great_circle_distance(from, to, radius))
}
