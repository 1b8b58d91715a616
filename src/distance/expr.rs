//! Ranking keys as polars expressions, so the query engine can order and limit rows itself.
//!
//! Each expression mirrors its in-process counterpart operation by operation, which keeps the
//! values (not only the ordering) identical to [`crate::great_circle_distance`] and
//! [`crate::day_distance`].

use crate::types::lat_lon::LatLon;
use crate::types::observation::epoch_days;
use chrono::NaiveDate;
use polars::prelude::{col, lit, when, DataType, Expr};

const RADIANS_PER_DEGREE: f64 = std::f64::consts::PI / 180.0;

/// Haversine distance from `origin` to the coordinates stored in `lat_column`/`lon_column`.
///
/// Rows with a null latitude or longitude evaluate to null, and NaN stays NaN.
pub fn haversine_expr(lat_column: &str, lon_column: &str, origin: LatLon, radius: f64) -> Expr {
    let lat1_cos = origin.0.to_radians().cos();
    let lat2_cos = (col(lat_column) * lit(RADIANS_PER_DEGREE)).cos();

    let d_lat = (lit(origin.0) - col(lat_column)).abs() * lit(RADIANS_PER_DEGREE);
    let d_lon = (lit(origin.1) - col(lon_column)).abs() * lit(RADIANS_PER_DEGREE);

    let sin_lat = (d_lat / lit(2.0)).sin();
    let sin_lon = (d_lon / lit(2.0)).sin();
    let h = sin_lat.clone() * sin_lat + sin_lon.clone() * sin_lon * lit(lat1_cos) * lat2_cos;
    // polars compares NaN as greater than every number
    let h = when(h.clone().gt(lit(1.0)).and(h.clone().is_not_nan()))
        .then(lit(1.0))
        .otherwise(h);

    let central_angle = lit(2.0) * h.clone().sqrt().arctan2((lit(1.0) - h).sqrt());
    central_angle * lit(radius)
}

/// Absolute whole-day distance between the `Date` column `date_column` and `target`.
pub fn day_distance_expr(date_column: &str, target: NaiveDate) -> Expr {
    (col(date_column).cast(DataType::Int32) - lit(epoch_days(target))).abs()
}
