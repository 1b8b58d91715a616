//! Defines the data structures representing weather stations, the region filter used to
//! restrict which stations take part in a search, and the optional spatial-index point
//! together with the `rstar` implementations needed to index stations in an R-tree.

use crate::types::lat_lon::{is_valid_latitude, is_valid_longitude, LatLon};
use bon::Builder;
use polars::prelude::{col, lit, Expr};
use rstar::{PointDistance, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// Column names of the station frame.
pub(crate) mod columns {
    pub const STATION_ID: &str = "station_id";
    pub const NAME: &str = "name";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const COUNTRY: &str = "country";
    pub const PROVINCE: &str = "province";
    pub const CITY: &str = "city";
    pub const DISTRICT: &str = "district";

    pub const ALL: [&str; 8] = [
        STATION_ID, NAME, LATITUDE, LONGITUDE, COUNTRY, PROVINCE, CITY, DISTRICT,
    ];
}

/// Country used by [`RegionFilter::default`].
pub const DEFAULT_COUNTRY: &str = "中国";

// --- Data Structures ---

/// Represents a single weather station and its metadata.
///
/// Latitude and longitude are optional: a station without both of them cannot be ranked by
/// distance and is excluded from every nearest-station search. A value that is not finite or
/// lies outside the valid range counts as absent.
///
/// # Examples
///
/// ```
/// use weather_match::Station;
///
/// let station = Station::builder()
///     .station_id("58362099999")
///     .name("SHANGHAI")
///     .latitude(31.4)
///     .longitude(121.467)
///     .country("中国")
///     .build();
/// assert!(station.coordinate().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Station {
    /// Unique, stable station identifier (e.g. a GSOD `USAF+WBAN` id such as "58362099999").
    #[builder(into)]
    pub station_id: String,
    /// Human readable station name, if known.
    #[builder(into)]
    pub name: Option<String>,
    /// Latitude in decimal degrees, if known.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if known.
    pub longitude: Option<f64>,
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub province: Option<String>,
    #[builder(into)]
    pub city: Option<String>,
    #[builder(into)]
    pub district: Option<String>,
    /// Spatial-index point, filled by [`Station::populate_geom`] when the spatial index is enabled.
    #[serde(skip)]
    #[builder(skip)]
    pub geom: Option<GeoPoint>,
}

impl Station {
    /// Returns the station location, or `None` if either latitude or longitude is absent or
    /// invalid.
    pub fn coordinate(&self) -> Option<LatLon> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(LatLon(lat, lon)).filter(LatLon::is_valid),
            _ => None,
        }
    }

    /// Clears a latitude or longitude that is NaN, infinite or out of range.
    ///
    /// Returns `true` if anything was cleared.
    pub fn discard_invalid_coordinates(&mut self) -> bool {
        let latitude = self.latitude.filter(|lat| is_valid_latitude(*lat));
        let longitude = self.longitude.filter(|lon| is_valid_longitude(*lon));
        let cleared = (latitude.is_none() && self.latitude.is_some())
            || (longitude.is_none() && self.longitude.is_some());
        self.latitude = latitude;
        self.longitude = longitude;
        cleared
    }

    /// Fills `geom` from the station coordinates. Stations without a full coordinate keep `None`.
    pub fn populate_geom(&mut self) {
        self.geom = self.coordinate().map(GeoPoint::from);
    }

    pub fn clear_geom(&mut self) {
        self.geom = None;
    }
}

/// Restricts a station search to an administrative region.
///
/// Every field that is set must equal the station's value for the station to match; a station
/// whose value is absent never matches a set field. A filter with no field set matches every
/// station.
///
/// Deserialization fills missing fields from [`RegionFilter::default`], which sets the country;
/// an explicit `null` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct RegionFilter {
    #[builder(into)]
    pub country: Option<String>,
    #[builder(into)]
    pub province: Option<String>,
    #[builder(into)]
    pub city: Option<String>,
    #[builder(into)]
    pub district: Option<String>,
}

impl Default for RegionFilter {
    /// Matches the monitored country, [`DEFAULT_COUNTRY`].
    fn default() -> Self {
        Self::country(DEFAULT_COUNTRY)
    }
}

impl RegionFilter {
    /// A filter that matches every station.
    pub fn any() -> Self {
        Self {
            country: None,
            province: None,
            city: None,
            district: None,
        }
    }

    /// A filter on country only.
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            ..Self::any()
        }
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            (columns::COUNTRY, self.country.as_deref()),
            (columns::PROVINCE, self.province.as_deref()),
            (columns::CITY, self.city.as_deref()),
            (columns::DISTRICT, self.district.as_deref()),
        ]
    }

    fn station_values(station: &Station) -> [Option<&str>; 4] {
        [
            station.country.as_deref(),
            station.province.as_deref(),
            station.city.as_deref(),
            station.district.as_deref(),
        ]
    }

    /// In-process evaluation of the filter.
    pub fn matches(&self, station: &Station) -> bool {
        self.fields()
            .iter()
            .zip(Self::station_values(station))
            .all(|((_, wanted), actual)| match wanted {
                Some(wanted) => actual == Some(*wanted),
                None => true,
            })
    }

    /// The same filter as a polars predicate over the station frame.
    ///
    /// Null administrative values compare as null, which `filter` drops, so the predicate
    /// selects exactly the stations for which [`RegionFilter::matches`] is true.
    pub fn to_expr(&self) -> Expr {
        self.fields()
            .into_iter()
            .filter_map(|(column, wanted)| wanted.map(|value| col(column).eq(lit(value))))
            .fold(lit(true), |predicate, condition| predicate.and(condition))
    }
}

/// A point on the unit sphere, derived from a latitude/longitude pair.
///
/// The squared straight-line (chord) distance between two unit-sphere points grows strictly
/// with their great-circle distance, which lets an R-tree answer nearest-station queries with
/// the same ordering as the haversine distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<LatLon> for GeoPoint {
    fn from(location: LatLon) -> Self {
        let lat = location.0.to_radians();
        let lon = location.1.to_radians();
        GeoPoint {
            x: lat.cos() * lon.cos(),
            y: lat.cos() * lon.sin(),
            z: lat.sin(),
        }
    }
}

impl GeoPoint {
    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

// --- R-Tree Implementations ---

/// Entry of the station spatial index: the station's unit-sphere point and its position in the
/// catalog's station list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexedStation {
    pub point: [f64; 3],
    pub slot: usize,
}

/// A station is a point, so its envelope is a degenerate AABB containing only that point.
impl RTreeObject for IndexedStation {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedStation {
    /// Squared chord distance between the station and a unit-sphere query point.
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}
