use crate::distance::haversine::great_circle_distance;
use crate::error::MatchError;
use crate::observations::extractor::extract_observations;
use crate::ranking::{RankedStation, RankingStrategy};
use crate::stations::station_catalog::StationCatalog;
use crate::types::lat_lon::LatLon;
use crate::types::observation::{day_distance, Observation};
use crate::types::station::{GeoPoint, IndexedStation, RegionFilter, Station};
use chrono::NaiveDate;
use log::debug;
use ordered_float::OrderedFloat;
use polars::prelude::LazyFrame;
use rstar::RTree;
use std::cmp::Ordering;

/// Relative slack on the squared chord distance when collecting near-ties from the R-tree.
const BAND_RELATIVE: f64 = 1e-9;
/// Absolute slack, for stations (almost) on top of the query point.
const BAND_ABSOLUTE: f64 = 1e-15;

/// Ranks stations and observations in memory with the pure distance functions.
///
/// When the catalog carries a spatial index, stations are visited in order of chord distance
/// from the query point instead of being scanned one by one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InProcessRanking {
    radius: f64,
}

impl InProcessRanking {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    fn candidate<'a>(&self, origin: LatLon, station: &'a Station) -> Option<StationCandidate<'a>> {
        station.coordinate().map(|location| StationCandidate {
            distance: OrderedFloat(great_circle_distance(origin, location, self.radius)),
            station,
        })
    }

    fn scan<'a>(
        &self,
        stations: impl Iterator<Item = &'a Station>,
        origin: LatLon,
    ) -> Option<StationCandidate<'a>> {
        stations
            .filter_map(|station| self.candidate(origin, station))
            .min()
    }

    /// Walks the R-tree outwards and stops once it leaves the band of the first matching
    /// station; the band is then ranked like a scan.
    fn indexed<'a>(
        &self,
        catalog: &'a StationCatalog,
        index: &RTree<IndexedStation>,
        region: &RegionFilter,
        origin: LatLon,
    ) -> Option<StationCandidate<'a>> {
        let query = GeoPoint::from(origin).as_array();
        let mut band_limit: Option<f64> = None;
        let mut band: Vec<&Station> = Vec::new();
        let mut visited = 0usize;

        for (entry, distance_2) in index.nearest_neighbor_iter_with_distance_2(&query) {
            if band_limit.is_some_and(|limit| distance_2 > limit) {
                break;
            }
            visited += 1;
            let station = &catalog.stations()[entry.slot];
            if !region.matches(station) {
                continue;
            }
            if band_limit.is_none() {
                band_limit = Some(distance_2 * (1.0 + BAND_RELATIVE) + BAND_ABSOLUTE);
            }
            band.push(station);
        }

        debug!(
            "Spatial index visited {} stations, {} within the nearest band",
            visited,
            band.len()
        );
        self.scan(band.into_iter(), origin)
    }
}

impl RankingStrategy for InProcessRanking {
    fn nearest_station(
        &self,
        catalog: &StationCatalog,
        region: &RegionFilter,
        origin: LatLon,
    ) -> Result<Option<RankedStation>, MatchError> {
        let best = match catalog.spatial_index() {
            Some(index) => self.indexed(catalog, index, region, origin),
            None => self.scan(catalog.eligible(region), origin),
        };
        Ok(best.map(|candidate| RankedStation {
            station: candidate.station.clone(),
            distance: candidate.distance.into_inner(),
        }))
    }

    fn nearest_observation(
        &self,
        candidates: LazyFrame,
        target: NaiveDate,
    ) -> Result<Option<Observation>, MatchError> {
        let observations = extract_observations(&candidates.collect()?)?;
        Ok(observations
            .into_iter()
            .min_by_key(|o| (day_distance(o.date, target), o.date)))
    }
}

// Helper struct ordering stations by distance, then id
struct StationCandidate<'a> {
    distance: OrderedFloat<f64>,
    station: &'a Station,
}

impl StationCandidate<'_> {
    fn key(&self) -> (OrderedFloat<f64>, &str) {
        (self.distance, self.station.station_id.as_str())
    }
}

impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::haversine::EARTH_RADIUS_KM;

    fn located(id: &str, lat: f64, lon: f64, country: &str) -> Station {
        Station::builder()
            .station_id(id)
            .latitude(lat)
            .longitude(lon)
            .country(country)
            .build()
    }

    #[test]
    fn test_candidate_order_uses_id_on_equal_distance() {
        let a = located("A", 0.0, 0.0, "中国");
        let b = located("B", 0.0, 0.0, "中国");
        let ranking = InProcessRanking::new(EARTH_RADIUS_KM);
        let origin = LatLon(1.0, 1.0);
        let ca = ranking.candidate(origin, &a).unwrap();
        let cb = ranking.candidate(origin, &b).unwrap();
        assert!(ca < cb);
        let best = ranking.scan([&b, &a].into_iter(), origin).unwrap();
        assert_eq!(best.station.station_id, "A");
    }

    #[test]
    fn test_index_skips_nearer_stations_outside_region() -> Result<(), Box<dyn std::error::Error>> {
        let mut catalog = StationCatalog::from_stations(vec![
            located("NEAR", 31.2, 121.5, "日本"),
            located("MID", 32.0, 121.0, "中国"),
            located("FAR", 45.0, 100.0, "中国"),
        ])?;
        catalog.build_spatial_index();
        let ranking = InProcessRanking::new(EARTH_RADIUS_KM);

        let ranked = ranking
            .nearest_station(&catalog, &RegionFilter::default(), LatLon(31.2, 121.5))?
            .expect("a Chinese station exists");
        assert_eq!(ranked.station.station_id, "MID");
        Ok(())
    }

    #[test]
    fn test_index_with_region_matching_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let mut catalog =
            StationCatalog::from_stations(vec![located("A", 31.2, 121.5, "中国")])?;
        catalog.build_spatial_index();
        let ranked = InProcessRanking::new(EARTH_RADIUS_KM).nearest_station(
            &catalog,
            &RegionFilter::country("Atlantis"),
            LatLon(0.0, 0.0),
        )?;
        assert!(ranked.is_none());
        Ok(())
    }
}
