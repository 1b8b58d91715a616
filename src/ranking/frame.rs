use crate::distance::expr::{day_distance_expr, haversine_expr};
use crate::error::MatchError;
use crate::observations::extractor::extract_first;
use crate::ranking::{RankedStation, RankingStrategy, DAY_DISTANCE_COLUMN, DISTANCE_COLUMN};
use crate::stations::station_catalog::StationCatalog;
use crate::types::lat_lon::LatLon;
use crate::types::observation::{columns as observation_columns, Observation};
use crate::types::station::{columns as station_columns, RegionFilter};
use chrono::NaiveDate;
use polars::prelude::*;

/// Lets polars order the eligible rows by the ranking expression and keep the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRanking {
    radius: f64,
}

impl FrameRanking {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl RankingStrategy for FrameRanking {
    fn nearest_station(
        &self,
        catalog: &StationCatalog,
        region: &RegionFilter,
        origin: LatLon,
    ) -> Result<Option<RankedStation>, MatchError> {
        let ranked = catalog
            .eligible_frame(region)
            .select([
                col(station_columns::STATION_ID),
                haversine_expr(
                    station_columns::LATITUDE,
                    station_columns::LONGITUDE,
                    origin,
                    self.radius,
                )
                .alias(DISTANCE_COLUMN),
            ])
            .sort(
                [DISTANCE_COLUMN, station_columns::STATION_ID],
                SortMultipleOptions::default(),
            )
            .limit(1)
            .collect()?;

        if ranked.height() == 0 {
            return Ok(None);
        }

        let station_id = ranked
            .column(station_columns::STATION_ID)?
            .str()?
            .get(0)
            .ok_or(MatchError::IncompleteRankedRow(station_columns::STATION_ID))?;
        let distance = ranked
            .column(DISTANCE_COLUMN)?
            .f64()?
            .get(0)
            .ok_or(MatchError::IncompleteRankedRow(DISTANCE_COLUMN))?;
        let station = catalog.station(station_id).cloned().ok_or_else(|| {
            MatchError::StationNotInCatalog {
                station_id: station_id.to_string(),
            }
        })?;

        Ok(Some(RankedStation { station, distance }))
    }

    fn nearest_observation(
        &self,
        candidates: LazyFrame,
        target: NaiveDate,
    ) -> Result<Option<Observation>, MatchError> {
        let ranked = candidates
            .with_column(
                day_distance_expr(observation_columns::DATE, target).alias(DAY_DISTANCE_COLUMN),
            )
            .sort(
                [DAY_DISTANCE_COLUMN, observation_columns::DATE],
                SortMultipleOptions::default(),
            )
            .limit(1)
            .collect()?;

        Ok(extract_first(&ranked)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::haversine::EARTH_RADIUS_KM;
    use crate::types::station::Station;

    #[test]
    fn test_ranked_station_carries_catalog_record() -> Result<(), Box<dyn std::error::Error>> {
        let catalog = StationCatalog::from_stations(vec![Station::builder()
            .station_id("58362099999")
            .name("SHANGHAI")
            .latitude(31.4)
            .longitude(121.467)
            .country("中国")
            .build()])?;
        let ranked = FrameRanking::new(EARTH_RADIUS_KM)
            .nearest_station(&catalog, &RegionFilter::default(), LatLon(31.2, 121.5))?
            .expect("one located station");
        assert_eq!(Some(&ranked.station), catalog.station("58362099999"));
        Ok(())
    }

    #[test]
    fn test_catalog_errors_are_not_frame_errors() {
        let missing = MatchError::StationNotInCatalog {
            station_id: "X".to_string(),
        };
        assert_eq!(
            missing.to_string(),
            "Ranked station 'X' is not in the station catalog"
        );
        assert!(!matches!(missing, MatchError::Frame(_)));
        assert_eq!(
            MatchError::IncompleteRankedRow(DISTANCE_COLUMN).to_string(),
            "Ranked row has no distance"
        );
    }
}
