use crate::stations::error::StationDataError;
use crate::types::station::{columns, IndexedStation, RegionFilter, Station};
use crate::utils::{cache_state, get_opt_float, get_opt_str, read_csv_as_strings, CacheState};
use bincode::config::{Configuration, Fixint, LittleEndian};
use log::{debug, info, warn};
use polars::prelude::*;
use rstar::RTree;
use std::collections::HashMap;
use std::path::Path;

const CSV_FILE_NAME: &str = "stations.csv";
const BINCODE_CACHE_FILE_NAME: &str = "stations.bin";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Read-only set of stations, held both as records and as a polars frame so either ranking
/// strategy can query it.
#[derive(Debug)]
pub struct StationCatalog {
    stations: Vec<Station>,
    by_id: HashMap<String, usize>,
    frame: DataFrame,
    spatial_index: Option<RTree<IndexedStation>>,
}

impl StationCatalog {
    /// Loads the catalog from `data_dir`.
    ///
    /// `stations.bin` is used when it is at least as new as `stations.csv`; otherwise the CSV is
    /// parsed and the cache rewritten.
    pub async fn open(data_dir: &Path) -> Result<Self, StationDataError> {
        let csv_path = data_dir.join(CSV_FILE_NAME);
        let cache_path = data_dir.join(BINCODE_CACHE_FILE_NAME);

        let stations = match cache_state(&csv_path, &cache_path, StationDataError::CacheMetadata)
            .await?
        {
            CacheState::Current => {
                info!("Station cache hit at {:?}", cache_path);
                let path_clone = cache_path.clone();
                tokio::task::spawn_blocking(move || Self::get_cached_stations(&path_clone))
                    .await??
            }
            CacheState::Rebuild => {
                warn!(
                    "Station cache missing or older than {:?}. Parsing CSV.",
                    csv_path
                );
                let path_clone = csv_path.clone();
                let stations =
                    tokio::task::spawn_blocking(move || Self::read_stations_csv(&path_clone))
                        .await??;
                Self::cache_stations(stations.clone(), &cache_path).await?;
                stations
            }
            CacheState::Missing => {
                return Err(StationDataError::SourceMissing(data_dir.to_path_buf()))
            }
        };

        info!("Loaded {} stations", stations.len());
        Self::from_stations(stations)
    }

    /// Builds a catalog from in-memory records.
    ///
    /// Latitudes and longitudes that are not finite or out of range are cleared, so those
    /// stations are never ranked.
    ///
    /// # Errors
    ///
    /// Returns [`StationDataError::DuplicateStationId`] if two records share an id.
    pub fn from_stations(mut stations: Vec<Station>) -> Result<Self, StationDataError> {
        for station in &mut stations {
            if station.discard_invalid_coordinates() {
                warn!(
                    "Station '{}' has an invalid coordinate; treating it as unlocated",
                    station.station_id
                );
            }
        }

        let mut by_id = HashMap::with_capacity(stations.len());
        for (slot, station) in stations.iter().enumerate() {
            if by_id.insert(station.station_id.clone(), slot).is_some() {
                return Err(StationDataError::DuplicateStationId(
                    station.station_id.clone(),
                ));
            }
        }
        let frame = Self::stations_frame(&stations)?;

        Ok(Self {
            stations,
            by_id,
            frame,
            spatial_index: None,
        })
    }

    fn stations_frame(stations: &[Station]) -> PolarsResult<DataFrame> {
        fn text<'a>(
            stations: &'a [Station],
            get: impl Fn(&'a Station) -> Option<&'a str>,
        ) -> Vec<Option<&'a str>> {
            stations.iter().map(get).collect()
        }
        let ids: Vec<&str> = stations.iter().map(|s| s.station_id.as_str()).collect();
        let latitudes: Vec<Option<f64>> = stations.iter().map(|s| s.latitude).collect();
        let longitudes: Vec<Option<f64>> = stations.iter().map(|s| s.longitude).collect();

        DataFrame::new(vec![
            Column::new(columns::STATION_ID.into(), ids),
            Column::new(columns::NAME.into(), text(stations, |s| s.name.as_deref())),
            Column::new(columns::LATITUDE.into(), latitudes),
            Column::new(columns::LONGITUDE.into(), longitudes),
            Column::new(columns::COUNTRY.into(), text(stations, |s| s.country.as_deref())),
            Column::new(columns::PROVINCE.into(), text(stations, |s| s.province.as_deref())),
            Column::new(columns::CITY.into(), text(stations, |s| s.city.as_deref())),
            Column::new(columns::DISTRICT.into(), text(stations, |s| s.district.as_deref())),
        ])
    }

    fn get_cached_stations(cache_path: &Path) -> Result<Vec<Station>, StationDataError> {
        let bytes = std::fs::read(cache_path)
            .map_err(|e| StationDataError::CacheRead(cache_path.to_path_buf(), e))?;
        let (decoded_stations, _) =
            bincode::serde::decode_from_slice::<Vec<Station>, _>(&bytes, BINCODE_CONFIG).map_err(
                |e| StationDataError::CacheDecode(cache_path.to_path_buf(), Box::from(e)),
            )?;
        Ok(decoded_stations)
    }

    async fn cache_stations(
        stations: Vec<Station>,
        cache_path: &Path,
    ) -> Result<(), StationDataError> {
        let bincode_data = tokio::task::spawn_blocking(move || {
            bincode::serde::encode_to_vec(stations, BINCODE_CONFIG)
                .map_err(|e| StationDataError::CacheEncode(Box::new(e)))
        })
        .await??;
        tokio::fs::write(cache_path, &bincode_data)
            .await
            .map_err(|e| StationDataError::CacheWrite(cache_path.to_path_buf(), e))?;
        info!(
            "Wrote station cache ({} bytes) to {}",
            bincode_data.len(),
            cache_path.display()
        );
        Ok(())
    }

    /// Parses `stations.csv`. Coordinates that are empty, not numbers, non-finite or out of
    /// range become `None`.
    fn read_stations_csv(csv_path: &Path) -> Result<Vec<Station>, StationDataError> {
        let raw = read_csv_as_strings(csv_path)
            .map_err(|e| StationDataError::CsvRead(csv_path.to_path_buf(), e))?;
        let df = raw
            .lazy()
            .with_columns([
                col(columns::LATITUDE).cast(DataType::Float64),
                col(columns::LONGITUDE).cast(DataType::Float64),
            ])
            .select(columns::ALL.map(col))
            .collect()
            .map_err(|e| StationDataError::CsvRead(csv_path.to_path_buf(), e))?;

        let ids = df.column(columns::STATION_ID)?;
        let names = df.column(columns::NAME)?;
        let latitudes = df.column(columns::LATITUDE)?;
        let longitudes = df.column(columns::LONGITUDE)?;
        let countries = df.column(columns::COUNTRY)?;
        let provinces = df.column(columns::PROVINCE)?;
        let cities = df.column(columns::CITY)?;
        let districts = df.column(columns::DISTRICT)?;

        (0..df.height())
            .map(|idx| -> Result<Station, StationDataError> {
                let station_id =
                    get_opt_str(ids, idx).ok_or(StationDataError::MissingStationId(idx))?;
                let mut station = Station {
                    station_id,
                    name: get_opt_str(names, idx),
                    latitude: get_opt_float(latitudes, idx),
                    longitude: get_opt_float(longitudes, idx),
                    country: get_opt_str(countries, idx),
                    province: get_opt_str(provinces, idx),
                    city: get_opt_str(cities, idx),
                    district: get_opt_str(districts, idx),
                    geom: None,
                };
                // "NaN" and "inf" parse as floats
                station.discard_invalid_coordinates();
                Ok(station)
            })
            .collect()
    }

    /// Fills every station's `geom` and indexes the located ones in an R-tree.
    pub fn build_spatial_index(&mut self) {
        for station in &mut self.stations {
            station.populate_geom();
        }
        let entries: Vec<IndexedStation> = self
            .stations
            .iter()
            .enumerate()
            .filter_map(|(slot, station)| {
                station.geom.map(|geom| IndexedStation {
                    point: geom.as_array(),
                    slot,
                })
            })
            .collect();
        debug!("Indexed {} located stations", entries.len());
        self.spatial_index = Some(RTree::bulk_load(entries));
    }

    /// Reverts [`StationCatalog::build_spatial_index`].
    pub fn drop_spatial_index(&mut self) {
        for station in &mut self.stations {
            station.clear_geom();
        }
        self.spatial_index = None;
    }

    pub(crate) fn spatial_index(&self) -> Option<&RTree<IndexedStation>> {
        self.spatial_index.as_ref()
    }

    pub fn station(&self, station_id: &str) -> Option<&Station> {
        self.by_id.get(station_id).map(|&slot| &self.stations[slot])
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations matching `region` that have both coordinates.
    pub fn eligible<'a>(&'a self, region: &'a RegionFilter) -> impl Iterator<Item = &'a Station> {
        self.stations
            .iter()
            .filter(move |s| region.matches(s) && s.coordinate().is_some())
    }

    /// The same selection as [`StationCatalog::eligible`], as a lazy frame over the catalog.
    pub fn eligible_frame(&self, region: &RegionFilter) -> LazyFrame {
        self.frame.clone().lazy().filter(
            region
                .to_expr()
                .and(col(columns::LATITUDE).is_not_null())
                .and(col(columns::LONGITUDE).is_not_null()),
        )
    }
}
