use crate::observations::data_loader::{ensure_unique_keys, ObservationDataLoader};
use crate::observations::error::ObservationDataError;
use crate::types::observation::{columns, epoch_days, Completeness, Observation};
use polars::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum ObservationSource {
    Parquet(PathBuf),
    Memory(DataFrame),
}

/// Read-only observation table. Every query starts a fresh lazy plan over it.
#[derive(Debug, Clone)]
pub struct ObservationStore {
    source: ObservationSource,
}

impl ObservationStore {
    /// Opens `observations.parquet` in `data_dir`, rebuilding it from `observations.csv` if needed.
    pub async fn open(data_dir: &Path) -> Result<Self, ObservationDataError> {
        let parquet_path = ObservationDataLoader::new(data_dir).prepare().await?;
        Ok(Self {
            source: ObservationSource::Parquet(parquet_path),
        })
    }

    /// Builds an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`ObservationDataError::DuplicateObservation`] if two records share a station
    /// and a date.
    pub fn from_observations(observations: &[Observation]) -> Result<Self, ObservationDataError> {
        let station_ids: Vec<&str> = observations
            .iter()
            .map(|o| o.station_id.as_str())
            .collect();
        let dates: Vec<i32> = observations.iter().map(|o| epoch_days(o.date)).collect();
        let measurements: Vec<[Option<f64>; 12]> =
            observations.iter().map(Observation::measurements).collect();
        let frshtt: Vec<Option<i64>> = observations.iter().map(|o| o.frshtt).collect();

        let mut frame_columns = vec![
            Column::new(columns::STATION_ID.into(), station_ids),
            Column::new(columns::DATE.into(), dates).cast(&DataType::Date)?,
        ];
        for (i, name) in columns::MEASUREMENTS.iter().enumerate() {
            let values: Vec<Option<f64>> = measurements.iter().map(|row| row[i]).collect();
            frame_columns.push(Column::new((*name).into(), values));
        }
        frame_columns.push(Column::new(columns::FRSHTT.into(), frshtt));

        let df = DataFrame::new(frame_columns)?;
        ensure_unique_keys(&df)?;
        Ok(Self {
            source: ObservationSource::Memory(df),
        })
    }

    /// The whole table.
    pub fn frame(&self) -> Result<LazyFrame, ObservationDataError> {
        match &self.source {
            ObservationSource::Parquet(path) => ObservationDataLoader::scan(path),
            ObservationSource::Memory(df) => Ok(df.clone().lazy()),
        }
    }

    /// Observations of `station_id` that `completeness` admits.
    pub fn eligible(
        &self,
        station_id: &str,
        completeness: Completeness,
    ) -> Result<LazyFrame, ObservationDataError> {
        let station_rows = self
            .frame()?
            .filter(col(columns::STATION_ID).eq(lit(station_id)));
        Ok(match completeness {
            Completeness::RequireWindSpeed => {
                station_rows.filter(col(columns::WDSP).is_not_null())
            }
            Completeness::IncludeIncomplete => station_rows,
        })
    }
}
