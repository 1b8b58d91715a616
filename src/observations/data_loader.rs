use crate::observations::error::ObservationDataError;
use crate::types::observation::{columns, from_epoch_days};
use crate::utils::{cache_state, read_csv_as_strings, CacheState};
use log::{info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::task;

const CSV_FILE_NAME: &str = "observations.csv";
const PARQUET_CACHE_FILE_NAME: &str = "observations.parquet";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keeps `observations.parquet` in step with `observations.csv` inside a data directory.
pub struct ObservationDataLoader {
    data_dir: PathBuf,
}

impl ObservationDataLoader {
    pub fn new(data_dir: &Path) -> ObservationDataLoader {
        ObservationDataLoader {
            data_dir: data_dir.to_path_buf(),
        }
    }

    /// Rebuilds the parquet cache if the CSV is newer, and returns the cache path.
    pub async fn prepare(&self) -> Result<PathBuf, ObservationDataError> {
        let csv_path = self.data_dir.join(CSV_FILE_NAME);
        let parquet_path = self.data_dir.join(PARQUET_CACHE_FILE_NAME);

        match cache_state(
            &csv_path,
            &parquet_path,
            ObservationDataError::CacheMetadataRead,
        )
        .await?
        {
            CacheState::Current => {
                info!("Observation cache hit at {:?}", parquet_path);
            }
            CacheState::Rebuild => {
                warn!(
                    "Observation cache missing or older than {:?}. Parsing CSV.",
                    csv_path
                );
                let df = Self::csv_to_dataframe(&csv_path).await?;
                let rows = df.height();
                Self::cache_dataframe(df, &parquet_path).await?;
                info!("Cached {} observations to {:?}", rows, parquet_path);
            }
            CacheState::Missing => {
                return Err(ObservationDataError::SourceMissing(self.data_dir.clone()));
            }
        }
        Ok(parquet_path)
    }

    pub fn scan(parquet_path: &Path) -> Result<LazyFrame, ObservationDataError> {
        LazyFrame::scan_parquet(parquet_path, Default::default())
            .map_err(|e| ObservationDataError::ParquetScan(parquet_path.to_path_buf(), e))
    }

    /// Parses the CSV on a blocking task and converts every column to its observation type.
    async fn csv_to_dataframe(csv_path: &Path) -> Result<DataFrame, ObservationDataError> {
        let path_buf = csv_path.to_path_buf();
        task::spawn_blocking(move || -> Result<DataFrame, ObservationDataError> {
            let raw = read_csv_as_strings(&path_buf)
                .map_err(|e| ObservationDataError::CsvRead(path_buf.clone(), e))?;
            let df = typed_observations(raw.lazy())
                .collect()
                .map_err(|e| ObservationDataError::CsvRead(path_buf, e))?;
            ensure_unique_keys(&df)?;
            Ok(df)
        })
        .await?
    }

    /// Writes a DataFrame to a Parquet file using spawn_blocking. `ParquetWriter` needs `&mut df`.
    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), ObservationDataError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| ObservationDataError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| ObservationDataError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), ObservationDataError>(())
        })
        .await??;
        Ok(())
    }
}

/// Casts text columns to their observation types. Values that do not parse become null, and
/// rows without a station id or a valid date are dropped.
pub(crate) fn typed_observations(raw: LazyFrame) -> LazyFrame {
    let date_options = StrptimeOptions {
        format: Some(DATE_FORMAT.into()),
        strict: false,
        ..Default::default()
    };

    let mut exprs = vec![
        col(columns::STATION_ID),
        col(columns::DATE).str().to_date(date_options),
    ];
    exprs.extend(
        columns::MEASUREMENTS
            .iter()
            .map(|name| col(*name).cast(DataType::Float64)),
    );
    exprs.push(col(columns::FRSHTT).cast(DataType::Int64));

    raw.select(exprs).filter(
        col(columns::STATION_ID)
            .is_not_null()
            .and(col(columns::DATE).is_not_null()),
    )
}

/// Fails on the first `(station_id, date)` pair that occurs twice.
pub(crate) fn ensure_unique_keys(df: &DataFrame) -> Result<(), ObservationDataError> {
    let station_ids = df.column(columns::STATION_ID)?.str()?;
    let dates = df.column(columns::DATE)?.cast(&DataType::Int32)?;
    let dates = dates.i32()?;

    let mut seen = HashSet::with_capacity(df.height());
    for (row, key) in station_ids.into_iter().zip(dates).enumerate() {
        let (Some(station_id), Some(days)) = key else {
            continue;
        };
        if !seen.insert((station_id, days)) {
            let date =
                from_epoch_days(days).ok_or(ObservationDataError::InvalidDate { row, days })?;
            return Err(ObservationDataError::DuplicateObservation {
                station_id: station_id.to_string(),
                date,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const CSV: &str = "\
station_id,date,temp,dewp,slp,stp,visib,wdsp,mxspd,gust,max,min,prcp,sndp,frshtt
58362099999,2021-06-01,24.5,20.1,1008.2,1007.9,8.1,,9.9,,28.1,21.0,0.12,,010000
58362099999,2021-06-03,25.0,19.8,1009.0,1008.7,9.0,12.3,15.0,21.4,29.3,22.2,0.0,,000000
58362099999,not-a-date,25.0,,,,,,,,,,,,
";

    #[tokio::test]
    async fn test_prepare_writes_parquet() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(CSV_FILE_NAME), CSV)?;

        let loader = ObservationDataLoader::new(dir.path());
        let parquet_path = loader.prepare().await?;
        assert!(parquet_path.exists());

        let df = ObservationDataLoader::scan(&parquet_path)?.collect()?;
        assert_eq!(df.height(), 2, "row with an unparsable date is dropped");
        assert_eq!(df.column(columns::DATE)?.dtype(), &DataType::Date);
        assert_eq!(df.column(columns::WDSP)?.dtype(), &DataType::Float64);
        assert_eq!(df.column(columns::WDSP)?.null_count(), 1);

        let frshtt: Vec<Option<i64>> = df.column(columns::FRSHTT)?.i64()?.into_iter().collect();
        assert_eq!(frshtt, vec![Some(10000), Some(0)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_parquet_is_rebuilt() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let csv_path = dir.path().join(CSV_FILE_NAME);
        std::fs::write(&csv_path, CSV)?;
        let loader = ObservationDataLoader::new(dir.path());
        let parquet_path = loader.prepare().await?;

        let extended = format!("{CSV}58362099999,2021-06-05,26.0,,,,,3.0,,,,,,,\n");
        std::fs::write(&csv_path, extended)?;
        let cache_modified = std::fs::metadata(&parquet_path)?.modified()?;
        std::fs::File::options()
            .write(true)
            .open(&csv_path)?
            .set_modified(cache_modified + Duration::from_secs(5))?;

        loader.prepare().await?;
        let df = ObservationDataLoader::scan(&parquet_path)?.collect()?;
        assert_eq!(df.height(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_rows_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(CSV_FILE_NAME),
            "station_id,date,temp,dewp,slp,stp,visib,wdsp,mxspd,gust,max,min,prcp,sndp,frshtt\n\
             A,2021-06-01,,,,,,1.0,,,,,,,\n\
             B,2021-06-01,,,,,,5.0,,,,,,,\n\
             A,2021-06-01,,,,,,9.0,,,,,,,\n",
        )?;

        let result = ObservationDataLoader::new(dir.path()).prepare().await;
        match result {
            Err(ObservationDataError::DuplicateObservation { station_id, date }) => {
                assert_eq!(station_id, "A");
                assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2021, 6, 1).unwrap());
            }
            other => panic!("expected DuplicateObservation, got {other:?}"),
        }
        assert!(!dir.path().join(PARQUET_CACHE_FILE_NAME).exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = ObservationDataLoader::new(dir.path()).prepare().await;
        assert!(matches!(result, Err(ObservationDataError::SourceMissing(_))));
    }
}
