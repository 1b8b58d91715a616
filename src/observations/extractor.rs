use crate::observations::error::ObservationDataError;
use crate::types::observation::{columns, from_epoch_days, Observation};
use crate::utils::{get_opt_float, get_opt_int, get_opt_str};
use polars::prelude::*;

// Helper macro to get a column or return ColumnNotFound
macro_rules! get_series {
    ($df:expr, $name:expr) => {
        $df.column($name)
            .map_err(|e| ObservationDataError::ColumnNotFound($name.to_string(), e))?
    };
}

/// Converts every row of an observation frame into an [`Observation`], in frame order.
pub(crate) fn extract_observations(
    df: &DataFrame,
) -> Result<Vec<Observation>, ObservationDataError> {
    let station_ids = get_series!(df, columns::STATION_ID);
    let dates = get_series!(df, columns::DATE).cast(&DataType::Int32)?;
    let dates = dates.i32()?;

    let temp = get_series!(df, columns::TEMP);
    let dewp = get_series!(df, columns::DEWP);
    let slp = get_series!(df, columns::SLP);
    let stp = get_series!(df, columns::STP);
    let visib = get_series!(df, columns::VISIB);
    let wdsp = get_series!(df, columns::WDSP);
    let mxspd = get_series!(df, columns::MXSPD);
    let gust = get_series!(df, columns::GUST);
    let max = get_series!(df, columns::MAX);
    let min = get_series!(df, columns::MIN);
    let prcp = get_series!(df, columns::PRCP);
    let sndp = get_series!(df, columns::SNDP);
    let frshtt = get_series!(df, columns::FRSHTT);

    (0..df.height())
        .map(|row| -> Result<Observation, ObservationDataError> {
            let station_id =
                get_opt_str(station_ids, row).ok_or(ObservationDataError::MissingKey {
                    row,
                    column: columns::STATION_ID,
                })?;
            let days = dates.get(row).ok_or(ObservationDataError::MissingKey {
                row,
                column: columns::DATE,
            })?;
            let date = from_epoch_days(days).ok_or(ObservationDataError::InvalidDate { row, days })?;

            Ok(Observation {
                station_id,
                date,
                temperature: get_opt_float(temp, row),
                dew_point: get_opt_float(dewp, row),
                sea_level_pressure: get_opt_float(slp, row),
                station_pressure: get_opt_float(stp, row),
                visibility: get_opt_float(visib, row),
                wind_speed: get_opt_float(wdsp, row),
                max_sustained_wind_speed: get_opt_float(mxspd, row),
                gust: get_opt_float(gust, row),
                max_temperature: get_opt_float(max, row),
                min_temperature: get_opt_float(min, row),
                precipitation: get_opt_float(prcp, row),
                snow_depth: get_opt_float(sndp, row),
                frshtt: get_opt_int(frshtt, row),
            })
        })
        .collect()
}

/// First row of `df`, if any.
pub(crate) fn extract_first(df: &DataFrame) -> Result<Option<Observation>, ObservationDataError> {
    Ok(extract_observations(&df.head(Some(1)))?.into_iter().next())
}
