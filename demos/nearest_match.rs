use chrono::NaiveDate;
use serde_json::to_string_pretty;
use std::path::PathBuf;
use weather_match::{LatLon, MatchError, MatcherConfig, Observation, Station, WeatherMatcher};

fn synthetic_matcher() -> Result<WeatherMatcher, MatchError> {
    let stations = vec![
        Station::builder()
            .station_id("58362099999")
            .name("SHANGHAI")
            .latitude(31.4)
            .longitude(121.467)
            .country("中国")
            .province("上海")
            .build(),
        Station::builder()
            .station_id("54511099999")
            .name("BEIJING")
            .latitude(39.933)
            .longitude(116.283)
            .country("中国")
            .province("北京")
            .build(),
    ];
    let observations = vec![
        Observation::builder()
            .station_id("58362099999")
            .date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
            .temperature(77.4)
            .precipitation(0.12)
            .frshtt(10000)
            .build(),
        Observation::builder()
            .station_id("58362099999")
            .date(NaiveDate::from_ymd_opt(2021, 6, 3).unwrap())
            .temperature(79.1)
            .wind_speed(12.3)
            .build(),
    ];
    WeatherMatcher::from_records(stations, &observations, MatcherConfig::default())
}

/// Resolves the People's Square in Shanghai for 2021-06-02.
///
/// With a directory argument the matcher reads `stations.csv` / `observations.csv` from it;
/// otherwise it uses a small built-in data set.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matcher = match std::env::args().nth(1) {
        Some(dir) => WeatherMatcher::with_data_dir(&PathBuf::from(dir), MatcherConfig::default()).await?,
        None => synthetic_matcher()?,
    };

    let found = matcher
        .resolve()
        .location(LatLon(31.2304, 121.4737))
        .date(NaiveDate::from_ymd_opt(2021, 6, 2).ok_or("invalid query date")?)
        .include_incomplete(true)
        .call()?;

    let json = to_string_pretty(&found)?;
    println!("{}", json);
    if let Some(events) = found.observation.events() {
        println!("events: {:?}", events);
    }
    Ok(())
}
