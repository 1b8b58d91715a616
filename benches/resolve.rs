use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weather_match::{
    great_circle_distance, LatLon, MatcherConfig, Observation, RankingMode, Station,
    WeatherMatcher, EARTH_RADIUS_KM,
};

fn synthetic_stations(count: u32) -> Vec<Station> {
    (0..count)
        .map(|i| {
            Station::builder()
                .station_id(format!("{i:011}"))
                .latitude(18.0 + ((i * 7919) % 3500) as f64 * 0.01)
                .longitude(75.0 + ((i * 104_729) % 6000) as f64 * 0.01)
                .country("中国")
                .build()
        })
        .collect()
}

fn synthetic_observations(stations: &[Station], days: u32) -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    stations
        .iter()
        .flat_map(|station| {
            (0..days).map(move |day| {
                Observation::builder()
                    .station_id(station.station_id.clone())
                    .date(start + chrono::Duration::days(day as i64))
                    .maybe_wind_speed((day % 3 != 0).then_some(day as f64 * 0.1))
                    .build()
            })
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let stations = synthetic_stations(5_000);
    let observations = synthetic_observations(&stations, 60);
    let query = LatLon(31.2304, 121.4737);
    let date = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();

    c.bench_function("great_circle_distance", |b| {
        b.iter(|| {
            great_circle_distance(
                black_box(query),
                black_box(LatLon(39.9042, 116.4074)),
                EARTH_RADIUS_KM,
            )
        })
    });

    let configs = [
        ("resolve_frame", MatcherConfig::builder().ranking(RankingMode::Frame).build()),
        ("resolve_in_process", MatcherConfig::builder().ranking(RankingMode::InProcess).build()),
        (
            "resolve_in_process_indexed",
            MatcherConfig::builder()
                .ranking(RankingMode::InProcess)
                .spatial_index(true)
                .build(),
        ),
    ];
    for (name, config) in configs {
        let matcher = WeatherMatcher::from_records(stations.clone(), &observations, config)
            .expect("synthetic data is valid");
        c.bench_function(name, |b| {
            b.iter(|| {
                matcher
                    .resolve()
                    .location(black_box(query))
                    .date(date)
                    .include_incomplete(true)
                    .call()
            })
        });
    }
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
