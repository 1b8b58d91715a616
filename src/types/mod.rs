pub mod lat_lon;
pub mod observation;
pub mod station;
pub mod weather_events;
