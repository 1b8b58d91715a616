pub mod expr;
pub mod haversine;
