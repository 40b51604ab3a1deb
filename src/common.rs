pub mod coerce;
pub mod error;
pub mod ids;
