//! Core types and Open-Meteo client for daily weather observations.

pub mod error;
pub mod location;
pub mod observation;
pub mod open_meteo;

pub use error::{MeteoError, Result};
pub use location::Location;
pub use observation::Observation;
