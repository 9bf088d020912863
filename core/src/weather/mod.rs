//! Weather query handling on top of the agent

pub mod location;
pub mod query;

pub use location::{extract_location, FALLBACK_LOCATION, KNOWN_CITIES};
pub use query::process_weather_query;
