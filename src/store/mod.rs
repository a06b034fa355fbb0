pub mod error;
mod weather_store;

pub use error::StoreError;
pub use weather_store::{FallbackOutcome, IndexEntry, WeatherStore, INDEX_FILE};
