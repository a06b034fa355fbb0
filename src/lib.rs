mod cuaca;
mod error;
mod fetch;
mod providers;
mod record;
mod registry;
mod scheduler;
mod store;
mod utils;

pub use cuaca::{Cuaca, LocationOutcome, Outcome, DEFAULT_CONCURRENCY_LIMIT};
pub use error::CuacaError;

pub use fetch::{FetchError, Fetcher, ProviderEndpoints, RetryPolicy, DEFAULT_REQUEST_TIMEOUT};
pub use providers::{normalize, NormalizeError};
pub use record::{local_timestamp, FallbackNote, LocationInfo, WeatherRecord};
pub use registry::{default_locations, load_locations, Location, ProviderAddress, ProviderKind};
pub use scheduler::{Scheduler, SchedulerState, DEFAULT_PERIOD};
pub use store::{FallbackOutcome, IndexEntry, StoreError, WeatherStore, INDEX_FILE};
pub use utils::DEFAULT_STORE_DIR;
