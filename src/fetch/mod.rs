pub mod error;
mod fetcher;

pub use error::FetchError;
pub use fetcher::{Fetcher, ProviderEndpoints, RetryPolicy, DEFAULT_REQUEST_TIMEOUT};
