use async_trait::async_trait;
use thiserror::Error;

use crate::models::{FundamentalsSnapshot, PriceBar};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("symbol not found")]
    NotFound,

    #[error("rate limited by provider")]
    RateLimited,
}

/// A market data source for one-shot lookups.
///
/// The service needs exactly two things from the outside world: daily closes
/// over a trailing window and a sparse fundamentals snapshot. Anything that
/// produces those is a drop-in provider, including the mocks the API tests
/// inject.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily closing prices spanning roughly the trailing `months`, ordered
    /// chronologically ascending. The result may legitimately be empty or
    /// shorter than requested; short histories are the indicator engine's
    /// problem, not an error.
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        months: u32,
    ) -> Result<Vec<PriceBar>, ProviderError>;

    /// Fundamental fields for `symbol` at request time. Missing fields stay
    /// `None`; only total lookup failure is an error.
    async fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> Result<FundamentalsSnapshot, ProviderError>;
}
