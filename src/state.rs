use std::sync::Arc;

use crate::external::provider::MarketDataProvider;

/// Shared handler state. The service holds no storage; the provider handle
/// is the only thing requests need.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
}
