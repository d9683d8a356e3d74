use serde::Serialize;

/// Flat response record for `GET /indicators/{symbol}`.
///
/// Declaration order is the wire order. Numeric fields serialize as `null`
/// rather than being skipped, so clients always see the full key set.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorReport {
    pub symbol: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_200: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
}
