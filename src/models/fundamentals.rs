/// Point-in-time fundamental fields for one symbol, as returned by a market
/// data provider.
///
/// Providers rarely populate every field, so everything is optional. Numeric
/// fields may still carry NaN straight off the wire; consumers go through
/// `services::indicators::sanitize` before trusting a value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FundamentalsSnapshot {
    /// Latest traded price, where the provider distinguishes it from the
    /// regular-session quote.
    pub current_price: Option<f64>,
    /// Regular-session market price; fallback source for the reported price.
    pub regular_market_price: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    /// ISO currency code of the quote, e.g. "USD".
    pub currency: Option<String>,
}
