use chrono::NaiveDate;

// One trading day of price history for a symbol. The indicator engine only
// ever reads `close`; the date is kept for ordering and debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}
