use async_trait::async_trait;
use serde::Deserialize;

use crate::external::provider::{MarketDataProvider, ProviderError};
use crate::models::{FundamentalsSnapshot, PriceBar};

/// Yahoo Finance client — free, no API key required.
///
/// Price history comes from the v8 chart API, the fundamentals snapshot from
/// the v10 quoteSummary API (the same data the Python `yfinance` package
/// exposes as `Ticker.history()` and `Ticker.info`).
pub struct YahooProvider {
    client: reqwest::Client,
}

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";
const QUOTE_SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData";

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("Mozilla/5.0 (compatible; Tickerlens/0.1)")
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Yahoo only understands fixed range tokens, so the requested trailing
    /// months map to the smallest range that covers them.
    fn range_for_months(months: u32) -> &'static str {
        if months <= 1 {
            "1mo"
        } else if months <= 3 {
            "3mo"
        } else if months <= 6 {
            "6mo"
        } else if months <= 12 {
            "1y"
        } else if months <= 24 {
            "2y"
        } else {
            "5y"
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_ok(status: reqwest::StatusCode) -> Result<(), ProviderError> {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound);
    }
    if !status.is_success() {
        return Err(ProviderError::BadResponse(format!("HTTP {status}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// v8 chart response (only the fields we read)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Pull ascending bars out of a chart response. Null closes (holidays,
/// halted sessions) are skipped rather than surfaced; an empty series is
/// returned as-is so the engine can null the indicators instead of failing.
fn bars_from_chart(body: ChartResponse) -> Result<Vec<PriceBar>, ProviderError> {
    if let Some(err) = body.chart.error {
        if err.description.contains("No data found") {
            return Err(ProviderError::NotFound);
        }
        return Err(ProviderError::BadResponse(err.description));
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ProviderError::BadResponse("no result in chart response".into()))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut bars: Vec<PriceBar> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close?;
            let date = chrono::DateTime::from_timestamp(*ts, 0)?.date_naive();
            Some(PriceBar { date, close })
        })
        .collect();

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

// ---------------------------------------------------------------------------
// v10 quoteSummary response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<ApiError>,
}

// Every module is optional: Yahoo silently drops the ones it has no data
// for, and some symbols (indices, FX pairs) carry almost none of them.
#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default, rename = "summaryDetail")]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default, rename = "defaultKeyStatistics")]
    key_statistics: Option<KeyStatisticsModule>,
    #[serde(default, rename = "financialData")]
    financial_data: Option<FinancialDataModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(default, rename = "regularMarketPrice")]
    regular_market_price: Option<RawNum>,
    #[serde(default, rename = "marketCap")]
    market_cap: Option<RawNum>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default)]
    volume: Option<RawNum>,
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawNum>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatisticsModule {
    #[serde(default, rename = "pegRatio")]
    peg_ratio: Option<RawNum>,
    #[serde(default, rename = "priceToBook")]
    price_to_book: Option<RawNum>,
}

#[derive(Debug, Default, Deserialize)]
struct FinancialDataModule {
    #[serde(default, rename = "currentPrice")]
    current_price: Option<RawNum>,
}

/// Yahoo wraps most numbers as `{"raw": 1.23, "fmt": "1.23"}`, and the
/// wrapper is sometimes present but empty (`{}`).
#[derive(Debug, Default, Deserialize)]
struct RawNum {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(num: Option<RawNum>) -> Option<f64> {
    num.and_then(|n| n.raw)
}

fn snapshot_from_summary(
    body: QuoteSummaryResponse,
) -> Result<FundamentalsSnapshot, ProviderError> {
    if let Some(err) = body.quote_summary.error {
        if err.description.contains("Quote not found") {
            return Err(ProviderError::NotFound);
        }
        return Err(ProviderError::BadResponse(err.description));
    }

    let result = body
        .quote_summary
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or(ProviderError::NotFound)?;

    let price = result.price.unwrap_or_default();
    let detail = result.summary_detail.unwrap_or_default();
    let stats = result.key_statistics.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();

    Ok(FundamentalsSnapshot {
        current_price: raw(financial.current_price),
        regular_market_price: raw(price.regular_market_price),
        volume: raw(detail.volume),
        market_cap: raw(price.market_cap),
        trailing_pe: raw(detail.trailing_pe),
        peg_ratio: raw(stats.peg_ratio),
        price_to_book: raw(stats.price_to_book),
        currency: price.currency,
    })
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        months: u32,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        let url = format!("{CHART_URL}/{symbol}");
        let range = Self::range_for_months(months);

        let resp = self
            .client
            .get(&url)
            .query(&[("interval", "1d"), ("range", range)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        ensure_ok(resp.status())?;

        let body: ChartResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        bars_from_chart(body)
    }

    async fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> Result<FundamentalsSnapshot, ProviderError> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");

        let resp = self
            .client
            .get(&url)
            .query(&[("modules", QUOTE_SUMMARY_MODULES)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        ensure_ok(resp.status())?;

        let body: QuoteSummaryResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        snapshot_from_summary(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2024-01-02 / 03 / 04, midnight UTC
    const TS_JAN_2: i64 = 1_704_153_600;
    const TS_JAN_3: i64 = 1_704_240_000;
    const TS_JAN_4: i64 = 1_704_326_400;

    fn chart_json(timestamps: &[i64], closes: &str) -> ChartResponse {
        let raw = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{:?},"indicators":{{"quote":[{{"close":{}}}]}}}}],"error":null}}}}"#,
            timestamps, closes
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn chart_bars_are_ascending_with_nulls_skipped() {
        let body = chart_json(&[TS_JAN_3, TS_JAN_2, TS_JAN_4], "[101.0, 100.0, null]");
        let bars = bars_from_chart(body).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 100.0);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(bars[1].close, 101.0);
    }

    #[test]
    fn chart_with_no_usable_closes_is_empty_not_an_error() {
        let body = chart_json(&[TS_JAN_2, TS_JAN_3], "[null, null]");
        assert!(bars_from_chart(body).unwrap().is_empty());
    }

    #[test]
    fn chart_error_description_maps_to_not_found() {
        let raw = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let body: ChartResponse = serde_json::from_str(raw).unwrap();

        assert!(matches!(bars_from_chart(body), Err(ProviderError::NotFound)));
    }

    #[test]
    fn quote_summary_unwraps_raw_values() {
        let raw = r#"{
            "quoteSummary": {
                "result": [{
                    "price": {
                        "regularMarketPrice": {"raw": 189.95, "fmt": "189.95"},
                        "marketCap": {"raw": 2950000000000.0, "fmt": "2.95T"},
                        "currency": "USD"
                    },
                    "summaryDetail": {
                        "volume": {"raw": 52164500, "fmt": "52.16M"},
                        "trailingPE": {"raw": 29.31, "fmt": "29.31"}
                    },
                    "defaultKeyStatistics": {
                        "pegRatio": {"raw": 2.1, "fmt": "2.10"},
                        "priceToBook": {}
                    },
                    "financialData": {
                        "currentPrice": {"raw": 190.12, "fmt": "190.12"}
                    }
                }],
                "error": null
            }
        }"#;
        let body: QuoteSummaryResponse = serde_json::from_str(raw).unwrap();
        let snap = snapshot_from_summary(body).unwrap();

        assert_eq!(snap.current_price, Some(190.12));
        assert_eq!(snap.regular_market_price, Some(189.95));
        assert_eq!(snap.volume, Some(52_164_500.0));
        assert_eq!(snap.market_cap, Some(2_950_000_000_000.0));
        assert_eq!(snap.trailing_pe, Some(29.31));
        assert_eq!(snap.peg_ratio, Some(2.1));
        assert_eq!(snap.price_to_book, None); // empty raw wrapper
        assert_eq!(snap.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn quote_summary_tolerates_missing_modules() {
        let raw = r#"{
            "quoteSummary": {
                "result": [{
                    "price": {"currency": "USD"}
                }],
                "error": null
            }
        }"#;
        let body: QuoteSummaryResponse = serde_json::from_str(raw).unwrap();
        let snap = snapshot_from_summary(body).unwrap();

        assert_eq!(snap.current_price, None);
        assert_eq!(snap.trailing_pe, None);
        assert_eq!(snap.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn quote_summary_unknown_symbol_maps_to_not_found() {
        let raw = r#"{
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZZZ"}
            }
        }"#;
        let body: QuoteSummaryResponse = serde_json::from_str(raw).unwrap();

        assert!(matches!(
            snapshot_from_summary(body),
            Err(ProviderError::NotFound)
        ));
    }

    #[test]
    fn six_months_maps_to_yahoo_6mo_range() {
        assert_eq!(YahooProvider::range_for_months(6), "6mo");
        assert_eq!(YahooProvider::range_for_months(1), "1mo");
        assert_eq!(YahooProvider::range_for_months(7), "1y");
        assert_eq!(YahooProvider::range_for_months(60), "5y");
    }

    #[test]
    fn rate_limit_status_maps_to_rate_limited() {
        assert!(matches!(
            ensure_ok(reqwest::StatusCode::TOO_MANY_REQUESTS),
            Err(ProviderError::RateLimited)
        ));
        assert!(matches!(
            ensure_ok(reqwest::StatusCode::NOT_FOUND),
            Err(ProviderError::NotFound)
        ));
        assert!(ensure_ok(reqwest::StatusCode::OK).is_ok());
    }
}
