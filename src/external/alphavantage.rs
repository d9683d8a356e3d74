use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::external::provider::{MarketDataProvider, ProviderError};
use crate::models::{FundamentalsSnapshot, PriceBar};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage client. Requires an API key (`ALPHAVANTAGE_API_KEY`); the
/// free tier is limited to 25 requests per day, and the API reports that
/// limit in-band as a `"Note"` field on an otherwise-OK response.
pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .map_err(|_| ProviderError::BadResponse("ALPHAVANTAGE_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }
}

// ---------------------------------------------------------------------------
// Response shapes. Alpha Vantage sends every number as a string and uses
// position-prefixed field names ("4. close", "05. price").
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DailyResponse {
    // BTreeMap keyed by "YYYY-MM-DD" gives us ascending order for free.
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[derive(Debug, Default, Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Currency")]
    currency: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "TrailingPE")]
    trailing_pe: Option<String>,
    #[serde(rename = "PEGRatio")]
    peg_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    price_to_book: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
}

/// Alpha Vantage writes missing numbers as `"None"` or `"-"` instead of
/// omitting the field.
fn lenient_f64(field: Option<&str>) -> Option<f64> {
    match field {
        Some(s) if s != "None" && s != "-" => s.parse().ok(),
        _ => None,
    }
}

fn bars_from_daily(resp: DailyResponse, months: u32) -> Result<Vec<PriceBar>, ProviderError> {
    if resp.note.is_some() {
        return Err(ProviderError::RateLimited);
    }
    if let Some(msg) = resp.error_message {
        return Err(ProviderError::BadResponse(msg));
    }
    let series = resp
        .time_series
        .ok_or_else(|| ProviderError::BadResponse("missing time series".into()))?;

    let mut bars = Vec::with_capacity(series.len());
    for (date, bar) in series {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| ProviderError::Parse(format!("bad date {date:?}: {e}")))?;
        let close = bar
            .close
            .parse::<f64>()
            .map_err(|e| ProviderError::Parse(format!("bad close for {date}: {e}")))?;
        bars.push(PriceBar { date, close });
    }

    // The API has no range parameter, so trim to roughly the requested
    // window (~21 trading days per month).
    let keep = (months as usize).saturating_mul(21);
    if keep > 0 && bars.len() > keep {
        bars.drain(..bars.len() - keep);
    }
    Ok(bars)
}

fn snapshot_from_parts(
    overview: OverviewResponse,
    quote: GlobalQuoteResponse,
) -> Result<FundamentalsSnapshot, ProviderError> {
    if overview.note.is_some() || quote.note.is_some() {
        return Err(ProviderError::RateLimited);
    }
    if let Some(msg) = overview.error_message {
        return Err(ProviderError::BadResponse(msg));
    }
    // An unknown symbol comes back as a bare `{}` from OVERVIEW.
    if overview.symbol.is_none() {
        return Err(ProviderError::NotFound);
    }

    let q = quote.quote.unwrap_or_default();
    Ok(FundamentalsSnapshot {
        current_price: lenient_f64(q.price.as_deref()),
        regular_market_price: None,
        volume: lenient_f64(q.volume.as_deref()),
        market_cap: lenient_f64(overview.market_cap.as_deref()),
        trailing_pe: lenient_f64(overview.trailing_pe.as_deref()),
        peg_ratio: lenient_f64(overview.peg_ratio.as_deref()),
        price_to_book: lenient_f64(overview.price_to_book.as_deref()),
        currency: overview.currency,
    })
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    async fn fetch_daily_closes(
        &self,
        symbol: &str,
        months: u32,
    ) -> Result<Vec<PriceBar>, ProviderError> {
        // "compact" caps the series at 100 bars; anything longer needs "full".
        let approx_days = (months as usize).saturating_mul(21);
        let outputsize = if approx_days <= 100 { "compact" } else { "full" };

        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", outputsize),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let body: DailyResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        bars_from_daily(body, months)
    }

    async fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> Result<FundamentalsSnapshot, ProviderError> {
        let overview = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .json::<OverviewResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let quote = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .json::<GlobalQuoteResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        snapshot_from_parts(overview, quote)
    }
}
