use tracing::info;

use crate::errors::AppError;
use crate::external::provider::MarketDataProvider;
use crate::models::{FundamentalsSnapshot, IndicatorReport};
use crate::services::indicators::{ema, macd, rsi, sanitize, sma};

/// How much history to request. Six months (~126 trading days) is enough
/// for the 50-day SMA and the 14-day RSI to be fully formed; the 200-span
/// EMA seeds from the first bar and is reported regardless.
pub const HISTORY_MONTHS: u32 = 6;

const SMA_WINDOW: usize = 50;
const EMA_SPAN: usize = 200;
const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

const MAX_SYMBOL_LEN: usize = 12;

/// Guard against junk in the path before spending a provider call on it.
/// Real tickers are short and use a narrow alphabet ("BRK-B", "^GSPC",
/// "EURUSD=X", "BF.B").
fn validate_symbol(raw: &str) -> Result<&str, AppError> {
    let symbol = raw.trim();
    if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
        return Err(AppError::Validation(format!(
            "invalid symbol {raw:?}: expected 1-{MAX_SYMBOL_LEN} characters"
        )));
    }
    if !symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'))
    {
        return Err(AppError::Validation(format!(
            "invalid symbol {raw:?}: unexpected characters"
        )));
    }
    Ok(symbol)
}

/// Fetch history and fundamentals for one symbol and fold them into a
/// report. The two provider calls are independent, so they run concurrently.
pub async fn report_for_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> Result<IndicatorReport, AppError> {
    let symbol = validate_symbol(symbol)?;

    let (fundamentals, bars) = tokio::join!(
        provider.fetch_fundamentals(symbol),
        provider.fetch_daily_closes(symbol, HISTORY_MONTHS),
    );
    let (fundamentals, bars) = (fundamentals?, bars?);

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    info!(
        "Computing indicators for {} over {} bars",
        symbol,
        closes.len()
    );

    Ok(build_report(symbol, &closes, &fundamentals))
}

/// Pure assembly step: last value of each indicator series, sanitized, plus
/// the fundamentals passthrough. Short or empty history degrades field by
/// field to `None` rather than failing the request.
pub fn build_report(
    symbol: &str,
    closes: &[f64],
    fundamentals: &FundamentalsSnapshot,
) -> IndicatorReport {
    let sma_50 = sma(closes, SMA_WINDOW).last().copied().flatten();
    let ema_200 = ema(closes, EMA_SPAN).last().copied();
    let rsi_14 = rsi(closes, RSI_PERIOD).last().copied().flatten();
    let (macd_line, signal_line) = macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

    // Prefer the live price; fall back to the last regular-market print.
    // Sanitize first so a NaN current price still falls through.
    let price = sanitize(fundamentals.current_price)
        .or_else(|| sanitize(fundamentals.regular_market_price));

    IndicatorReport {
        symbol: symbol.to_uppercase(),
        price,
        currency: fundamentals.currency.clone(),
        volume: sanitize(fundamentals.volume),
        market_cap: sanitize(fundamentals.market_cap),
        pe_ratio: sanitize(fundamentals.trailing_pe),
        peg_ratio: sanitize(fundamentals.peg_ratio),
        pb_ratio: sanitize(fundamentals.price_to_book),
        sma_50: sanitize(sma_50),
        ema_200: sanitize(ema_200),
        rsi_14: sanitize(rsi_14),
        macd: sanitize(macd_line.last().copied()),
        signal: sanitize(signal_line.last().copied()),
    }
}
