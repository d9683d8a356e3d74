//! tickerlens: a small HTTP service that turns a ticker symbol into a
//! snapshot of technical indicators and fundamentals.
//!
//! One endpoint does the work: `GET /indicators/{symbol}` fetches six months
//! of daily closes plus a fundamentals snapshot from a market data provider,
//! computes SMA-50, EMA-200, RSI-14 and MACD, and returns a flat JSON
//! record. Providers sit behind [`external::provider::MarketDataProvider`],
//! so the whole pipeline runs against mocks in tests.

pub mod app;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
