use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use tickerlens::app::create_app;
use tickerlens::external::alphavantage::AlphaVantageProvider;
use tickerlens::external::provider::MarketDataProvider;
use tickerlens::external::yahoo::YahooProvider;
use tickerlens::logging::{init_logging, LoggingConfig};
use tickerlens::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    let provider_name =
        std::env::var("MARKET_DATA_PROVIDER").unwrap_or_else(|_| "yahoo".to_string());
    let provider: Arc<dyn MarketDataProvider> = match provider_name.as_str() {
        "yahoo" => {
            tracing::info!("Using market data provider: Yahoo Finance");
            Arc::new(YahooProvider::new())
        }
        "alphavantage" => {
            tracing::info!("Using market data provider: Alpha Vantage");
            Arc::new(AlphaVantageProvider::from_env()?)
        }
        other => {
            return Err(format!(
                "Invalid MARKET_DATA_PROVIDER: {other}. Must be 'yahoo' or 'alphavantage'"
            )
            .into());
        }
    };

    let app = create_app(AppState { provider });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("tickerlens listening at http://{}/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
