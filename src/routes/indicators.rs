use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::provider::ProviderError;
use crate::models::IndicatorReport;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_indicators))
}

pub async fn get_indicators(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<IndicatorReport>, AppError> {
    info!("GET /indicators/{} - Computing indicator report", symbol);
    let report = services::report_service::report_for_symbol(state.provider.as_ref(), &symbol)
        .await
        .map_err(|e| {
            match &e {
                AppError::Provider(ProviderError::RateLimited) => {
                    warn!("Rate limited while fetching data for {}", symbol)
                }
                _ => error!("Failed to build indicator report for {}: {}", symbol, e),
            }
            e
        })?;
    Ok(Json(report))
}
