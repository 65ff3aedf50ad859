use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use market_quotes::Quote;
use tracing::{debug, warn};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::{finance::quote_request::QuoteParams, request_id},
};

/// Handler: GET /api/finance/quote?symbol=AAPL&range=1d
pub async fn quote_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<QuoteParams>,
) -> AppResult<Json<Quote>> {
    let request_id = request_id(&headers);
    debug!(%request_id, symbol = %params.symbol, range = %params.range, "quote_route: start");

    match state.quotes.get_quote(&params.symbol, &params.range).await {
        Ok(quote) => Ok(Json(quote)),
        Err(err) => {
            warn!(%request_id, error = %err, "quote_route: no source could answer");
            Err(err.into())
        }
    }
}
