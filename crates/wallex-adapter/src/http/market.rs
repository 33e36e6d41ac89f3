/*
[INPUT]:  Symbol identifiers and query parameters
[OUTPUT]: Market data (markets, currency stats, depth, trades, OHLC history)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use crate::http::endpoints::{EndpointSpec, MarketEndpoints};
use crate::http::error::require_non_empty;
use crate::http::{QueryParams, Result, WallexClient, WallexError};
use crate::types::ApiResponse;

/// Public market-data facade
#[derive(Debug, Clone)]
pub struct MarketInfo {
    client: WallexClient,
    endpoints: MarketEndpoints,
}

impl MarketInfo {
    pub fn new(client: WallexClient) -> Self {
        Self::with_endpoints(client, MarketEndpoints::default())
    }

    pub fn with_endpoints(client: WallexClient, endpoints: MarketEndpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &MarketEndpoints {
        &self.endpoints
    }

    async fn call(&self, spec: EndpointSpec, query: QueryParams) -> Result<ApiResponse> {
        self.client
            .request(spec.method, spec.path, query, None, false)
            .await
    }

    async fn call_with_symbol(&self, spec: EndpointSpec, symbol: &str) -> Result<ApiResponse> {
        require_non_empty("symbol", symbol)?;
        self.call(spec, vec![("symbol", Some(symbol.to_string()))])
            .await
    }

    /// List available markets
    ///
    /// GET v1/markets
    pub async fn get_markets(&self) -> Result<ApiResponse> {
        self.call(self.endpoints.markets, Vec::new()).await
    }

    /// Currency statistics
    ///
    /// GET v1/currencies/stats
    pub async fn get_currencies(&self) -> Result<ApiResponse> {
        self.call(self.endpoints.currencies_stats, Vec::new()).await
    }

    /// Order book for one symbol
    ///
    /// GET v1/depth?symbol={symbol}
    pub async fn get_order_book_symbol(&self, symbol: &str) -> Result<ApiResponse> {
        self.call_with_symbol(self.endpoints.order_book_symbol, symbol)
            .await
    }

    /// Aggregate order book
    ///
    /// GET v2/depth/all?symbol={symbol}
    pub async fn get_order_book_all(&self, symbol: &str) -> Result<ApiResponse> {
        self.call_with_symbol(self.endpoints.order_book_all, symbol)
            .await
    }

    /// Recent public trades
    ///
    /// GET v1/trades?symbol={symbol}
    pub async fn get_latest_trades(&self, symbol: &str) -> Result<ApiResponse> {
        self.call_with_symbol(self.endpoints.latest_trades, symbol)
            .await
    }

    /// OHLC history between two unix-second bounds
    ///
    /// GET v1/udf/history?symbol={symbol}&resolution={resolution}&from={from}&to={to}
    pub async fn get_market_history(
        &self,
        symbol: &str,
        resolution: &str,
        time_from: i64,
        time_to: i64,
    ) -> Result<ApiResponse> {
        require_non_empty("symbol", symbol)?;
        require_non_empty("resolution", resolution)?;
        if time_from > time_to {
            return Err(WallexError::validation(
                "from",
                format!("range start {time_from} is after end {time_to}"),
            ));
        }

        let query = vec![
            ("symbol", Some(symbol.to_string())),
            ("resolution", Some(resolution.to_string())),
            ("from", Some(time_from.to_string())),
            ("to", Some(time_to.to_string())),
        ];
        self.call(self.endpoints.market_history, query).await
    }
}
