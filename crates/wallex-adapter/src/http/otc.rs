/*
[INPUT]:  OTC symbol, side literal and amount
[OUTPUT]: OTC market list, price quotes and order responses
[POS]:    HTTP layer - OTC endpoints (require x-api-key)
[UPDATE]: When OTC endpoints or accepted sides change
*/

use rust_decimal::Decimal;

use crate::http::endpoints::OtcEndpoints;
use crate::http::error::require_non_empty;
use crate::http::{Credentials, Result, WallexClient};
use crate::types::{ApiResponse, OtcOrderRequest, Side};

/// Authenticated OTC facade
#[derive(Debug, Clone)]
pub struct MarketsOtc {
    client: WallexClient,
    endpoints: OtcEndpoints,
}

impl MarketsOtc {
    pub fn new(client: WallexClient, credentials: Credentials) -> Self {
        Self::with_endpoints(client, credentials, OtcEndpoints::default())
    }

    pub fn with_endpoints(
        client: WallexClient,
        credentials: Credentials,
        endpoints: OtcEndpoints,
    ) -> Self {
        Self {
            client: client.with_credentials(credentials),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &OtcEndpoints {
        &self.endpoints
    }

    /// GET v1/otc/markets
    pub async fn get_otc_markets(&self) -> Result<ApiResponse> {
        let spec = self.endpoints.markets;
        self.client
            .request(spec.method, spec.path, Vec::new(), None, true)
            .await
    }

    /// Quote for `side` (`BUY` or `SELL`)
    ///
    /// GET v1/account/otc/price?symbol={symbol}&side={side}
    pub async fn get_otc_price(&self, symbol: &str, side: &str) -> Result<ApiResponse> {
        let side: Side = side.parse()?;
        require_non_empty("symbol", symbol)?;

        let spec = self.endpoints.price;
        let query = vec![
            ("symbol", Some(symbol.to_string())),
            ("side", Some(side.as_str().to_string())),
        ];
        self.client
            .request(spec.method, spec.path, query, None, true)
            .await
    }

    /// Request an OTC order for `amount` of `symbol`
    ///
    /// POST v1/account/otc/orders
    pub async fn get_otc_orders(
        &self,
        symbol: &str,
        side: &str,
        amount: Decimal,
    ) -> Result<ApiResponse> {
        let side: Side = side.parse()?;
        require_non_empty("symbol", symbol)?;

        let body = serde_json::to_value(OtcOrderRequest {
            symbol: symbol.to_string(),
            side,
            amount,
        })?;
        let spec = self.endpoints.orders;
        self.client
            .request(spec.method, spec.path, Vec::new(), Some(body), true)
            .await
    }
}
