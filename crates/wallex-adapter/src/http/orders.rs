/*
[INPUT]:  Order requests and client order identifiers
[OUTPUT]: Order placement, lookup, cancellation and trade history responses
[POS]:    HTTP layer - order lifecycle endpoints (require x-api-key)
[UPDATE]: When adding new order endpoints or changing order flow
*/

use tracing::debug;

use crate::http::endpoints::{EndpointSpec, OrderEndpoints};
use crate::http::error::require_non_empty;
use crate::http::{Credentials, QueryParams, Result, WallexClient};
use crate::types::{ApiResponse, ClientOrderId, PlaceOrderRequest, Side};

/// Authenticated order lifecycle facade
#[derive(Debug, Clone)]
pub struct OrdersManage {
    client: WallexClient,
    endpoints: OrderEndpoints,
}

impl OrdersManage {
    pub fn new(client: WallexClient, credentials: Credentials) -> Self {
        Self::with_endpoints(client, credentials, OrderEndpoints::default())
    }

    pub fn with_endpoints(
        client: WallexClient,
        credentials: Credentials,
        endpoints: OrderEndpoints,
    ) -> Self {
        Self {
            client: client.with_credentials(credentials),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &OrderEndpoints {
        &self.endpoints
    }

    async fn call(
        &self,
        spec: EndpointSpec,
        path: &str,
        query: QueryParams,
    ) -> Result<ApiResponse> {
        self.client
            .request(spec.method, path, query, None, true)
            .await
    }

    /// Place a new order
    ///
    /// POST v1/account/orders
    /// An invalid `client_id` is rejected before any request is sent; an empty
    /// one is treated as absent.
    pub async fn set_order(&self, mut req: PlaceOrderRequest) -> Result<ApiResponse> {
        require_non_empty("symbol", &req.symbol)?;
        req.client_id = match req.client_id.take().filter(|id| !id.is_empty()) {
            Some(raw) => Some(ClientOrderId::new(raw)?.into_inner()),
            None => None,
        };

        debug!(
            symbol = %req.symbol,
            side = %req.side,
            order_type = %req.order_type,
            client_id = req.client_id.as_deref().unwrap_or(""),
            "placing order"
        );

        let body = serde_json::to_value(&req)?;
        let spec = self.endpoints.place_order;
        self.client
            .request(spec.method, spec.path, Vec::new(), Some(body), true)
            .await
    }

    /// Look up an order by client order id
    ///
    /// GET v1/account/orders/{client_order_id}
    pub async fn get_order(&self, client_order_id: &str) -> Result<ApiResponse> {
        let id = ClientOrderId::new(client_order_id)?;
        let spec = self.endpoints.get_order;
        self.call(spec, &spec.path_with(id.as_str()), Vec::new())
            .await
    }

    /// Cancel an order by client order id
    ///
    /// DELETE v1/account/orders/{client_order_id}
    pub async fn del_order(&self, client_order_id: &str) -> Result<ApiResponse> {
        let id = ClientOrderId::new(client_order_id)?;
        let spec = self.endpoints.cancel_order;
        self.call(spec, &spec.path_with(id.as_str()), Vec::new())
            .await
    }

    /// Open orders, optionally for one symbol
    ///
    /// GET v1/account/openOrders?symbol={symbol}
    pub async fn get_open_orders(&self, symbol: Option<&str>) -> Result<ApiResponse> {
        let spec = self.endpoints.open_orders;
        let query = vec![("symbol", symbol.map(str::to_string))];
        self.call(spec, spec.path, query).await
    }

    /// Own trade history, optionally filtered
    ///
    /// GET v1/account/trades?symbol={symbol}&side={buy|sell}
    pub async fn get_last_trades(
        &self,
        symbol: Option<&str>,
        side: Option<Side>,
    ) -> Result<ApiResponse> {
        let spec = self.endpoints.last_trades;
        let query = vec![
            ("symbol", symbol.map(str::to_string)),
            ("side", side.map(|side| side.as_query_str().to_string())),
        ];
        self.call(spec, spec.path, query).await
    }
}
