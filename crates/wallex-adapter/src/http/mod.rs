/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses for every Wallex REST facade
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod account;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod market;
pub mod orders;
pub mod otc;

pub use error::{Result, WallexError};

pub use account::AccountManage;
pub use client::{ClientConfig, Credentials, DEFAULT_BASE_URL, QueryParams, WallexClient};
pub use endpoints::{
    AccountEndpoints, EndpointSpec, HttpMethod, MarketEndpoints, OrderEndpoints, OtcEndpoints,
};
pub use market::MarketInfo;
pub use orders::OrdersManage;
pub use otc::MarketsOtc;
