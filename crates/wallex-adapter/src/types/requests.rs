/*
[INPUT]:  Caller parameters for POST endpoints
[OUTPUT]: Typed JSON request bodies with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{OrderType, Side};

/// Body of `POST v1/account/orders`
///
/// `client_id` is carried as a raw string and validated when the order is placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl PlaceOrderRequest {
    pub fn new(
        symbol: impl Into<String>,
        order_type: OrderType,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            order_type,
            side,
            price,
            quantity,
            client_id: None,
        }
    }

    pub fn limit(symbol: impl Into<String>, side: Side, price: Decimal, quantity: Decimal) -> Self {
        Self::new(symbol, OrderType::Limit, side, price, quantity)
    }

    pub fn market(
        symbol: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self::new(symbol, OrderType::Market, side, price, quantity)
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

/// Body of `POST v1/account/money-withdrawal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyWithdrawalRequest {
    pub iban: u64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub value: Decimal,
}

/// Body of `POST v1/account/crypto-withdrawal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoWithdrawalRequest {
    pub coin: String,
    pub network: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub value: Decimal,
    pub wallet_address: String,
    /// Sent as `null` when absent
    pub memo: Option<String>,
}

/// Body of `POST v1/account/otc/orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtcOrderRequest {
    pub symbol: String,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}
