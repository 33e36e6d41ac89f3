/*
[INPUT]:  Wallex REST route table
[OUTPUT]: Immutable EndpointSpec tables injected into each facade
[POS]:    HTTP layer - endpoint configuration constants
[UPDATE]: When Wallex adds, moves or renames a route
*/

use std::fmt;

use reqwest::Method;

/// HTTP verbs used by the Wallex API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One route: path relative to the base URL plus its verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointSpec {
    pub path: &'static str,
    pub method: HttpMethod,
}

impl EndpointSpec {
    pub const fn get(path: &'static str) -> Self {
        Self {
            path,
            method: HttpMethod::Get,
        }
    }

    pub const fn post(path: &'static str) -> Self {
        Self {
            path,
            method: HttpMethod::Post,
        }
    }

    pub const fn delete(path: &'static str) -> Self {
        Self {
            path,
            method: HttpMethod::Delete,
        }
    }

    /// Path with one trailing segment appended: `{path}/{segment}`
    pub fn path_with(&self, segment: &str) -> String {
        format!("{}/{}", self.path.trim_end_matches('/'), segment)
    }
}

// ### Market data (public)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketEndpoints {
    pub markets: EndpointSpec,
    pub currencies_stats: EndpointSpec,
    pub order_book_symbol: EndpointSpec,
    pub order_book_all: EndpointSpec,
    pub latest_trades: EndpointSpec,
    pub market_history: EndpointSpec,
}

impl MarketEndpoints {
    pub const WALLEX: Self = Self {
        markets: EndpointSpec::get("v1/markets"),
        currencies_stats: EndpointSpec::get("v1/currencies/stats"),
        order_book_symbol: EndpointSpec::get("v1/depth"),
        order_book_all: EndpointSpec::get("v2/depth/all"),
        latest_trades: EndpointSpec::get("v1/trades"),
        market_history: EndpointSpec::get("v1/udf/history"),
    };
}

impl Default for MarketEndpoints {
    fn default() -> Self {
        Self::WALLEX
    }
}

// ### Account (x-api-key)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountEndpoints {
    pub profile: EndpointSpec,
    pub fee: EndpointSpec,
    pub card_numbers: EndpointSpec,
    pub ibans: EndpointSpec,
    pub balances: EndpointSpec,
    pub money_deposit: EndpointSpec,
    pub money_withdrawal_history: EndpointSpec,
    pub money_withdrawal: EndpointSpec,
    pub crypto_deposit: EndpointSpec,
    pub crypto_withdrawal_history: EndpointSpec,
    pub crypto_withdrawal: EndpointSpec,
    pub transfers: EndpointSpec,
}

impl AccountEndpoints {
    pub const WALLEX: Self = Self {
        profile: EndpointSpec::get("v1/account/profile"),
        fee: EndpointSpec::get("v1/account/fee"),
        card_numbers: EndpointSpec::get("v1/account/card-numbers"),
        ibans: EndpointSpec::get("v1/account/ibans"),
        balances: EndpointSpec::get("v1/account/balances"),
        money_deposit: EndpointSpec::get("v1/account/money-deposit"),
        money_withdrawal_history: EndpointSpec::get("v1/account/money-withdrawal"),
        money_withdrawal: EndpointSpec::post("v1/account/money-withdrawal"),
        crypto_deposit: EndpointSpec::get("v1/account/crypto-deposit"),
        crypto_withdrawal_history: EndpointSpec::get("v1/account/crypto-withdrawal"),
        crypto_withdrawal: EndpointSpec::post("v1/account/crypto-withdrawal"),
        transfers: EndpointSpec::get("sub-accounts/transfers"),
    };
}

impl Default for AccountEndpoints {
    fn default() -> Self {
        Self::WALLEX
    }
}

// ### Orders (x-api-key)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderEndpoints {
    pub place_order: EndpointSpec,
    /// Base path; the client order id is appended as a segment
    pub get_order: EndpointSpec,
    /// Base path; the client order id is appended as a segment
    pub cancel_order: EndpointSpec,
    pub open_orders: EndpointSpec,
    pub last_trades: EndpointSpec,
}

impl OrderEndpoints {
    pub const WALLEX: Self = Self {
        place_order: EndpointSpec::post("v1/account/orders"),
        get_order: EndpointSpec::get("v1/account/orders"),
        cancel_order: EndpointSpec::delete("v1/account/orders"),
        open_orders: EndpointSpec::get("v1/account/openOrders"),
        last_trades: EndpointSpec::get("v1/account/trades"),
    };
}

impl Default for OrderEndpoints {
    fn default() -> Self {
        Self::WALLEX
    }
}

// ### OTC (x-api-key)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtcEndpoints {
    pub markets: EndpointSpec,
    pub price: EndpointSpec,
    pub orders: EndpointSpec,
}

impl OtcEndpoints {
    pub const WALLEX: Self = Self {
        markets: EndpointSpec::get("v1/otc/markets"),
        price: EndpointSpec::get("v1/account/otc/price"),
        orders: EndpointSpec::post("v1/account/otc/orders"),
    };
}

impl Default for OtcEndpoints {
    fn default() -> Self {
        Self::WALLEX
    }
}
