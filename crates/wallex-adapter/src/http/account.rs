/*
[INPUT]:  API key and withdrawal parameters
[OUTPUT]: Account data (profile, fees, balances, deposit/withdrawal history)
[POS]:    HTTP layer - account endpoints (require x-api-key)
[UPDATE]: When adding new account endpoints or changing payloads
*/

// ### Account Endpoints

use rust_decimal::Decimal;

use crate::http::endpoints::{AccountEndpoints, EndpointSpec};
use crate::http::error::require_non_empty;
use crate::http::{Credentials, Result, WallexClient};
use crate::types::{ApiResponse, CryptoWithdrawalRequest, MoneyWithdrawalRequest};

/// Authenticated account facade
#[derive(Debug, Clone)]
pub struct AccountManage {
    client: WallexClient,
    endpoints: AccountEndpoints,
}

impl AccountManage {
    pub fn new(client: WallexClient, credentials: Credentials) -> Self {
        Self::with_endpoints(client, credentials, AccountEndpoints::default())
    }

    pub fn with_endpoints(
        client: WallexClient,
        credentials: Credentials,
        endpoints: AccountEndpoints,
    ) -> Self {
        Self {
            client: client.with_credentials(credentials),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &AccountEndpoints {
        &self.endpoints
    }

    async fn get(&self, spec: EndpointSpec) -> Result<ApiResponse> {
        self.client
            .request(spec.method, spec.path, Vec::new(), None, true)
            .await
    }

    /// GET v1/account/profile
    pub async fn get_profile(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.profile).await
    }

    /// GET v1/account/fee
    pub async fn get_fee(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.fee).await
    }

    /// GET v1/account/card-numbers
    pub async fn get_card_numbers(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.card_numbers).await
    }

    /// GET v1/account/ibans
    pub async fn get_ibans(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.ibans).await
    }

    /// GET v1/account/balances
    pub async fn get_balances(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.balances).await
    }

    /// Fiat deposit history
    pub async fn get_money_deposit(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.money_deposit).await
    }

    /// Fiat withdrawal history
    pub async fn get_money_withdrawal(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.money_withdrawal_history).await
    }

    /// Crypto deposit history
    pub async fn get_crypto_deposit(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.crypto_deposit).await
    }

    /// Crypto withdrawal history
    pub async fn get_crypto_withdrawal(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.crypto_withdrawal_history).await
    }

    /// Sub-account transfers
    pub async fn get_transfers(&self) -> Result<ApiResponse> {
        self.get(self.endpoints.transfers).await
    }

    /// Request a fiat withdrawal to a registered IBAN
    ///
    /// POST v1/account/money-withdrawal
    pub async fn set_money_withdrawal(&self, iban: u64, value: Decimal) -> Result<ApiResponse> {
        let body = serde_json::to_value(MoneyWithdrawalRequest { iban, value })?;
        let spec = self.endpoints.money_withdrawal;
        self.client
            .request(spec.method, spec.path, Vec::new(), Some(body), true)
            .await
    }

    /// Request a crypto withdrawal
    ///
    /// POST v1/account/crypto-withdrawal
    pub async fn set_crypto_withdrawal(&self, req: CryptoWithdrawalRequest) -> Result<ApiResponse> {
        require_non_empty("coin", &req.coin)?;
        require_non_empty("network", &req.network)?;
        require_non_empty("wallet_address", &req.wallet_address)?;

        let body = serde_json::to_value(&req)?;
        let spec = self.endpoints.crypto_withdrawal;
        self.client
            .request(spec.method, spec.path, Vec::new(), Some(body), true)
            .await
    }
}
