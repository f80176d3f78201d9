use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::accounts::{Account, AccountsService, Transfer};
use service::errors::ServiceError;
use tracing::info;

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub accounts: AccountsService,
}

/// Body of `POST /v1/accounts`. Fields are optional so a missing one is
/// reported as a validation error instead of a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    pub account_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub balance: Option<Decimal>,
}

impl CreateAccountInput {
    pub fn into_account(self) -> Result<Account, ServiceError> {
        let account_id = required_id(self.account_id, "accountId")?;
        let balance = self.balance.ok_or_else(|| ServiceError::validation("balance is required"))?;
        if balance < Decimal::ZERO {
            return Err(ServiceError::validation("balance must be non-negative"));
        }
        Ok(Account::new(account_id, balance))
    }
}

/// Body of `POST /v1/accounts/transfer`. `amount` may be a JSON number or a numeric string;
/// numbers are read digit for digit, never through `f64`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInput {
    pub account_from_id: Option<String>,
    pub account_to_id: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub amount: Option<Decimal>,
}

impl TransferInput {
    pub fn into_transfer(self) -> Result<Transfer, ServiceError> {
        let from = required_id(self.account_from_id, "accountFromId")?;
        let to = required_id(self.account_to_id, "accountToId")?;
        let amount = self.amount.ok_or_else(|| ServiceError::validation("amount is required"))?;
        Ok(Transfer::new(from, to, amount))
    }
}

fn required_id(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{field} must not be empty"))),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutput {
    pub account_id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

// Trailing zeros are dropped so `50.00` renders as `50`.
impl From<Account> for AccountOutput {
    fn from(a: Account) -> Self {
        Self { account_id: a.account_id, balance: a.balance.normalize() }
    }
}

pub async fn create_account(
    State(state): State<ServerState>,
    payload: Result<Json<CreateAccountInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(input) = payload?;
    let account = input.into_account()?;
    info!(account_id = %account.account_id, "create_account_request");
    state.accounts.create_account(account).await?;
    Ok(StatusCode::CREATED)
}

pub async fn get_account(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<AccountOutput>, ApiError> {
    match state.accounts.get_account(&id).await {
        Some(account) => Ok(Json(account.into())),
        None => Err(ApiError::not_found(&id)),
    }
}

pub async fn transfer_amount(
    State(state): State<ServerState>,
    payload: Result<Json<TransferInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(input) = payload?;
    let transfer = input.into_transfer()?;
    state.accounts.transfer(transfer).await?;
    Ok(StatusCode::ACCEPTED)
}
