use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::domain::{Account, Transfer};
use super::repository::AccountsRepository;
use crate::errors::ServiceError;
use crate::observability::{ACCOUNTS_CREATED_TOTAL, TRANSFERS_REJECTED_TOTAL, TRANSFERS_TOTAL};

/// Ledger business service independent of web framework
#[derive(Clone)]
pub struct AccountsService {
    repo: Arc<dyn AccountsRepository>,
    min_transfer_amount: Decimal,
}

impl AccountsService {
    pub fn new(repo: Arc<dyn AccountsRepository>) -> Self {
        Self { repo, min_transfer_amount: Decimal::ONE }
    }

    pub fn with_min_transfer_amount(mut self, min: Decimal) -> Self {
        self.min_transfer_amount = min;
        self
    }

    pub fn min_transfer_amount(&self) -> Decimal { self.min_transfer_amount }

    pub fn repository(&self) -> &Arc<dyn AccountsRepository> { &self.repo }

    /// Open a new account with a non-negative starting balance.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use rust_decimal_macros::dec;
    /// use service::accounts::{Account, AccountsService, InMemoryAccountsRepository};
    /// let svc = AccountsService::new(Arc::new(InMemoryAccountsRepository::new()));
    /// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    /// rt.block_on(svc.create_account(Account::new("Id-123", dec!(1000)))).unwrap();
    /// let account = rt.block_on(svc.get_account("Id-123")).unwrap();
    /// assert_eq!(account.balance, dec!(1000));
    /// ```
    #[instrument(skip(self, account), fields(account_id = %account.account_id))]
    pub async fn create_account(&self, account: Account) -> Result<(), ServiceError> {
        if account.account_id.trim().is_empty() {
            return Err(ServiceError::validation("accountId must not be empty"));
        }
        if account.balance < Decimal::ZERO {
            return Err(ServiceError::validation("initial balance must be non-negative"));
        }

        let balance = account.balance;
        self.repo.create_account(account).await?;
        ACCOUNTS_CREATED_TOTAL.inc();
        info!(event = "account_created", %balance, "account_created");
        Ok(())
    }

    pub async fn get_account(&self, account_id: &str) -> Option<Account> {
        self.repo.get_account(account_id).await
    }

    #[instrument(
        skip(self, transfer),
        fields(from = %transfer.account_from_id, to = %transfer.account_to_id, amount = %transfer.amount)
    )]
    pub async fn transfer(&self, transfer: Transfer) -> Result<(), ServiceError> {
        let result = self.apply_transfer(&transfer).await;
        match &result {
            Ok(()) => {
                TRANSFERS_TOTAL.inc();
                info!(event = "transfer_completed", "transfer_completed");
            }
            Err(e) => {
                TRANSFERS_REJECTED_TOTAL.with_label_values(&[e.code()]).inc();
                warn!(event = "transfer_rejected", reason = e.code(), error = %e, "transfer_rejected");
            }
        }
        result
    }

    async fn apply_transfer(&self, transfer: &Transfer) -> Result<(), ServiceError> {
        if transfer.account_from_id.trim().is_empty() || transfer.account_to_id.trim().is_empty() {
            return Err(ServiceError::validation("accountFromId and accountToId must not be empty"));
        }
        if transfer.amount < self.min_transfer_amount {
            return Err(ServiceError::validation(format!(
                "amount must be at least {}",
                self.min_transfer_amount
            )));
        }
        self.repo
            .transfer_amount(&transfer.account_from_id, &transfer.account_to_id, transfer.amount)
            .await
    }
}
