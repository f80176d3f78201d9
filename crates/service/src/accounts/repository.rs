use async_trait::async_trait;
use rust_decimal::Decimal;

use super::domain::Account;
use crate::errors::ServiceError;

/// Storage abstraction for ledger accounts.
///
/// Implementations must make `create_account` an atomic insert-if-absent and
/// make `transfer_amount` appear as a single step to every other operation
/// touching either account.
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    /// Insert the account unless its id is taken; an existing entry is left untouched.
    async fn create_account(&self, account: Account) -> Result<(), ServiceError>;

    /// Snapshot of the current record, if any.
    async fn get_account(&self, account_id: &str) -> Option<Account>;

    /// Move `amount` from one account to another, or change nothing.
    async fn transfer_amount(&self, from_id: &str, to_id: &str, amount: Decimal) -> Result<(), ServiceError>;

    async fn clear_accounts(&self);

    async fn account_count(&self) -> usize;
}
