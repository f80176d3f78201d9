use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

use super::domain::Account;
use super::repository::AccountsRepository;
use crate::errors::ServiceError;

type Slot = Arc<Mutex<Account>>;

/// Process-local account store.
///
/// The map only guards membership. Each record sits behind its own mutex, and
/// a transfer locks its two records in ascending id order, so transfers over
/// disjoint pairs run in parallel and opposite-direction transfers over the
/// same pair cannot deadlock.
#[derive(Default)]
pub struct InMemoryAccountsRepository {
    accounts: DashMap<String, Slot>,
}

impl InMemoryAccountsRepository {
    pub fn new() -> Self { Self::default() }

    // Clone the Arc out so no shard guard is held across an await.
    fn slot(&self, account_id: &str) -> Option<Slot> {
        self.accounts.get(account_id).map(|e| Arc::clone(e.value()))
    }
}

#[async_trait]
impl AccountsRepository for InMemoryAccountsRepository {
    async fn create_account(&self, account: Account) -> Result<(), ServiceError> {
        match self.accounts.entry(account.account_id.clone()) {
            Entry::Occupied(e) => Err(ServiceError::DuplicateKey(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(Arc::new(Mutex::new(account)));
                Ok(())
            }
        }
    }

    async fn get_account(&self, account_id: &str) -> Option<Account> {
        let slot = self.slot(account_id)?;
        let account = slot.lock().await.clone();
        Some(account)
    }

    async fn transfer_amount(&self, from_id: &str, to_id: &str, amount: Decimal) -> Result<(), ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::validation("transfer amount must be positive"));
        }
        if from_id == to_id {
            return Err(ServiceError::validation("source and destination accounts must differ"));
        }

        let from_slot = self
            .slot(from_id)
            .ok_or_else(|| ServiceError::AccountNotFound(from_id.to_string()))?;
        let to_slot = self
            .slot(to_id)
            .ok_or_else(|| ServiceError::AccountNotFound(to_id.to_string()))?;

        let (mut from, mut to) = if from_id < to_id {
            let from = from_slot.lock().await;
            let to = to_slot.lock().await;
            (from, to)
        } else {
            let to = to_slot.lock().await;
            let from = from_slot.lock().await;
            (from, to)
        };

        let new_from_balance = from
            .balance
            .checked_sub(amount)
            .filter(|b| *b >= Decimal::ZERO)
            .ok_or_else(|| ServiceError::InsufficientFunds(from_id.to_string()))?;
        let new_to_balance = to
            .balance
            .checked_add(amount)
            .ok_or_else(|| ServiceError::validation(format!("balance of {to_id} would overflow")))?;

        from.balance = new_from_balance;
        to.balance = new_to_balance;
        debug!(from = %from_id, to = %to_id, %amount, "balances updated");
        Ok(())
    }

    async fn clear_accounts(&self) {
        self.accounts.clear();
    }

    async fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    async fn seeded(pairs: &[(&str, Decimal)]) -> Result<Arc<InMemoryAccountsRepository>, ServiceError> {
        let repo = Arc::new(InMemoryAccountsRepository::new());
        for (id, balance) in pairs {
            repo.create_account(Account::new(*id, *balance)).await?;
        }
        Ok(repo)
    }

    async fn balance(repo: &InMemoryAccountsRepository, id: &str) -> Option<Decimal> {
        repo.get_account(id).await.map(|a| a.balance)
    }

    #[tokio::test]
    async fn create_then_get() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("Id-123", dec!(1000))]).await?;
        let account = repo.get_account("Id-123").await;
        assert_eq!(account, Some(Account::new("Id-123", dec!(1000))));
        assert_eq!(repo.get_account("missing").await, None);
        assert_eq!(repo.account_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_create_keeps_existing_entry() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("Id-123", dec!(1000))]).await?;
        let err = repo.create_account(Account::new("Id-123", dec!(5))).await;
        assert_eq!(err, Err(ServiceError::DuplicateKey("Id-123".into())));
        assert_eq!(balance(&repo, "Id-123").await, Some(dec!(1000)));
        Ok(())
    }

    #[tokio::test]
    async fn transfer_moves_funds() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("a", dec!(50)), ("b", dec!(50))]).await?;
        repo.transfer_amount("a", "b", dec!(20)).await?;
        assert_eq!(balance(&repo, "a").await, Some(dec!(30)));
        assert_eq!(balance(&repo, "b").await, Some(dec!(70)));
        Ok(())
    }

    #[tokio::test]
    async fn transfer_may_drain_account_to_zero() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("a", dec!(12.34)), ("b", dec!(0))]).await?;
        repo.transfer_amount("a", "b", dec!(12.34)).await?;
        assert_eq!(balance(&repo, "a").await, Some(dec!(0)));
        assert_eq!(balance(&repo, "b").await, Some(dec!(12.34)));
        Ok(())
    }

    #[tokio::test]
    async fn overdraft_is_rejected_without_mutation() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("a", dec!(50)), ("b", dec!(50))]).await?;
        let err = repo.transfer_amount("a", "b", dec!(60)).await;
        assert_eq!(err, Err(ServiceError::InsufficientFunds("a".into())));
        assert_eq!(balance(&repo, "a").await, Some(dec!(50)));
        assert_eq!(balance(&repo, "b").await, Some(dec!(50)));
        Ok(())
    }

    #[tokio::test]
    async fn missing_accounts_are_named() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("present", dec!(50))]).await?;

        let err = repo.transfer_amount("ghost", "present", dec!(20)).await;
        assert_eq!(err, Err(ServiceError::AccountNotFound("ghost".into())));

        let err = repo.transfer_amount("present", "ghost", dec!(20)).await;
        assert_eq!(err, Err(ServiceError::AccountNotFound("ghost".into())));

        assert_eq!(balance(&repo, "present").await, Some(dec!(50)));
        Ok(())
    }

    #[tokio::test]
    async fn non_positive_and_self_transfers_are_rejected() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("a", dec!(50)), ("b", dec!(50))]).await?;
        for amount in [dec!(0), dec!(-20)] {
            let err = repo.transfer_amount("a", "b", amount).await;
            assert!(matches!(err, Err(ServiceError::Validation(_))));
        }
        let err = repo.transfer_amount("a", "a", dec!(10)).await;
        assert!(matches!(err, Err(ServiceError::Validation(_))));
        assert_eq!(balance(&repo, "a").await, Some(dec!(50)));
        assert_eq!(balance(&repo, "b").await, Some(dec!(50)));
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_everything() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("a", dec!(1)), ("b", dec!(2))]).await?;
        repo.clear_accounts().await;
        assert_eq!(repo.account_count().await, 0);
        assert_eq!(repo.get_account("a").await, None);
        repo.create_account(Account::new("a", dec!(3))).await?;
        assert_eq!(balance(&repo, "a").await, Some(dec!(3)));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_create_has_one_winner() -> Result<(), anyhow::Error> {
        for round in 0..200 {
            let repo = Arc::new(InMemoryAccountsRepository::new());
            let id = format!("race-{round}");
            let handles: Vec<_> = (0..2i64)
                .map(|i| {
                    let repo = Arc::clone(&repo);
                    let id = id.clone();
                    tokio::spawn(async move { repo.create_account(Account::new(id, Decimal::from(i))).await })
                })
                .collect();

            let mut ok = 0;
            let mut dup = 0;
            for h in handles {
                match h.await? {
                    Ok(()) => ok += 1,
                    Err(ServiceError::DuplicateKey(_)) => dup += 1,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!((ok, dup), (1, 1));
            assert_eq!(repo.account_count().await, 1);
        }
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn opposite_transfers_neither_deadlock_nor_lose_updates() -> Result<(), anyhow::Error> {
        let repo = seeded(&[("A", dec!(100)), ("B", dec!(100))]).await?;

        let mut handles = Vec::new();
        for _ in 0..500 {
            let r1 = Arc::clone(&repo);
            handles.push(tokio::spawn(async move { r1.transfer_amount("A", "B", dec!(10)).await }));
            let r2 = Arc::clone(&repo);
            handles.push(tokio::spawn(async move { r2.transfer_amount("B", "A", dec!(10)).await }));
        }

        let joined = tokio::time::timeout(Duration::from_secs(10), async {
            for h in handles {
                h.await??;
            }
            Ok::<_, anyhow::Error>(())
        })
        .await;
        assert!(joined.is_ok(), "transfers did not finish; possible deadlock");
        joined??;

        assert_eq!(balance(&repo, "A").await, Some(dec!(100)));
        assert_eq!(balance(&repo, "B").await, Some(dec!(100)));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_transfers_conserve_funds_and_stay_non_negative() -> Result<(), anyhow::Error> {
        let ids = ["acc-0", "acc-1", "acc-2", "acc-3"];
        let repo = seeded(&[
            (ids[0], dec!(40)),
            (ids[1], dec!(5)),
            (ids[2], dec!(0)),
            (ids[3], dec!(17.5)),
        ])
        .await?;
        let total_before = dec!(62.5);

        let mut handles = Vec::new();
        for i in 0..800usize {
            let repo = Arc::clone(&repo);
            let from = ids[i % ids.len()];
            let to = ids[(i * 7 + 1) % ids.len()];
            let amount = Decimal::from((i % 9) as u32 + 1) / dec!(2);
            handles.push(tokio::spawn(async move {
                // overdrafts and self-transfers are expected here
                let _ = repo.transfer_amount(from, to, amount).await;
            }));
        }
        for h in handles {
            h.await?;
        }

        let mut total_after = Decimal::ZERO;
        for id in ids {
            let b = balance(&repo, id).await.unwrap_or_default();
            assert!(b >= Decimal::ZERO, "{id} went negative: {b}");
            total_after += b;
        }
        assert_eq!(total_after, total_before);
        Ok(())
    }
}
