use rust_decimal::Decimal;

/// A ledger entry. Only `balance` ever changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,
    pub balance: Decimal,
}

impl Account {
    pub fn new(account_id: impl Into<String>, balance: Decimal) -> Self {
        Self { account_id: account_id.into(), balance }
    }
}

/// A request to move `amount` between two accounts; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub account_from_id: String,
    pub account_to_id: String,
    pub amount: Decimal,
}

impl Transfer {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: Decimal) -> Self {
        Self { account_from_id: from.into(), account_to_id: to.into(), amount }
    }
}
