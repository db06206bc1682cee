//! Transaction kinds and ledger entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atm_storage::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Adds the amount to the balance
    Deposit,
    /// Subtracts the amount from the balance
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A requested balance movement. `amount` is a magnitude; the kind gives
/// the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: i64,
}

impl Transaction {
    pub fn deposit(amount: i64) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            amount,
        }
    }

    pub fn withdrawal(amount: i64) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            amount,
        }
    }

    /// Delta applied to the balance
    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Deposit => self.amount,
            TransactionKind::Withdrawal => -self.amount,
        }
    }
}

/// One committed row of an account's log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account: Account,
    /// Signed delta that was applied to the balance
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn kind(&self) -> TransactionKind {
        if self.amount < 0 {
            TransactionKind::Withdrawal
        } else {
            TransactionKind::Deposit
        }
    }
}

/// Whether a withdrawal may take the balance below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdraftPolicy {
    /// Refuse any transaction that would leave a negative balance
    #[default]
    Reject,
    /// Let balances go negative
    Allow,
}

impl OverdraftPolicy {
    pub fn permits(&self, new_balance: i64) -> bool {
        match self {
            OverdraftPolicy::Reject => new_balance >= 0,
            OverdraftPolicy::Allow => true,
        }
    }
}
