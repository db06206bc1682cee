//! Ledger
//!
//! Credential lookup, balance queries and the balance-plus-log write path.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use atm_storage::{Account, Database, StorageError};

use crate::error::LedgerError;
use crate::transaction::{LedgerEntry, OverdraftPolicy, Transaction};
use crate::Result;

pub struct Ledger {
    db: Database,
    overdraft: OverdraftPolicy,
}

impl Ledger {
    pub fn new(db: Database, overdraft: OverdraftPolicy) -> Self {
        Self { db, overdraft }
    }

    /// Find the account a PIN belongs to (exact, plaintext match)
    pub fn resolve_account(&self, pin: &str) -> Result<Account> {
        let account = self.db.with_connection(|conn| {
            Ok(conn
                .query_row("SELECT id FROM users WHERE pin = ?1", [pin], |row| {
                    row.get::<_, Account>(0)
                })
                .optional()?)
        })?;

        account.ok_or(LedgerError::AuthenticationFailed)
    }

    /// Current committed balance of an account
    pub fn balance(&self, account: Account) -> Result<i64> {
        self.db
            .with_connection(|conn| read_balance(conn, account))?
            .ok_or(LedgerError::AccountNotFound(account))
    }

    /// Apply a deposit or withdrawal.
    ///
    /// The balance update and the log append run inside one IMMEDIATE
    /// transaction. On any failure both writes are rolled back, so the
    /// balance and the log for `account` look exactly as before the call.
    pub fn apply_transaction(&self, account: Account, tx: Transaction) -> Result<LedgerEntry> {
        if tx.amount < 0 {
            return Err(LedgerError::InvalidAmount(tx.amount));
        }

        let delta = tx.signed_amount();
        let overdraft = self.overdraft;
        let created_at = Utc::now();

        let result: Result<(LedgerEntry, i64)> = self.db.transaction_immediate(|conn| {
            let current =
                read_balance(conn, account)?.ok_or(LedgerError::AccountNotFound(account))?;

            let new_balance = current
                .checked_add(delta)
                .ok_or(LedgerError::InvalidAmount(tx.amount))?;

            if !overdraft.permits(new_balance) {
                return Err(LedgerError::InsufficientFunds {
                    account,
                    balance: current,
                    requested: tx.amount,
                });
            }

            write_balance(conn, account, new_balance)?;
            let id = append_entry(conn, account, delta, created_at)?;

            Ok((
                LedgerEntry {
                    id,
                    account,
                    amount: delta,
                    created_at,
                },
                new_balance,
            ))
        });

        match result {
            Ok((entry, new_balance)) => {
                tracing::info!(
                    account = %account,
                    kind = %tx.kind,
                    amount = tx.amount,
                    balance = new_balance,
                    entry_id = entry.id,
                    "Committed transaction"
                );
                Ok(entry)
            }
            Err(e) => {
                match &e {
                    LedgerError::Storage(err) => tracing::error!(
                        account = %account,
                        kind = %tx.kind,
                        amount = tx.amount,
                        error = %err,
                        "Transaction rolled back after storage failure"
                    ),
                    other => tracing::warn!(
                        account = %account,
                        kind = %tx.kind,
                        amount = tx.amount,
                        error = %other,
                        "Transaction rejected"
                    ),
                }
                Err(e)
            }
        }
    }

    pub fn deposit(&self, account: Account, amount: i64) -> Result<LedgerEntry> {
        self.apply_transaction(account, Transaction::deposit(amount))
    }

    pub fn withdraw(&self, account: Account, amount: i64) -> Result<LedgerEntry> {
        self.apply_transaction(account, Transaction::withdrawal(amount))
    }

    /// Committed log entries of an account, oldest first
    pub fn transactions(&self, account: Account) -> Result<Vec<LedgerEntry>> {
        let entries = self.db.with_connection(|conn| {
            if read_balance(conn, account)?.is_none() {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT id, user_id, amount, created_at FROM transactions
                 WHERE user_id = ?1 ORDER BY id",
            )?;

            let entries: Vec<LedgerEntry> = stmt
                .query_map([account], |row| {
                    let created_str: String = row.get(3)?;
                    let created_at = DateTime::parse_from_rfc3339(&created_str)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?;

                    Ok(LedgerEntry {
                        id: row.get(0)?,
                        account: row.get(1)?,
                        amount: row.get(2)?,
                        created_at,
                    })
                })?
                .collect::<rusqlite::Result<_>>()?;

            Ok(Some(entries))
        })?;

        entries.ok_or(LedgerError::AccountNotFound(account))
    }

    /// Provision an account with a PIN and starting balance.
    ///
    /// Accounts are normally created out-of-band; this exists for seeding
    /// and tests.
    pub fn open_account(&self, pin: &str, initial_balance: i64) -> Result<Account> {
        let inserted = self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO users (pin, balance) VALUES (?1, ?2)",
                rusqlite::params![pin, initial_balance],
            )?;
            Ok(Account::new(conn.last_insert_rowid()))
        });

        match inserted {
            Ok(account) => {
                tracing::info!(account = %account, balance = initial_balance, "Opened account");
                Ok(account)
            }
            Err(e) if e.is_unique_violation() => Err(LedgerError::DuplicateCredential),
            Err(e) => Err(e.into()),
        }
    }
}

impl Clone for Ledger {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            overdraft: self.overdraft,
        }
    }
}

fn read_balance(conn: &Connection, account: Account) -> atm_storage::Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT balance FROM users WHERE id = ?1", [account], |row| {
            row.get(0)
        })
        .optional()?)
}

fn write_balance(conn: &Connection, account: Account, balance: i64) -> atm_storage::Result<()> {
    let updated = conn.execute(
        "UPDATE users SET balance = ?1 WHERE id = ?2",
        rusqlite::params![balance, account],
    )?;

    if updated != 1 {
        return Err(StorageError::Sqlite(rusqlite::Error::StatementChangedRows(
            updated,
        )));
    }
    Ok(())
}

fn append_entry(
    conn: &Connection,
    account: Account,
    amount: i64,
    created_at: DateTime<Utc>,
) -> atm_storage::Result<i64> {
    conn.execute(
        "INSERT INTO transactions (user_id, amount, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![account, amount, created_at.to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}
