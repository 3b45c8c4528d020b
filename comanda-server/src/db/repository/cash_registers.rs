//! Cash Registers Repository
//!
//! Per-register ledger. Every successful operation runs in one SQL
//! transaction: a guarded UPDATE on the register row plus exactly one
//! immutable row in `cash_transactions` recording the before/after
//! balances. Balance arithmetic happens on `Decimal` in Rust; the UPDATE
//! carries an optimistic guard on the previous balance so concurrent
//! operations on the same register serialize instead of compounding.

use super::{RepoError, RepoResult};
use crate::money;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use rust_decimal::Decimal;
use shared::models::{CashRegister, CashTransaction, CashTransactionKind, RegisterStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const REGISTER_COLUMNS: &str = "id, identifier, status, current_balance, opened_by, opened_at, closed_at, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, register_id, kind, amount, previous_balance, new_balance, destination, description, user_id, user_name, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<CashRegister>> {
    let register = sqlx::query_as::<_, CashRegister>(&format!(
        "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(register)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<CashRegister>> {
    let registers = sqlx::query_as::<_, CashRegister>(&format!(
        "SELECT {REGISTER_COLUMNS} FROM cash_registers ORDER BY identifier"
    ))
    .fetch_all(pool)
    .await?;
    Ok(registers)
}

pub async fn create(pool: &SqlitePool, identifier: &str) -> RepoResult<CashRegister> {
    validate_required_text(identifier, "identifier", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO cash_registers (id, identifier, status, current_balance, created_at, updated_at) VALUES (?, ?, 'closed', 0, ?, ?)",
    )
    .bind(id)
    .bind(identifier.trim())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create cash register".into()))
}

/// Ledger history, newest first, bounded to a millisecond window
pub async fn find_transactions(
    pool: &SqlitePool,
    register_id: i64,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<CashTransaction>> {
    let transactions = sqlx::query_as::<_, CashTransaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM cash_transactions WHERE register_id = ? AND created_at >= ? AND created_at < ? ORDER BY created_at DESC"
    ))
    .bind(register_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;
    Ok(transactions)
}

/// `closed → open`; the opening balance becomes the current balance
pub async fn open_register(
    pool: &SqlitePool,
    id: i64,
    opening_balance: f64,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    money::validate_non_negative_amount(opening_balance, "opening_balance")
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let register = lock_register(&mut tx, id).await?;
    if register.status != RegisterStatus::Closed {
        return Err(RepoError::State(format!(
            "Register {id} is already open"
        )));
    }

    let new_balance = money::round_money(opening_balance);

    let rows = sqlx::query(
        "UPDATE cash_registers SET status = 'open', current_balance = ?, opened_by = ?, opened_at = ?, closed_at = NULL, updated_at = ? WHERE id = ? AND status = 'closed'",
    )
    .bind(new_balance)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::State(format!(
            "Register {id} was modified concurrently, retry"
        )));
    }

    let transaction = append_transaction(
        &mut tx,
        TransactionRecord {
            register_id: id,
            kind: CashTransactionKind::Open,
            amount: new_balance,
            previous_balance: register.current_balance,
            new_balance,
            destination: None,
            description: None,
            user_id,
            user_name,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;
    refreshed(pool, id, transaction).await
}

/// `open → closed`; `closing_balance` is the declared amount left in the
/// drawer. The transaction row keeps the computed balance as
/// `previous_balance`, so a discrepancy against a physical count is
/// recoverable from the ledger alone.
pub async fn close_register(
    pool: &SqlitePool,
    id: i64,
    closing_balance: f64,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    money::validate_non_negative_amount(closing_balance, "closing_balance")
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let register = lock_register(&mut tx, id).await?;
    if register.status != RegisterStatus::Open {
        return Err(RepoError::State(format!(
            "Register {id} is not open"
        )));
    }

    let declared = money::round_money(closing_balance);

    let rows = sqlx::query(
        "UPDATE cash_registers SET status = 'closed', current_balance = ?, closed_at = ?, updated_at = ? WHERE id = ? AND status = 'open' AND current_balance = ?",
    )
    .bind(declared)
    .bind(now)
    .bind(now)
    .bind(id)
    .bind(register.current_balance)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::State(format!(
            "Register {id} was modified concurrently, retry"
        )));
    }

    let transaction = append_transaction(
        &mut tx,
        TransactionRecord {
            register_id: id,
            kind: CashTransactionKind::Close,
            amount: declared,
            previous_balance: register.current_balance,
            new_balance: declared,
            destination: None,
            description: None,
            user_id,
            user_name,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;
    refreshed(pool, id, transaction).await
}

/// Add cash to an open register
pub async fn deposit(
    pool: &SqlitePool,
    id: i64,
    amount: f64,
    description: Option<String>,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    apply_movement(
        pool,
        id,
        CashTransactionKind::Deposit,
        amount,
        None,
        description,
        user_id,
        user_name,
    )
    .await
}

/// Take cash out of an open register (petty cash, change runs)
pub async fn withdraw(
    pool: &SqlitePool,
    id: i64,
    amount: f64,
    description: Option<String>,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    apply_movement(
        pool,
        id,
        CashTransactionKind::Withdraw,
        amount,
        None,
        description,
        user_id,
        user_name,
    )
    .await
}

/// Move large bills out of the drawer to a named destination (safe, bank)
pub async fn drain(
    pool: &SqlitePool,
    id: i64,
    amount: f64,
    destination: &str,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    validate_required_text(destination, "destination", MAX_SHORT_TEXT_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    apply_movement(
        pool,
        id,
        CashTransactionKind::Drain,
        amount,
        Some(destination.trim().to_string()),
        None,
        user_id,
        user_name,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn apply_movement(
    pool: &SqlitePool,
    id: i64,
    kind: CashTransactionKind,
    amount: f64,
    destination: Option<String>,
    description: Option<String>,
    user_id: i64,
    user_name: &str,
) -> RepoResult<(CashRegister, CashTransaction)> {
    money::validate_positive_amount(amount, "amount")
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_optional_text(&description, "description", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let register = lock_register(&mut tx, id).await?;
    if register.status != RegisterStatus::Open {
        return Err(RepoError::State(format!(
            "Register {id} is not open"
        )));
    }

    let amount = money::round_money(amount);
    let previous = money::to_decimal(register.current_balance);
    let delta = money::to_decimal(amount);

    let new_balance = match kind {
        CashTransactionKind::Deposit => previous + delta,
        CashTransactionKind::Withdraw | CashTransactionKind::Drain => {
            if delta > previous {
                return Err(RepoError::State(format!(
                    "Insufficient balance: register {id} holds {:.2}, requested {amount:.2}",
                    register.current_balance
                )));
            }
            previous - delta
        }
        // open/close never reach apply_movement
        CashTransactionKind::Open | CashTransactionKind::Close => {
            return Err(RepoError::Validation(format!(
                "{} is not a cash movement",
                kind.as_str()
            )));
        }
    };
    let new_balance = money::to_f64(new_balance.max(Decimal::ZERO));

    let rows = sqlx::query(
        "UPDATE cash_registers SET current_balance = ?, updated_at = ? WHERE id = ? AND status = 'open' AND current_balance = ? AND current_balance >= ?",
    )
    .bind(new_balance)
    .bind(now)
    .bind(id)
    .bind(register.current_balance)
    .bind(amount_floor(kind, amount))
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::State(format!(
            "Register {id} was modified concurrently, retry"
        )));
    }

    let transaction = append_transaction(
        &mut tx,
        TransactionRecord {
            register_id: id,
            kind,
            amount,
            previous_balance: register.current_balance,
            new_balance,
            destination,
            description,
            user_id,
            user_name,
            created_at: now,
        },
    )
    .await?;

    tx.commit().await?;
    refreshed(pool, id, transaction).await
}

/// Subtracting movements require the stored balance to cover the amount;
/// additive ones only need the row to still exist as read.
fn amount_floor(kind: CashTransactionKind, amount: f64) -> f64 {
    match kind {
        CashTransactionKind::Withdraw | CashTransactionKind::Drain => amount,
        _ => 0.0,
    }
}

/// Read the register inside the transaction for validation and the
/// optimistic balance guard
async fn lock_register(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: i64,
) -> RepoResult<CashRegister> {
    let register = sqlx::query_as::<_, CashRegister>(&format!(
        "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    register.ok_or_else(|| RepoError::NotFound(format!("Register {id} not found")))
}

struct TransactionRecord<'a> {
    register_id: i64,
    kind: CashTransactionKind,
    amount: f64,
    previous_balance: f64,
    new_balance: f64,
    destination: Option<String>,
    description: Option<String>,
    user_id: i64,
    user_name: &'a str,
    created_at: i64,
}

async fn append_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    record: TransactionRecord<'_>,
) -> RepoResult<CashTransaction> {
    let id = snowflake_id();
    sqlx::query(
        "INSERT INTO cash_transactions (id, register_id, kind, amount, previous_balance, new_balance, destination, description, user_id, user_name, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(record.register_id)
    .bind(record.kind.as_str())
    .bind(record.amount)
    .bind(record.previous_balance)
    .bind(record.new_balance)
    .bind(&record.destination)
    .bind(&record.description)
    .bind(record.user_id)
    .bind(record.user_name)
    .bind(record.created_at)
    .execute(&mut **tx)
    .await?;

    let transaction = sqlx::query_as::<_, CashTransaction>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM cash_transactions WHERE id = ?"
    ))
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(transaction)
}

async fn refreshed(
    pool: &SqlitePool,
    id: i64,
    transaction: CashTransaction,
) -> RepoResult<(CashRegister, CashTransaction)> {
    let register = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Register {id} not found")))?;
    Ok((register, transaction))
}

/// Registers currently open (close-of-day sweep in the detailed health view)
pub async fn count_open(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM cash_registers WHERE status = 'open'",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
