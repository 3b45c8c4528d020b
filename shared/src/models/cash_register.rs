//! Cash Register Model (收银机 / 现金流水)

use serde::{Deserialize, Serialize};

/// Register status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

impl Default for RegisterStatus {
    fn default() -> Self {
        Self::Closed
    }
}

/// Cash movement kinds recorded in the ledger
///
/// Sign convention: `open`/`deposit` add, `close` sets the declared
/// closing balance, `withdraw`/`drain` subtract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CashTransactionKind {
    Open,
    Close,
    Deposit,
    Withdraw,
    Drain,
}

impl CashTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Drain => "drain",
        }
    }
}

/// Cash register entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: i64,
    /// Human identifier ("Caixa 1"), unique
    pub identifier: String,
    pub status: RegisterStatus,
    /// Running balance; only the ledger operations mutate this
    pub current_balance: f64,
    pub opened_by: Option<i64>,
    pub opened_at: Option<i64>,
    pub closed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Immutable ledger entry — one per successful register operation
///
/// Invariant: `new_balance = previous_balance ± amount` per the kind's
/// sign convention. Entries are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CashTransaction {
    pub id: i64,
    pub register_id: i64,
    pub kind: CashTransactionKind,
    pub amount: f64,
    pub previous_balance: f64,
    pub new_balance: f64,
    /// Where drained cash went (safe, bank); drains only
    pub destination: Option<String>,
    pub description: Option<String>,
    pub user_id: i64,
    /// Operator name snapshot at transaction time
    pub user_name: String,
    pub created_at: i64,
}

/// Create register payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegisterCreate {
    pub identifier: String,
}

/// Open register payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegisterOpen {
    pub opening_balance: f64,
}

/// Close register payload
///
/// `cash_count` is the physically counted amount; when present and it
/// disagrees with the computed balance a discrepancy alert is raised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRegisterClose {
    pub closing_balance: f64,
    pub cash_count: Option<f64>,
}

/// Deposit / withdraw payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashMovement {
    pub amount: f64,
    pub description: Option<String>,
}

/// Drain payload (sangria)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashDrain {
    pub amount: f64,
    pub destination: String,
}
