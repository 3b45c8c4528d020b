//! 金额运算 (rust_decimal)
//!
//! All monetary arithmetic runs on `Decimal` internally and converts to
//! `f64` (2 decimal places, half-up) only at the storage/serialization
//! boundary. Handlers validate amounts here before anything reaches a
//! repository.

use rust_decimal::prelude::*;

use crate::utils::{AppError, AppResult};
use shared::models::{OrderItem, OrderItemStatus};

/// 金额统一保留两位小数
const DECIMAL_PLACES: u32 = 2;

/// 比较容差：差距不足一分钱视为相等
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed monetary amount (R$ 1,000,000) — prices, balances, movements
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i64 = 9999;

/// NaN / ±∞ 在任何金额字段里都是客户端错误
#[inline]
fn require_finite(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate an amount that may legally be zero (opening balance, discount,
/// service charge, price).
pub fn validate_non_negative_amount(value: f64, field: &str) -> AppResult<()> {
    require_finite(value, field)?;
    if value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::validation(format!(
            "{field} exceeds maximum allowed ({MAX_AMOUNT}), got {value}"
        )));
    }
    Ok(())
}

/// Validate an amount that must be strictly positive (deposit, withdraw,
/// drain).
pub fn validate_positive_amount(value: f64, field: &str) -> AppResult<()> {
    validate_non_negative_amount(value, field)?;
    if value <= 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(())
}

/// Validate a line item quantity
pub fn validate_quantity(quantity: i64, field: &str) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::validation(format!(
            "{field} must be positive, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "{field} exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}

/// f64 → Decimal。边界已经做过 `require_finite` 检查，真漏进来
/// 非有限值就记一条 error 并按零处理，不让它污染账目。
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite amount reached Decimal conversion, treating as zero");
        Decimal::ZERO
    })
}

/// Decimal → f64，半进位取两位小数，存储/序列化前的最后一步
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round a raw f64 amount to the canonical 2-decimal representation
#[inline]
pub fn round_money(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// 金额相等判断，容差见 [`MONEY_TOLERANCE`]
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

/// Compute an order total from its line items and adjustments.
///
/// Formula: `max(0, Σ(unit_price × quantity over non-canceled items)
/// − discount + service_charge)`. Canceled items contribute zero
/// regardless of quantity/price; an empty item list yields 0 (plus any
/// service charge). Deterministic and idempotent — same inputs, same
/// output, no matter how often it runs.
pub fn order_total(items: &[OrderItem], discount: f64, service_charge: f64) -> f64 {
    let items_sum: Decimal = items
        .iter()
        .filter(|i| i.status != OrderItemStatus::Canceled)
        .map(|i| to_decimal(i.unit_price) * Decimal::from(i.quantity))
        .sum();

    let total = items_sum - to_decimal(discount) + to_decimal(service_charge);
    to_f64(total.max(Decimal::ZERO))
}

/// Line total for a single item (unit_price × quantity)
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64(to_decimal(unit_price) * Decimal::from(quantity))
}
