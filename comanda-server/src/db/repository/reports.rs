//! Reports Repository
//!
//! On-demand aggregation over settled orders. Nothing here is persisted;
//! every call recomputes from the order rows.

use super::RepoResult;
use crate::money;
use shared::models::PaymentMethodBreakdown;
use sqlx::SqlitePool;

/// Raw sales aggregates, before the handler attaches the echoed date range
#[derive(Debug, Clone, Default)]
pub struct SalesAggregate {
    pub order_count: i64,
    pub gross_revenue: f64,
    pub discount_total: f64,
    pub service_charge_total: f64,
    pub payment_breakdowns: Vec<PaymentMethodBreakdown>,
}

/// Aggregate closed+paid orders settled (`closed_at`) inside `[start, end)`.
///
/// Revenue is attributed to the settlement day, not the day the table was
/// opened.
pub async fn sales_aggregate(
    pool: &SqlitePool,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<SalesAggregate> {
    let (order_count, revenue, discount, service_charge) =
        sqlx::query_as::<_, (i64, f64, f64, f64)>(
            "SELECT COUNT(*), COALESCE(SUM(total), 0.0), COALESCE(SUM(discount), 0.0), COALESCE(SUM(service_charge), 0.0) \
             FROM orders WHERE status = 'closed' AND payment_status = 'paid' AND closed_at >= ? AND closed_at < ?",
        )
        .bind(start_millis)
        .bind(end_millis)
        .fetch_one(pool)
        .await?;

    let breakdowns = sqlx::query_as::<_, PaymentMethodBreakdown>(
        "SELECT payment_method AS method, COALESCE(SUM(total), 0) AS amount, COUNT(*) AS count \
         FROM orders WHERE status = 'closed' AND payment_status = 'paid' AND closed_at >= ? AND closed_at < ? \
         GROUP BY payment_method ORDER BY amount DESC",
    )
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;

    Ok(SalesAggregate {
        order_count,
        gross_revenue: money::round_money(revenue),
        discount_total: money::round_money(discount),
        service_charge_total: money::round_money(service_charge),
        payment_breakdowns: breakdowns
            .into_iter()
            .map(|mut b| {
                b.amount = money::round_money(b.amount);
                b
            })
            .collect(),
    })
}
