//! Orders Repository
//!
//! Order lifecycle plus line items. Every mutation here funnels through
//! [`recalculate_total`] before returning, so `orders.total` always equals
//! the canonical formula over the current item rows.

use super::{RepoError, RepoResult};
use crate::money;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::models::{
    Order, OrderDetail, OrderItem, OrderItemCreate, OrderItemStatus, OrderStatus, PaymentMethod,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "id, table_id, waiter_id, status, total, discount, service_charge, payment_method, payment_status, notes, created_at, updated_at, closed_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price, status, notes, preparation_start_time, delivery_time, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order =
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(order)
}

/// Order with its items, as served by `GET /api/orders/{id}`
pub async fn find_detail(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderDetail>> {
    let Some(order) = find_by_id(pool, id).await? else {
        return Ok(None);
    };
    let items = find_items(pool, id).await?;
    Ok(Some(OrderDetail { order, items }))
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    table_id: Option<i64>,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<Order>> {
    let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if table_id.is_some() {
        sql.push_str(" AND table_id = ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query_as::<_, Order>(&sql);
    if let Some(s) = status {
        query = query.bind(s.as_str());
    }
    if let Some(t) = table_id {
        query = query.bind(t);
    }
    let orders = query.bind(limit).bind(offset).fetch_all(pool).await?;
    Ok(orders)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY created_at"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn find_item(pool: &SqlitePool, item_id: i64) -> RepoResult<Option<OrderItem>> {
    let item = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE id = ?"
    ))
    .bind(item_id)
    .fetch_optional(pool)
    .await?;
    Ok(item)
}

/// Open orders worth at least `min_total`, created at or after `created_after`
/// (high-value monitor scan)
pub async fn find_high_value_open(
    pool: &SqlitePool,
    min_total: f64,
    created_after: i64,
) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE status = 'open' AND total >= ? AND created_at >= ?"
    ))
    .bind(min_total)
    .bind(created_after)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Add a line item to an open order, snapshotting the product name and
/// price in the same statement. The `INSERT ... SELECT` only matches when
/// the product is orderable and the order is still open, so a concurrent
/// close cannot slip an item into a settled order.
pub async fn add_item(
    pool: &SqlitePool,
    order_id: i64,
    data: OrderItemCreate,
) -> RepoResult<(Order, OrderItem)> {
    money::validate_quantity(data.quantity, "quantity")
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_optional_text(&data.notes, "notes", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let item_id = snowflake_id();

    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price, status, notes, created_at, updated_at) \
         SELECT ?, ?, p.id, p.name, ?, p.price, 'pending', ?, ?, ? \
         FROM products p \
         WHERE p.id = ? AND p.is_active = 1 AND p.is_available = 1 \
           AND EXISTS (SELECT 1 FROM orders o WHERE o.id = ? AND o.status = 'open')",
    )
    .bind(item_id)
    .bind(order_id)
    .bind(data.quantity)
    .bind(&data.notes)
    .bind(now)
    .bind(now)
    .bind(data.product_id)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        return Err(diagnose_add_item_failure(pool, order_id, data.product_id).await?);
    }

    recalculate_total(&mut *tx, order_id).await?;
    tx.commit().await?;

    let order = find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;
    let item = find_item(pool, item_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order item".into()))?;
    Ok((order, item))
}

/// Work out why the guarded item insert matched nothing
async fn diagnose_add_item_failure(
    pool: &SqlitePool,
    order_id: i64,
    product_id: i64,
) -> RepoResult<RepoError> {
    match find_by_id(pool, order_id).await? {
        None => return Ok(RepoError::NotFound(format!("Order {order_id} not found"))),
        Some(o) if o.status != OrderStatus::Open => {
            return Ok(RepoError::State(format!(
                "Order {order_id} is {}, items can only be added to open orders",
                o.status.as_str()
            )));
        }
        Some(_) => {}
    }

    let product = sqlx::query_as::<_, (bool, bool)>(
        "SELECT is_active, is_available FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(match product {
        None => RepoError::Validation(format!("Product {product_id} not found")),
        Some((false, _)) => RepoError::Validation(format!("Product {product_id} is inactive")),
        Some((_, false)) => RepoError::State(format!(
            "Product {product_id} is currently unavailable"
        )),
        Some(_) => RepoError::Database("Order item insert matched no rows".into()),
    })
}

/// Remove a line item. Only pending items on open orders can be removed;
/// anything already in the kitchen flow is canceled through the status
/// endpoint instead.
pub async fn remove_item(pool: &SqlitePool, item_id: i64) -> RepoResult<Order> {
    let Some(item) = find_item(pool, item_id).await? else {
        return Err(RepoError::NotFound(format!(
            "Order item {item_id} not found"
        )));
    };

    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "DELETE FROM order_items WHERE id = ? AND status = 'pending' \
         AND EXISTS (SELECT 1 FROM orders o WHERE o.id = order_items.order_id AND o.status = 'open')",
    )
    .bind(item_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        if item.status != OrderItemStatus::Pending {
            return Err(RepoError::State(format!(
                "Order item {item_id} is {}, only pending items can be removed",
                item.status.as_str()
            )));
        }
        return Err(RepoError::State(format!(
            "Order {} is no longer open",
            item.order_id
        )));
    }

    recalculate_total(&mut *tx, item.order_id).await?;
    tx.commit().await?;

    find_by_id(pool, item.order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", item.order_id)))
}

/// Kitchen workflow transition for one item.
///
/// `preparation_start_time` and `delivery_time` are stamped exactly once,
/// on the first transition into `preparing`/`delivered`; re-entry cannot
/// overwrite them (COALESCE keeps the original).
pub async fn update_item_status(
    pool: &SqlitePool,
    item_id: i64,
    new_status: OrderItemStatus,
) -> RepoResult<(Order, OrderItem)> {
    let Some(item) = find_item(pool, item_id).await? else {
        return Err(RepoError::NotFound(format!(
            "Order item {item_id} not found"
        )));
    };

    let Some(order) = find_by_id(pool, item.order_id).await? else {
        return Err(RepoError::NotFound(format!(
            "Order {} not found",
            item.order_id
        )));
    };
    if order.status != OrderStatus::Open {
        return Err(RepoError::State(format!(
            "Order {} is {}, item statuses are frozen",
            order.id,
            order.status.as_str()
        )));
    }

    if !item.status.can_transition_to(new_status) {
        return Err(RepoError::State(format!(
            "Order item {item_id} cannot go {} -> {}",
            item.status.as_str(),
            new_status.as_str()
        )));
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;

    // Optimistic guard on the previous status: a concurrent transition
    // invalidates this update instead of silently overwriting it
    let rows = sqlx::query(
        "UPDATE order_items SET status = ?, \
         preparation_start_time = CASE WHEN ? = 'preparing' THEN COALESCE(preparation_start_time, ?) ELSE preparation_start_time END, \
         delivery_time = CASE WHEN ? = 'delivered' THEN COALESCE(delivery_time, ?) ELSE delivery_time END, \
         updated_at = ? \
         WHERE id = ? AND status = ?",
    )
    .bind(new_status.as_str())
    .bind(new_status.as_str())
    .bind(now)
    .bind(new_status.as_str())
    .bind(now)
    .bind(now)
    .bind(item_id)
    .bind(item.status.as_str())
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        return Err(RepoError::State(format!(
            "Order item {item_id} was modified concurrently, retry"
        )));
    }

    recalculate_total(&mut *tx, item.order_id).await?;
    tx.commit().await?;

    let order = find_by_id(pool, item.order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", item.order_id)))?;
    let item = find_item(pool, item_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order item {item_id} not found")))?;
    Ok((order, item))
}

/// Update order-level discount / service charge (open orders only)
pub async fn update_adjustments(
    pool: &SqlitePool,
    order_id: i64,
    discount: Option<f64>,
    service_charge: Option<f64>,
) -> RepoResult<Order> {
    if let Some(d) = discount {
        money::validate_non_negative_amount(d, "discount")
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }
    if let Some(s) = service_charge {
        money::validate_non_negative_amount(s, "service_charge")
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }

    let now = now_millis();
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE orders SET discount = COALESCE(?, discount), service_charge = COALESCE(?, service_charge), updated_at = ? WHERE id = ? AND status = 'open'",
    )
    .bind(discount.map(money::round_money))
    .bind(service_charge.map(money::round_money))
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        return Err(order_not_open(pool, order_id).await?);
    }

    recalculate_total(&mut *tx, order_id).await?;
    tx.commit().await?;

    find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
}

/// Settle and close an open order
pub async fn close_order(
    pool: &SqlitePool,
    order_id: i64,
    payment_method: PaymentMethod,
) -> RepoResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    // Final recompute happens before the status flips so the stored total
    // reflects the item rows at settlement time
    recalculate_total(&mut *tx, order_id).await?;

    let rows = sqlx::query(
        "UPDATE orders SET status = 'closed', payment_method = ?, payment_status = 'paid', closed_at = ?, updated_at = ? WHERE id = ? AND status = 'open'",
    )
    .bind(payment_method.as_str())
    .bind(now)
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        return Err(order_not_open(pool, order_id).await?);
    }

    tx.commit().await?;

    find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
}

/// Cancel an open order: every item is canceled and the table is freed
/// in the same transaction.
pub async fn cancel_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Order> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE orders SET status = 'canceled', updated_at = ? WHERE id = ? AND status = 'open'",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        drop(tx);
        return Err(order_not_open(pool, order_id).await?);
    }

    sqlx::query(
        "UPDATE order_items SET status = 'canceled', updated_at = ? WHERE order_id = ? AND status <> 'canceled'",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE dining_tables SET status = 'free', occupants = 0, open_time = NULL, waiter_id = NULL, current_order_id = NULL, updated_at = ? WHERE current_order_id = ?",
    )
    .bind(now)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    recalculate_total(&mut *tx, order_id).await?;
    tx.commit().await?;

    find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))
}

async fn order_not_open(pool: &SqlitePool, order_id: i64) -> RepoResult<RepoError> {
    Ok(match find_by_id(pool, order_id).await? {
        None => RepoError::NotFound(format!("Order {order_id} not found")),
        Some(o) => RepoError::State(format!(
            "Order {order_id} is {}, expected open",
            o.status.as_str()
        )),
    })
}

/// Recompute `orders.total` from the live item rows.
///
/// `total = max(0, Σ(unit_price × quantity, non-canceled) − discount +
/// service_charge)`, on `rust_decimal` internally. Deterministic and
/// idempotent; every mutating path in this module calls it before commit.
pub async fn recalculate_total(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<f64> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let adjustments = sqlx::query_as::<_, (f64, f64)>(
        "SELECT discount, service_charge FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((discount, service_charge)) = adjustments else {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    };

    let total = money::order_total(&items, discount, service_charge);

    sqlx::query("UPDATE orders SET total = ?, updated_at = ? WHERE id = ?")
        .bind(total)
        .bind(now_millis())
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(total)
}
