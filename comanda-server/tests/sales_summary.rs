//! 销售汇总集成测试 - 真实 SQLite (内存库 + 迁移)
//!
//! 汇总只认 closed + paid 的订单，按结账时间 (`closed_at`) 归档；
//! 测试用完整的开台→点单→结账流程铺数据，窗口断言用 SQL 回拨。

use comanda_server::db;
use comanda_server::db::repository::{orders, reports, tables};
use shared::models::{
    CategoryCreate, DiningTableCreate, OrderItemCreate, PaymentMethod, ProductCreate,
};
use shared::util::now_millis;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const HOUR_MS: i64 = 60 * 60 * 1000;

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db::run_migrations(&pool).await.expect("apply migrations");
    pool
}

/// 两个固定价格的商品：(10.00, 20.00)
async fn seed_catalog(pool: &SqlitePool) -> (i64, i64) {
    let category = comanda_server::db::repository::categories::create(
        pool,
        CategoryCreate {
            name: "Cozinha".into(),
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create category");
    let burger = comanda_server::db::repository::products::create(
        pool,
        ProductCreate {
            name: "X-Burger".into(),
            category_id: category.id,
            price: 10.0,
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create burger");
    let drink = comanda_server::db::repository::products::create(
        pool,
        ProductCreate {
            name: "Caipirinha".into(),
            category_id: category.id,
            price: 20.0,
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create drink");
    (burger.id, drink.id)
}

/// 开一桌、按数量点单，返回订单 id
async fn open_order_with(
    pool: &SqlitePool,
    number: i64,
    product_id: i64,
    quantity: i64,
) -> i64 {
    let table = tables::create(
        pool,
        DiningTableCreate {
            number,
            name: None,
        },
    )
    .await
    .expect("create table");
    let (_, order) = tables::open_table(pool, table.id, 2, None)
        .await
        .expect("open table");
    orders::add_item(
        pool,
        order.id,
        OrderItemCreate {
            product_id,
            quantity,
            notes: None,
        },
    )
    .await
    .expect("add item");
    order.id
}

#[tokio::test]
async fn test_aggregate_counts_only_settled_orders() {
    let pool = setup_pool().await;
    let (burger, drink) = seed_catalog(&pool).await;
    let start = now_millis() - HOUR_MS;

    // 现金 30.00
    let cash_a = open_order_with(&pool, 1, burger, 3).await;
    orders::close_order(&pool, cash_a, PaymentMethod::Cash).await.unwrap();

    // Pix 20.00
    let pix = open_order_with(&pool, 2, drink, 1).await;
    orders::close_order(&pool, pix, PaymentMethod::Pix).await.unwrap();

    // 现金 10.00 − 折扣 2.00 + 服务费 1.50 = 9.50
    let cash_b = open_order_with(&pool, 3, burger, 1).await;
    orders::update_adjustments(&pool, cash_b, Some(2.0), Some(1.5)).await.unwrap();
    orders::close_order(&pool, cash_b, PaymentMethod::Cash).await.unwrap();

    // 取消的和还开着的都不进汇总
    let canceled = open_order_with(&pool, 4, drink, 2).await;
    orders::cancel_order(&pool, canceled).await.unwrap();
    let _still_open = open_order_with(&pool, 5, burger, 5).await;

    let agg = reports::sales_aggregate(&pool, start, now_millis() + HOUR_MS)
        .await
        .expect("aggregate");

    assert_eq!(agg.order_count, 3);
    assert_eq!(agg.gross_revenue, 59.5);
    assert_eq!(agg.discount_total, 2.0);
    assert_eq!(agg.service_charge_total, 1.5);

    // 按金额倒序：现金 39.50 (2 单) 在前，pix 20.00 (1 单) 在后
    assert_eq!(agg.payment_breakdowns.len(), 2);
    assert_eq!(agg.payment_breakdowns[0].method, "cash");
    assert_eq!(agg.payment_breakdowns[0].amount, 39.5);
    assert_eq!(agg.payment_breakdowns[0].count, 2);
    assert_eq!(agg.payment_breakdowns[1].method, "pix");
    assert_eq!(agg.payment_breakdowns[1].amount, 20.0);
    assert_eq!(agg.payment_breakdowns[1].count, 1);
}

#[tokio::test]
async fn test_window_is_half_open_on_closed_at() {
    let pool = setup_pool().await;
    let (burger, _) = seed_catalog(&pool).await;

    let order_id = open_order_with(&pool, 1, burger, 2).await;
    orders::close_order(&pool, order_id, PaymentMethod::CreditCard).await.unwrap();

    // 把结账时间钉到已知毫秒，边界断言才可靠
    let settled_at = now_millis() - HOUR_MS;
    sqlx::query("UPDATE orders SET closed_at = ? WHERE id = ?")
        .bind(settled_at)
        .bind(order_id)
        .execute(&pool)
        .await
        .unwrap();

    // [settled_at, settled_at+1) 含起点
    let hit = reports::sales_aggregate(&pool, settled_at, settled_at + 1).await.unwrap();
    assert_eq!(hit.order_count, 1);
    assert_eq!(hit.gross_revenue, 20.0);

    // [settled_at-1, settled_at) 不含终点
    let miss = reports::sales_aggregate(&pool, settled_at - 1, settled_at).await.unwrap();
    assert_eq!(miss.order_count, 0);
}

#[tokio::test]
async fn test_empty_window_returns_zeroes() {
    let pool = setup_pool().await;
    let (burger, _) = seed_catalog(&pool).await;

    // 库里有一单已结账的，但窗口在未来
    let order_id = open_order_with(&pool, 1, burger, 1).await;
    orders::close_order(&pool, order_id, PaymentMethod::Cash).await.unwrap();

    let future = now_millis() + HOUR_MS;
    let agg = reports::sales_aggregate(&pool, future, future + HOUR_MS)
        .await
        .expect("aggregate");

    assert_eq!(agg.order_count, 0);
    assert_eq!(agg.gross_revenue, 0.0);
    assert_eq!(agg.discount_total, 0.0);
    assert_eq!(agg.service_charge_total, 0.0);
    assert!(agg.payment_breakdowns.is_empty());
}
