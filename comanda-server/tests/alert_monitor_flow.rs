//! 告警扫描集成测试 - 真实 SQLite (内存库 + 迁移)
//!
//! 扫描函数接收注入的 `now`，测试用它模拟时间推进；
//! 触发条件本身 (open_time / created_at) 用直接 SQL 回拨构造。
//!
//! 重点验证两种刻意不同的去重策略：
//! - 长时占台：30 分钟窗口 + 只看活跃告警 → 解决后可再次触发
//! - 高额订单：一单终身一条，状态无关

use comanda_server::db;
use comanda_server::db::repository::{alerts, orders, tables};
use comanda_server::monitor::{
    cleanup_expired_alerts, scan_high_value_orders, scan_long_duration_tables,
};
use shared::models::{
    AlertKind, AlertSeverity, AlertStatus, CategoryCreate, DiningTableCreate, OrderItemCreate,
    PaymentMethod, ProductCreate,
};
use shared::util::now_millis;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

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

/// 开一桌并返回 (table_id, order_id)
async fn seat_table(pool: &SqlitePool, number: i64) -> (i64, i64) {
    let table = tables::create(
        pool,
        DiningTableCreate {
            number,
            name: None,
        },
    )
    .await
    .expect("create table");
    let (table, order) = tables::open_table(pool, table.id, 2, None)
        .await
        .expect("open table");
    (table.id, order.id)
}

/// 创建指定价格的商品并加入订单，撑起订单总额
async fn add_priced_item(pool: &SqlitePool, order_id: i64, price: f64) {
    let category = comanda_server::db::repository::categories::create(
        pool,
        CategoryCreate {
            name: format!("cat-{price}"),
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create category");
    let product = comanda_server::db::repository::products::create(
        pool,
        ProductCreate {
            name: format!("item-{price}"),
            category_id: category.id,
            price,
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create product");
    orders::add_item(
        pool,
        order_id,
        OrderItemCreate {
            product_id: product.id,
            quantity: 1,
            notes: None,
        },
    )
    .await
    .expect("add item");
}

async fn backdate_table_open(pool: &SqlitePool, table_id: i64, open_time: i64) {
    sqlx::query("UPDATE dining_tables SET open_time = ? WHERE id = ?")
        .bind(open_time)
        .bind(table_id)
        .execute(pool)
        .await
        .expect("backdate open_time");
}

async fn backdate_order_created(pool: &SqlitePool, order_id: i64, created_at: i64) {
    sqlx::query("UPDATE orders SET created_at = ? WHERE id = ?")
        .bind(created_at)
        .bind(order_id)
        .execute(pool)
        .await
        .expect("backdate created_at");
}

#[tokio::test]
async fn test_long_occupation_alert_and_dedup_window() {
    let pool = setup_pool().await;
    let now = now_millis();
    let (table_id, order_id) = seat_table(&pool, 5).await;
    backdate_table_open(&pool, table_id, now - 130 * MINUTE_MS).await;

    // 第一轮：130 分钟 → medium 告警
    let created = scan_long_duration_tables(&pool, now).await.expect("scan");
    assert_eq!(created, 1);
    let alert = &alerts::find_all(&pool, None, Some(AlertKind::LongTableOccupation), 10)
        .await
        .unwrap()[0];
    assert_eq!(alert.severity, AlertSeverity::Medium);
    assert_eq!(alert.status, AlertStatus::Pending);
    assert_eq!(alert.table_id, Some(table_id));
    assert_eq!(alert.order_id, Some(order_id));
    assert_eq!(alert.data.get("minutes_open").map(String::as_str), Some("130"));
    assert!(alert.title.contains("2h10m"), "got {}", alert.title);

    // 同一轮条件下再扫：窗口内已有活跃告警，不重复
    assert_eq!(scan_long_duration_tables(&pool, now).await.unwrap(), 0);
    assert_eq!(
        scan_long_duration_tables(&pool, now + 10 * MINUTE_MS).await.unwrap(),
        0
    );

    // 窗口过期 (31 分钟) 后重新提醒，即使旧告警还挂着
    assert_eq!(
        scan_long_duration_tables(&pool, now + 31 * MINUTE_MS).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_long_occupation_realerts_after_resolution() {
    let pool = setup_pool().await;
    let now = now_millis();
    let (table_id, _) = seat_table(&pool, 6).await;
    backdate_table_open(&pool, table_id, now - 150 * MINUTE_MS).await;

    assert_eq!(scan_long_duration_tables(&pool, now).await.unwrap(), 1);
    let alert_id = alerts::find_all(&pool, None, Some(AlertKind::LongTableOccupation), 10)
        .await
        .unwrap()[0]
        .id;

    // 解决后窗口去重不再拦截：桌子还没清，下一轮立即再报
    alerts::resolve(&pool, alert_id).await.expect("resolve");
    assert_eq!(
        scan_long_duration_tables(&pool, now + MINUTE_MS).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_long_occupation_skips_paid_and_fresh_tables() {
    let pool = setup_pool().await;
    let now = now_millis();

    // 已付款的桌子不催
    let (paid_table, paid_order) = seat_table(&pool, 7).await;
    add_priced_item(&pool, paid_order, 40.0).await;
    orders::close_order(&pool, paid_order, PaymentMethod::Cash).await.unwrap();
    backdate_table_open(&pool, paid_table, now - 3 * 60 * MINUTE_MS).await;

    // 刚好 120 分钟的桌子还不算超时 (阈值是严格大于)
    let (fresh_table, _) = seat_table(&pool, 8).await;
    backdate_table_open(&pool, fresh_table, now - 120 * MINUTE_MS).await;

    assert_eq!(scan_long_duration_tables(&pool, now).await.unwrap(), 0);
}

#[tokio::test]
async fn test_long_occupation_severity_escalates() {
    let pool = setup_pool().await;
    let now = now_millis();
    let (table_id, _) = seat_table(&pool, 9).await;
    backdate_table_open(&pool, table_id, now - 200 * MINUTE_MS).await;

    assert_eq!(scan_long_duration_tables(&pool, now).await.unwrap(), 1);
    let alert = &alerts::find_all(&pool, None, Some(AlertKind::LongTableOccupation), 10)
        .await
        .unwrap()[0];
    assert_eq!(alert.severity, AlertSeverity::High);
    assert!(alert.title.contains("3h20m"), "got {}", alert.title);
}

#[tokio::test]
async fn test_high_value_order_alerts_once_for_lifetime() {
    let pool = setup_pool().await;
    let now = now_millis();
    let (table_id, order_id) = seat_table(&pool, 10).await;
    add_priced_item(&pool, order_id, 550.0).await;

    assert_eq!(scan_high_value_orders(&pool, now).await.unwrap(), 1);
    let alert = &alerts::find_all(&pool, None, Some(AlertKind::HighValueOrder), 10)
        .await
        .unwrap()[0];
    assert_eq!(alert.severity, AlertSeverity::Medium);
    assert_eq!(alert.order_id, Some(order_id));
    assert_eq!(alert.table_id, Some(table_id));
    assert_eq!(alert.data.get("order_total").map(String::as_str), Some("550.00"));

    // 反复扫描不再追加
    assert_eq!(scan_high_value_orders(&pool, now).await.unwrap(), 0);
    assert_eq!(
        scan_high_value_orders(&pool, now + 30 * MINUTE_MS).await.unwrap(),
        0
    );

    // 终身去重：解决掉也不再报同一单
    let alert_id = alert.id;
    alerts::resolve(&pool, alert_id).await.unwrap();
    assert_eq!(scan_high_value_orders(&pool, now).await.unwrap(), 0);
}

#[tokio::test]
async fn test_high_value_ignores_cheap_and_stale_orders() {
    let pool = setup_pool().await;
    let now = now_millis();

    // 差一分钱不到阈值
    let (_, cheap_order) = seat_table(&pool, 11).await;
    add_priced_item(&pool, cheap_order, 499.99).await;

    // 高额但开单超过 1 小时：不在扫描窗口里
    let (_, stale_order) = seat_table(&pool, 12).await;
    add_priced_item(&pool, stale_order, 600.0).await;
    backdate_order_created(&pool, stale_order, now - 2 * 60 * MINUTE_MS).await;

    assert_eq!(scan_high_value_orders(&pool, now).await.unwrap(), 0);

    // 阈值本身是包含的：正好 500.00 要报
    let (_, exact_order) = seat_table(&pool, 13).await;
    add_priced_item(&pool, exact_order, 500.0).await;
    assert_eq!(scan_high_value_orders(&pool, now).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cleanup_removes_only_old_terminal_alerts() {
    let pool = setup_pool().await;
    let now = now_millis();

    // 三张桌子各触发一条告警
    for number in [21, 22, 23] {
        let (table_id, _) = seat_table(&pool, number).await;
        backdate_table_open(&pool, table_id, now - 130 * MINUTE_MS).await;
    }
    assert_eq!(scan_long_duration_tables(&pool, now).await.unwrap(), 3);
    let all = alerts::find_all(&pool, None, None, 10).await.unwrap();
    assert_eq!(all.len(), 3);

    // 一条留在 pending，一条刚解决，一条解决于 31 天前
    let stale_id = all[0].id;
    let fresh_id = all[1].id;
    alerts::resolve(&pool, stale_id).await.unwrap();
    alerts::dismiss(&pool, fresh_id).await.unwrap();
    sqlx::query("UPDATE alerts SET resolved_at = ? WHERE id = ?")
        .bind(now - 31 * DAY_MS)
        .bind(stale_id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(cleanup_expired_alerts(&pool, now).await.unwrap(), 1);

    let remaining = alerts::find_all(&pool, None, None, 10).await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|a| a.id != stale_id));
}
