//! 订单全流程集成测试 - 真实 SQLite (内存库 + 迁移)
//!
//! 走仓储层完整生命周期：开台 → 点单 → 厨房流转 → 调整 → 结账 → 清台，
//! 并验证每一步后 `orders.total` 与规范公式一致。

use comanda_server::db;
use comanda_server::db::repository::{RepoError, orders, tables};
use shared::models::{
    CategoryCreate, DiningTableCreate, OrderItemCreate, OrderItemStatus, OrderStatus,
    PaymentMethod, PaymentStatus, ProductCreate, TableStatus,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

/// 内存库 + 迁移。单连接池：`sqlite::memory:` 每条连接是独立的库。
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

/// 播种一个分类和两个商品，返回 (burger_id, soda_id)
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

    let soda = comanda_server::db::repository::products::create(
        pool,
        ProductCreate {
            name: "Guarana".into(),
            category_id: category.id,
            price: 5.0,
            description: None,
            sort_order: None,
        },
    )
    .await
    .expect("create soda");

    (burger.id, soda.id)
}

async fn seed_table(pool: &SqlitePool, number: i64) -> i64 {
    tables::create(
        pool,
        DiningTableCreate {
            number,
            name: None,
        },
    )
    .await
    .expect("create table")
    .id
}

fn item(product_id: i64, quantity: i64) -> OrderItemCreate {
    OrderItemCreate {
        product_id,
        quantity,
        notes: None,
    }
}

#[tokio::test]
async fn test_full_dine_in_flow() {
    let pool = setup_pool().await;
    let (burger_id, soda_id) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 5).await;

    // 开台：餐台占用 + 新订单，总额为 0
    let (table, order) = tables::open_table(&pool, table_id, 2, None)
        .await
        .expect("open table");
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.occupants, 2);
    assert_eq!(table.current_order_id, Some(order.id));
    assert!(table.open_time.is_some());
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.total, 0.0);

    // 2 个汉堡 (10.00) → 20.00
    let (order, line) = orders::add_item(&pool, order.id, item(burger_id, 2))
        .await
        .expect("add burgers");
    assert_eq!(line.product_name, "X-Burger");
    assert_eq!(line.unit_price, 10.0);
    assert_eq!(line.status, OrderItemStatus::Pending);
    assert_eq!(order.total, 20.0);

    // 1 个汽水 (5.00) → 25.00
    let (order, soda_line) = orders::add_item(&pool, order.id, item(soda_id, 1))
        .await
        .expect("add soda");
    assert_eq!(order.total, 25.0);

    // 取消汽水：总额立即回落到 20.00
    let (order, soda_line) =
        orders::update_item_status(&pool, soda_line.id, OrderItemStatus::Canceled)
            .await
            .expect("cancel soda");
    assert_eq!(soda_line.status, OrderItemStatus::Canceled);
    assert_eq!(order.total, 20.0);

    // 请求买单
    let table = tables::request_payment(&pool, table_id)
        .await
        .expect("request payment");
    assert_eq!(table.status, TableStatus::WaitingPayment);

    // 结账
    let order = orders::close_order(&pool, order.id, PaymentMethod::Cash)
        .await
        .expect("close order");
    assert_eq!(order.status, OrderStatus::Closed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.payment_method, Some(PaymentMethod::Cash));
    assert_eq!(order.total, 20.0);
    assert!(order.closed_at.is_some());

    // 清台：回到空闲并清掉占用信息
    let table = tables::close_table(&pool, table_id).await.expect("close table");
    assert_eq!(table.status, TableStatus::Free);
    assert_eq!(table.occupants, 0);
    assert_eq!(table.open_time, None);
    assert_eq!(table.current_order_id, None);
}

#[tokio::test]
async fn test_closed_order_rejects_new_items() {
    let pool = setup_pool().await;
    let (burger_id, _) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 1).await;

    let (_, order) = tables::open_table(&pool, table_id, 1, None).await.unwrap();
    orders::add_item(&pool, order.id, item(burger_id, 1)).await.unwrap();
    orders::close_order(&pool, order.id, PaymentMethod::Pix).await.unwrap();

    let err = orders::add_item(&pool, order.id, item(burger_id, 1))
        .await
        .expect_err("closed order must reject items");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
    assert!(err.to_string().contains("closed"), "got {err}");
}

#[tokio::test]
async fn test_item_removal_only_while_pending() {
    let pool = setup_pool().await;
    let (burger_id, soda_id) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 2).await;

    let (_, order) = tables::open_table(&pool, table_id, 2, None).await.unwrap();
    let (_, burger_line) = orders::add_item(&pool, order.id, item(burger_id, 1)).await.unwrap();
    let (order_after, soda_line) = orders::add_item(&pool, order.id, item(soda_id, 2)).await.unwrap();
    assert_eq!(order_after.total, 20.0);

    // pending 可以直接删除，总额同步回落
    let order_after = orders::remove_item(&pool, soda_line.id).await.expect("remove pending item");
    assert_eq!(order_after.total, 10.0);
    assert!(orders::find_item(&pool, soda_line.id).await.unwrap().is_none());

    // 已进厨房的只能取消，不能删除
    orders::update_item_status(&pool, burger_line.id, OrderItemStatus::Preparing)
        .await
        .unwrap();
    let err = orders::remove_item(&pool, burger_line.id)
        .await
        .expect_err("preparing item must not be removable");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");

    let (order_after, _) =
        orders::update_item_status(&pool, burger_line.id, OrderItemStatus::Canceled)
            .await
            .expect("cancel preparing item");
    assert_eq!(order_after.total, 0.0);
}

#[tokio::test]
async fn test_kitchen_timestamps_stamped_on_first_transition() {
    let pool = setup_pool().await;
    let (burger_id, _) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 3).await;

    let (_, order) = tables::open_table(&pool, table_id, 2, None).await.unwrap();
    let (_, line) = orders::add_item(&pool, order.id, item(burger_id, 1)).await.unwrap();
    assert_eq!(line.preparation_start_time, None);
    assert_eq!(line.delivery_time, None);

    let (_, line) = orders::update_item_status(&pool, line.id, OrderItemStatus::Preparing)
        .await
        .unwrap();
    let started_at = line.preparation_start_time.expect("preparing stamps start time");
    assert_eq!(line.delivery_time, None);

    let (_, line) = orders::update_item_status(&pool, line.id, OrderItemStatus::Ready)
        .await
        .unwrap();
    assert_eq!(line.preparation_start_time, Some(started_at));

    let (_, line) = orders::update_item_status(&pool, line.id, OrderItemStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(line.preparation_start_time, Some(started_at));
    let delivered_at = line.delivery_time.expect("delivered stamps delivery time");
    assert!(delivered_at >= started_at);

    // 终态之后不再接受任何流转
    let err = orders::update_item_status(&pool, line.id, OrderItemStatus::Canceled)
        .await
        .expect_err("delivered is terminal");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
}

#[tokio::test]
async fn test_adjustments_affect_total() {
    let pool = setup_pool().await;
    let (burger_id, _) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 4).await;

    let (_, order) = tables::open_table(&pool, table_id, 2, None).await.unwrap();
    orders::add_item(&pool, order.id, item(burger_id, 3)).await.unwrap(); // 30.00

    // total = 30 - 5 + 3.5 = 28.50
    let order_after = orders::update_adjustments(&pool, order.id, Some(5.0), Some(3.5))
        .await
        .expect("apply adjustments");
    assert_eq!(order_after.discount, 5.0);
    assert_eq!(order_after.service_charge, 3.5);
    assert_eq!(order_after.total, 28.5);

    // None 保留原值：只改折扣
    let order_after = orders::update_adjustments(&pool, order.id, Some(10.0), None)
        .await
        .unwrap();
    assert_eq!(order_after.service_charge, 3.5);
    assert_eq!(order_after.total, 23.5);

    // 折扣超过商品合计：总额钳制到 0，不出现负数
    let order_after = orders::update_adjustments(&pool, order.id, Some(100.0), Some(0.0))
        .await
        .unwrap();
    assert_eq!(order_after.total, 0.0);
}

#[tokio::test]
async fn test_cancel_order_frees_table_and_cancels_items() {
    let pool = setup_pool().await;
    let (burger_id, soda_id) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 6).await;

    let (_, order) = tables::open_table(&pool, table_id, 4, None).await.unwrap();
    orders::add_item(&pool, order.id, item(burger_id, 2)).await.unwrap();
    let (_, soda_line) = orders::add_item(&pool, order.id, item(soda_id, 1)).await.unwrap();
    orders::update_item_status(&pool, soda_line.id, OrderItemStatus::Preparing)
        .await
        .unwrap();

    let order = orders::cancel_order(&pool, order.id).await.expect("cancel order");
    assert_eq!(order.status, OrderStatus::Canceled);
    assert_eq!(order.total, 0.0);

    for line in orders::find_items(&pool, order.id).await.unwrap() {
        assert_eq!(line.status, OrderItemStatus::Canceled);
    }

    let table = tables::find_by_id(&pool, table_id).await.unwrap().unwrap();
    assert_eq!(table.status, TableStatus::Free);
    assert_eq!(table.current_order_id, None);

    // 取消是终态
    let err = orders::cancel_order(&pool, order.id)
        .await
        .expect_err("second cancel must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
}

#[tokio::test]
async fn test_table_state_conflicts() {
    let pool = setup_pool().await;
    seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 7).await;

    tables::open_table(&pool, table_id, 2, None).await.unwrap();

    // 占用中的餐台不能再次开台
    let err = tables::open_table(&pool, table_id, 2, None)
        .await
        .expect_err("double open must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
    assert!(err.to_string().contains("occupied"), "got {err}");

    // 占用中的餐台不能停用
    let err = tables::deactivate(&pool, table_id)
        .await
        .expect_err("deactivating an occupied table must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");

    // 订单还开着时不能清台
    let err = tables::close_table(&pool, table_id)
        .await
        .expect_err("close with open order must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unavailable_product_rejected() {
    let pool = setup_pool().await;
    let (burger_id, _) = seed_catalog(&pool).await;
    let table_id = seed_table(&pool, 8).await;

    let (_, order) = tables::open_table(&pool, table_id, 1, None).await.unwrap();

    // 估清 (86) 的商品不能下单
    comanda_server::db::repository::products::set_availability(&pool, burger_id, false)
        .await
        .unwrap();
    let err = orders::add_item(&pool, order.id, item(burger_id, 1))
        .await
        .expect_err("86'd product must be rejected");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
    assert!(err.to_string().contains("unavailable"), "got {err}");

    // 恢复供应后可以正常下单
    comanda_server::db::repository::products::set_availability(&pool, burger_id, true)
        .await
        .unwrap();
    let (order_after, _) = orders::add_item(&pool, order.id, item(burger_id, 1)).await.unwrap();
    assert_eq!(order_after.total, 10.0);
}

#[tokio::test]
async fn test_order_list_filters() {
    let pool = setup_pool().await;
    let (burger_id, _) = seed_catalog(&pool).await;
    let t1 = seed_table(&pool, 11).await;
    let t2 = seed_table(&pool, 12).await;

    let (_, o1) = tables::open_table(&pool, t1, 2, None).await.unwrap();
    orders::add_item(&pool, o1.id, item(burger_id, 1)).await.unwrap();
    orders::close_order(&pool, o1.id, PaymentMethod::Cash).await.unwrap();
    tables::close_table(&pool, t1).await.unwrap();

    let (_, o2) = tables::open_table(&pool, t2, 2, None).await.unwrap();

    let open = orders::find_all(&pool, Some(OrderStatus::Open), None, 50, 0)
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, o2.id);

    let closed = orders::find_all(&pool, Some(OrderStatus::Closed), None, 50, 0)
        .await
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].id, o1.id);

    let by_table = orders::find_all(&pool, None, Some(t1), 50, 0).await.unwrap();
    assert_eq!(by_table.len(), 1);
    assert_eq!(by_table[0].id, o1.id);

    let limited = orders::find_all(&pool, None, None, 1, 0).await.unwrap();
    assert_eq!(limited.len(), 1);
}
