//! 现金账本集成测试 - 真实 SQLite (内存库 + 迁移)
//!
//! 每个账本操作 = 一次受保护的余额更新 + 恰好一条不可变流水。
//! 这里验证余额链 (previous → new) 在完整班次里首尾相接，
//! 以及被拒绝的操作不留任何痕迹。

use comanda_server::db;
use comanda_server::db::repository::{RepoError, cash_registers};
use shared::models::{CashTransactionKind, RegisterStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// 流水按 created_at(毫秒) 倒序；操作之间隔开 2ms 让顺序断言可靠
async fn spacer() {
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
}

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

#[tokio::test]
async fn test_shift_cycle_chains_balances() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 1").await.expect("create register");
    assert_eq!(register.status, RegisterStatus::Closed);
    assert_eq!(register.current_balance, 0.0);

    // 开班 100 → 存入 50.50 → 取出 30 → 抽大钞 100 → 关班
    let (register, tx) = cash_registers::open_register(&pool, register.id, 100.0, 1, "gerente")
        .await
        .expect("open register");
    assert_eq!(register.status, RegisterStatus::Open);
    assert_eq!(register.current_balance, 100.0);
    assert_eq!(register.opened_by, Some(1));
    assert_eq!(tx.kind, CashTransactionKind::Open);
    assert_eq!(tx.previous_balance, 0.0);
    assert_eq!(tx.new_balance, 100.0);

    spacer().await;
    let (register, tx) =
        cash_registers::deposit(&pool, register.id, 50.50, Some("troco".into()), 1, "gerente")
            .await
            .expect("deposit");
    assert_eq!(register.current_balance, 150.5);
    assert_eq!(tx.kind, CashTransactionKind::Deposit);
    assert_eq!(tx.previous_balance, 100.0);
    assert_eq!(tx.new_balance, 150.5);
    assert_eq!(tx.description.as_deref(), Some("troco"));

    spacer().await;
    let (register, tx) = cash_registers::withdraw(&pool, register.id, 30.0, None, 1, "gerente")
        .await
        .expect("withdraw");
    assert_eq!(register.current_balance, 120.5);
    assert_eq!(tx.previous_balance, 150.5);
    assert_eq!(tx.new_balance, 120.5);

    spacer().await;
    let (register, tx) = cash_registers::drain(&pool, register.id, 100.0, "cofre", 1, "gerente")
        .await
        .expect("drain");
    assert_eq!(register.current_balance, 20.5);
    assert_eq!(tx.kind, CashTransactionKind::Drain);
    assert_eq!(tx.destination.as_deref(), Some("cofre"));
    assert_eq!(tx.new_balance, 20.5);

    spacer().await;
    let (register, tx) = cash_registers::close_register(&pool, register.id, 20.5, 1, "gerente")
        .await
        .expect("close register");
    assert_eq!(register.status, RegisterStatus::Closed);
    assert!(register.closed_at.is_some());
    assert_eq!(tx.kind, CashTransactionKind::Close);
    assert_eq!(tx.previous_balance, 20.5);

    // 完整账本：5 条流水，倒序，余额链首尾相接
    let now = now_millis();
    let ledger =
        cash_registers::find_transactions(&pool, register.id, now - HOUR_MS, now + HOUR_MS)
            .await
            .expect("ledger window");
    assert_eq!(ledger.len(), 5);
    for pair in ledger.windows(2) {
        // 倒序排列：每条的 previous_balance 等于更早一条的 new_balance
        assert_eq!(pair[0].previous_balance, pair[1].new_balance);
    }
    let kinds: Vec<_> = ledger.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            CashTransactionKind::Close,
            CashTransactionKind::Drain,
            CashTransactionKind::Withdraw,
            CashTransactionKind::Deposit,
            CashTransactionKind::Open,
        ]
    );
}

#[tokio::test]
async fn test_movements_require_open_register() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 2").await.unwrap();

    for result in [
        cash_registers::deposit(&pool, register.id, 10.0, None, 1, "op").await,
        cash_registers::withdraw(&pool, register.id, 10.0, None, 1, "op").await,
        cash_registers::drain(&pool, register.id, 10.0, "cofre", 1, "op").await,
        cash_registers::close_register(&pool, register.id, 0.0, 1, "op").await,
    ] {
        let err = result.expect_err("closed register must reject the operation");
        assert!(matches!(err, RepoError::State(_)), "got {err:?}");
    }

    // 被拒绝的操作不产生流水
    let now = now_millis();
    let ledger =
        cash_registers::find_transactions(&pool, register.id, now - HOUR_MS, now + HOUR_MS)
            .await
            .unwrap();
    assert!(ledger.is_empty());

    // 重复开班同样被拒
    cash_registers::open_register(&pool, register.id, 50.0, 1, "op").await.unwrap();
    let err = cash_registers::open_register(&pool, register.id, 50.0, 1, "op")
        .await
        .expect_err("double open must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
}

#[tokio::test]
async fn test_insufficient_balance_leaves_no_trace() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 3").await.unwrap();
    cash_registers::open_register(&pool, register.id, 100.0, 1, "op").await.unwrap();

    let err = cash_registers::withdraw(&pool, register.id, 200.0, None, 1, "op")
        .await
        .expect_err("overdraw must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");
    assert!(err.to_string().contains("Insufficient"), "got {err}");

    let err = cash_registers::drain(&pool, register.id, 100.01, "cofre", 1, "op")
        .await
        .expect_err("overdrain must fail");
    assert!(matches!(err, RepoError::State(_)), "got {err:?}");

    // 余额不动，账本里只有开班一条
    let register = cash_registers::find_by_id(&pool, register.id).await.unwrap().unwrap();
    assert_eq!(register.current_balance, 100.0);
    let now = now_millis();
    let ledger =
        cash_registers::find_transactions(&pool, register.id, now - HOUR_MS, now + HOUR_MS)
            .await
            .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, CashTransactionKind::Open);

    // 刚好等于余额的取出是允许的
    let (register, _) = cash_registers::withdraw(&pool, register.id, 100.0, None, 1, "op")
        .await
        .expect("exact-balance withdraw");
    assert_eq!(register.current_balance, 0.0);
}

#[tokio::test]
async fn test_close_records_declared_against_computed() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 4").await.unwrap();
    cash_registers::open_register(&pool, register.id, 150.0, 2, "caixa").await.unwrap();

    // 点钞 140，系统算出 150：关班照常提交，流水里两个数都在
    let (register, tx) = cash_registers::close_register(&pool, register.id, 140.0, 2, "caixa")
        .await
        .expect("close with discrepancy");
    assert_eq!(register.status, RegisterStatus::Closed);
    assert_eq!(register.current_balance, 140.0);
    assert_eq!(tx.previous_balance, 150.0);
    assert_eq!(tx.new_balance, 140.0);
    assert_eq!(tx.amount, 140.0);
}

#[tokio::test]
async fn test_reopen_after_close_starts_fresh_float() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 5").await.unwrap();

    cash_registers::open_register(&pool, register.id, 80.0, 1, "manha").await.unwrap();
    cash_registers::close_register(&pool, register.id, 80.0, 1, "manha").await.unwrap();

    // 晚班重新开班：closed_at 清空，余额是新的备用金
    let (register, tx) = cash_registers::open_register(&pool, register.id, 200.0, 3, "noite")
        .await
        .expect("reopen");
    assert_eq!(register.status, RegisterStatus::Open);
    assert_eq!(register.current_balance, 200.0);
    assert_eq!(register.opened_by, Some(3));
    assert_eq!(register.closed_at, None);
    // 开班流水以关班余额为 previous
    assert_eq!(tx.previous_balance, 80.0);
    assert_eq!(tx.new_balance, 200.0);
}

#[tokio::test]
async fn test_ledger_window_is_half_open() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 6").await.unwrap();
    cash_registers::open_register(&pool, register.id, 10.0, 1, "op").await.unwrap();

    let now = now_millis();
    let ledger = cash_registers::find_transactions(&pool, register.id, now + HOUR_MS, now + 2 * HOUR_MS)
        .await
        .unwrap();
    assert!(ledger.is_empty(), "future window must be empty");

    let other = cash_registers::create(&pool, "Caixa 7").await.unwrap();
    cash_registers::open_register(&pool, other.id, 99.0, 1, "op").await.unwrap();

    // 窗口查询只看自己的流水
    let ledger =
        cash_registers::find_transactions(&pool, register.id, now - HOUR_MS, now + HOUR_MS)
            .await
            .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].register_id, register.id);
}

#[tokio::test]
async fn test_validation_rejects_bad_amounts() {
    let pool = setup_pool().await;
    let register = cash_registers::create(&pool, "Caixa 8").await.unwrap();

    let err = cash_registers::open_register(&pool, register.id, -1.0, 1, "op")
        .await
        .expect_err("negative float must fail");
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");

    cash_registers::open_register(&pool, register.id, 0.0, 1, "op").await.unwrap();

    // 零金额的存取没有意义
    let err = cash_registers::deposit(&pool, register.id, 0.0, None, 1, "op")
        .await
        .expect_err("zero deposit must fail");
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");

    let err = cash_registers::drain(&pool, register.id, 10.0, "  ", 1, "op")
        .await
        .expect_err("blank destination must fail");
    assert!(matches!(err, RepoError::Validation(_)), "got {err:?}");
}
