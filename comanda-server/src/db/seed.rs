//! First-run seeding
//!
//! 创建默认管理员账号 (admin)，密码来自配置。已存在管理员时不做任何事。

use sqlx::SqlitePool;

use crate::db::repository::users;
use crate::utils::{AppError, AppResult};
use shared::models::{UserCreate, UserRole};

/// Ensure at least one active admin account exists
pub async fn ensure_admin_user(pool: &SqlitePool, admin_password: &str) -> AppResult<()> {
    let admin_count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::database(format!("Failed to count admins: {e}")))?;

    if admin_count > 0 {
        return Ok(());
    }

    let admin = users::create(
        pool,
        UserCreate {
            username: "admin".to_string(),
            display_name: "Administrator".to_string(),
            password: admin_password.to_string(),
            role: UserRole::Admin,
        },
    )
    .await?;

    tracing::info!(user_id = admin.id, "Default admin account created");
    Ok(())
}
