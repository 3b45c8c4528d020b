//! Users Repository
//!
//! Account CRUD plus argon2 password hashing/verification. The hash never
//! leaves this layer — handlers see [`shared::models::UserResponse`].

use super::{RepoError, RepoResult};
use crate::utils::validation::{MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use shared::models::{User, UserCreate, UserRole, UserUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const MIN_PASSWORD_LEN: usize = 6;

const USER_COLUMNS: &str =
    "id, username, display_name, password_hash, role, is_active, created_at, updated_at";

/// Hash password using argon2 (salted)
pub fn hash_password(password: &str) -> RepoResult<String> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| RepoError::Database(format!("Password hashing failed: {e}")))
}

/// Verify password against a stored argon2 hash
pub fn verify_password(hash: &str, password: &str) -> RepoResult<bool> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| RepoError::Database(format!("Stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

fn validate_password(password: &str) -> RepoResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(RepoError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(RepoError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(user)
}

/// Lookup by username; the column is `COLLATE NOCASE` so matching is
/// case-insensitive.
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY username"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    validate_required_text(&data.username, "username", MAX_SHORT_TEXT_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_required_text(&data.display_name, "display_name", MAX_SHORT_TEXT_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_password(&data.password)?;

    let hash = hash_password(&data.password)?;
    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO users (id, username, display_name, password_hash, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.username.trim())
    .bind(data.display_name.trim())
    .bind(&hash)
    .bind(data.role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    if let Some(name) = &data.display_name {
        validate_required_text(name, "display_name", MAX_SHORT_TEXT_LEN)
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }

    // Demoting or deactivating the last active admin would lock everyone out
    if data.role.is_some_and(|r| r != UserRole::Admin) || data.is_active == Some(false) {
        guard_last_admin(pool, id).await?;
    }

    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE users SET display_name = COALESCE(?, display_name), role = COALESCE(?, role), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(data.display_name.as_deref().map(str::trim))
    .bind(data.role.map(|r| r.as_str()))
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn reset_password(pool: &SqlitePool, id: i64, password: &str) -> RepoResult<()> {
    validate_password(password)?;
    let hash = hash_password(password)?;
    let now = now_millis();

    let rows = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

/// Soft-delete (deactivate) a user account
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    guard_last_admin(pool, id).await?;

    let now = now_millis();
    let rows = sqlx::query("UPDATE users SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

/// Reject the mutation when `id` is the only remaining active admin
async fn guard_last_admin(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let is_target_admin = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE id = ? AND role = 'admin' AND is_active = 1",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    if is_target_admin == 0 {
        return Ok(());
    }

    let active_admins = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active = 1",
    )
    .fetch_one(pool)
    .await?;

    if active_admins <= 1 {
        return Err(RepoError::State(
            "Cannot remove or demote the last active administrator".into(),
        ));
    }
    Ok(())
}
