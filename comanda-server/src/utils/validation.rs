//! 文本输入校验
//!
//! SQLite 的 TEXT 不限长，统一在仓储层把关。长度按字节算，
//! 错误消息带字段名，可直接回给客户端。

use crate::utils::AppError;

/// 实体名称：商品、分类、桌名、收银机标识
pub const MAX_NAME_LEN: usize = 200;

/// 备注、描述、报损原因
pub const MAX_NOTE_LEN: usize = 500;

/// 短标识：用户名、电话、取款去向
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// 邮箱 (RFC 5321 上限)
pub const MAX_EMAIL_LEN: usize = 254;

/// 密码明文 (哈希前)
pub const MAX_PASSWORD_LEN: usize = 128;

fn too_long(field: &str, len: usize, max_len: usize) -> AppError {
    AppError::validation(format!("{field} is too long ({len} chars, max {max_len})"))
}

/// 必填文本：非空白且不超长
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(too_long(field, value.len(), max_len));
    }
    Ok(())
}

/// 可选文本：存在时不超长，`None` 直接通过
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) if v.len() > max_len => Err(too_long(field, v.len(), max_len)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_oversized() {
        assert!(validate_required_text("Mesa 1", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn optional_text_allows_absent() {
        assert!(validate_optional_text(&None, "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("ok".into()), "notes", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("y".repeat(501)), "notes", MAX_NOTE_LEN).is_err());
    }
}
