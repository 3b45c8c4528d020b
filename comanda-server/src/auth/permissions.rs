//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! ## 设计原则
//! - 基础操作（开台、点单、出品状态、结账）无需权限，登录即可使用
//! - 模块化权限：按功能模块授权
//! - 敏感操作：单独控制高风险操作
//! - 用户管理：仅 admin 角色可用

use shared::models::UserRole;

/// 可配置权限列表
/// 不包含 "all" 和 "users:manage"，这些是系统级权限
pub const ALL_PERMISSIONS: &[&str] = &[
    // === 模块化权限 ===
    "menu:manage",      // 菜单管理（商品/分类 增删改查）
    "tables:manage",    // 桌台管理（创建/编辑/停用餐桌）
    "customers:manage", // 客户档案管理
    "reports:view",     // 报表查看
    "backups:manage",   // 备份导出与查看
    "waste:record",     // 报损登记
    // === 敏感操作 ===
    "orders:manage", // 取消订单、折扣/服务费调整
    "cash:operate",  // 钱箱开关、存取款、抽大钞
    "cash:manage",   // 创建收银点
    "alerts:manage", // 告警确认/关闭
];

/// Admin 专属权限（不在可配置列表中）
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &[
    "users:manage", // 用户管理
    "all",          // 超级权限
];

/// Default role permissions
pub const ADMIN_PERMISSIONS: &[&str] = &["all"];

/// 经理角色权限（全部可配置权限）
pub const MANAGER_PERMISSIONS: &[&str] = &[
    "menu:manage",
    "tables:manage",
    "customers:manage",
    "reports:view",
    "backups:manage",
    "waste:record",
    "orders:manage",
    "cash:operate",
    "cash:manage",
    "alerts:manage",
];

/// 服务员权限（基础操作免权限，另加客户档案与报损）
pub const WAITER_PERMISSIONS: &[&str] = &["customers:manage", "waste:record"];

/// 后厨权限（出品状态更新免权限，另加报损）
pub const KITCHEN_PERMISSIONS: &[&str] = &["waste:record"];

/// Get permissions for a role
pub fn role_permissions(role: UserRole) -> Vec<String> {
    let set: &[&str] = match role {
        UserRole::Admin => ADMIN_PERMISSIONS,
        UserRole::Manager => MANAGER_PERMISSIONS,
        UserRole::Waiter => WAITER_PERMISSIONS,
        UserRole::Kitchen => KITCHEN_PERMISSIONS,
    };
    set.iter().map(|s| s.to_string()).collect()
}

/// Validate if a permission string is valid
pub fn is_valid_permission(permission: &str) -> bool {
    ALL_PERMISSIONS.contains(&permission)
        || ADMIN_ONLY_PERMISSIONS.contains(&permission)
        || permission.ends_with(":*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permission_sets() {
        assert_eq!(role_permissions(UserRole::Admin), vec!["all"]);
        assert!(role_permissions(UserRole::Manager).contains(&"cash:operate".to_string()));
        assert!(!role_permissions(UserRole::Waiter).contains(&"cash:operate".to_string()));
        assert!(role_permissions(UserRole::Kitchen).contains(&"waste:record".to_string()));
    }

    #[test]
    fn test_manager_covers_all_configurable() {
        for p in ALL_PERMISSIONS {
            assert!(
                MANAGER_PERMISSIONS.contains(p),
                "manager missing configurable permission {p}"
            );
        }
        assert!(!MANAGER_PERMISSIONS.contains(&"users:manage"));
    }

    #[test]
    fn test_is_valid_permission() {
        assert!(is_valid_permission("menu:manage"));
        assert!(is_valid_permission("users:manage"));
        assert!(is_valid_permission("orders:*"));
        assert!(!is_valid_permission("nonsense"));
    }
}
