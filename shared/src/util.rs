//! 时间与 ID 工具

use rand::Rng;

/// 当前 UTC 时间，毫秒。全库所有时间戳字段都由它产生。
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 自定义纪元 2024-01-01 00:00:00 UTC
const ID_EPOCH_MS: i64 = 1_704_067_200_000;
/// 时间戳 41 位（约 69 年），随机尾 12 位
const ID_RANDOM_BITS: u32 = 12;
const ID_TIMESTAMP_MASK: i64 = (1 << 41) - 1;

/// 生成 Snowflake 风格的 i64 主键。
///
/// 41 位毫秒时间戳加 12 位随机数共 53 位，不超过 JavaScript 的
/// `Number.MAX_SAFE_INTEGER`，前端 JSON 不必走字符串。同一毫秒内
/// 有 4096 个取值，单店规模下碰撞可以忽略。桌台、订单、流水、
/// 告警等所有持久化实体的主键都出自这里。
pub fn snowflake_id() -> i64 {
    let elapsed = (now_millis() - ID_EPOCH_MS) & ID_TIMESTAMP_MASK;
    let tail: i64 = rand::thread_rng().gen_range(0..(1 << ID_RANDOM_BITS));
    (elapsed << ID_RANDOM_BITS) | tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_stay_within_53_bits() {
        for _ in 0..1000 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id <= (1_i64 << 53) - 1);
        }
    }

    #[test]
    fn ids_order_by_creation_time() {
        let a = snowflake_id();
        std::thread::sleep(std::time::Duration::from_millis(3));
        let b = snowflake_id();
        assert!(b > a);
    }
}
