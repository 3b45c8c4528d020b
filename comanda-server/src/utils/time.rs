//! 业务时区的日期边界换算
//!
//! Handler 层把 `YYYY-MM-DD` 查询参数换算成 `[start, end)` 毫秒区间，
//! repository 只见 `i64` Unix millis，不感知时区。

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析 `YYYY-MM-DD`
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {date}")))
}

/// 某日零点在业务时区对应的 Unix millis。
///
/// 夏令时造成的歧义取 `latest()`；零点不存在的跳跃日退回按 UTC 解释。
fn local_midnight_millis(date: NaiveDate, tz: Tz) -> i64 {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    midnight
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

/// 营业日开始时刻
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    local_midnight_millis(date, tz)
}

/// 营业日结束时刻 = 次日零点，配合 `< end` 半开区间使用
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    local_midnight_millis(date.succ_opt().unwrap_or(date), tz)
}

/// 可选的日期区间参数 → `[start, end)` millis
///
/// 缺省边界分别回退到 0 / `i64::MAX`，即开放区间。
pub fn date_range_millis(
    start_date: Option<&str>,
    end_date: Option<&str>,
    tz: Tz,
) -> AppResult<(i64, i64)> {
    let start = match start_date {
        Some(s) => day_start_millis(parse_date(s)?, tz),
        None => 0,
    };
    let end = match end_date {
        Some(s) => day_end_millis(parse_date(s)?, tz),
        None => i64::MAX,
    };
    if start > end {
        return Err(AppError::validation("start_date is after end_date"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_days() {
        assert!(parse_date("2025-03-14").is_ok());
        assert!(parse_date("14/03/2025").is_err());
        assert!(parse_date("2025-13-01").is_err());
    }

    #[test]
    fn day_bounds_are_half_open() {
        let tz = chrono_tz::America::Sao_Paulo;
        let date = parse_date("2025-06-01").unwrap();
        let start = day_start_millis(date, tz);
        let end = day_end_millis(date, tz);
        assert_eq!(end - start, 24 * 3600 * 1000); // no DST change on this date
    }

    #[test]
    fn range_defaults_are_open_ended() {
        let tz = chrono_tz::America::Sao_Paulo;
        let (start, end) = date_range_millis(None, None, tz).unwrap();
        assert_eq!(start, 0);
        assert_eq!(end, i64::MAX);

        let err = date_range_millis(Some("2025-06-02"), Some("2025-06-01"), tz);
        assert!(err.is_err());
    }
}
