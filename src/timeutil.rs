// ==========================================
// 工位OEE指标计算系统 - 时间工具
// ==========================================
// 职责: 毫秒时间戳与日历时间的互转
// 约定: 全系统统一使用 UTC 毫秒纪元时间
// ==========================================

use chrono::{DateTime, NaiveTime, TimeZone, Utc};

/// 毫秒时间戳转 UTC 日历时间
///
/// # 参数
/// - ms: 自 UNIX 纪元起的毫秒数
///
/// # 返回
/// - Some(DateTime<Utc>): 转换成功
/// - None: 超出 chrono 可表示范围
pub fn ms_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// UTC 日历时间转毫秒时间戳
pub fn utc_to_ms(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// 取给定时刻所在日的零点（UTC）
pub fn midnight_of(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        // and_hms_opt(0,0,0) 对合法日期恒成功
        .unwrap_or(dt)
}

/// 解析排班时刻字符串（"HH:MM:SS" 或 "HH:MM"）
///
/// # 返回
/// - Some(NaiveTime): 解析成功
/// - None: 非法时刻字符串（调用方按参考数据错误处理）
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// 将"当日日期 + 排班时刻"组合为 UTC 时间点
pub fn time_of_day_on(day_of: DateTime<Utc>, time: NaiveTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day_of.date_naive().and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_roundtrip() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 5, 8, 30, 0).unwrap();
        let ms = utc_to_ms(dt);
        assert_eq!(ms_to_utc(ms), Some(dt));
    }

    #[test]
    fn test_midnight_of() {
        let dt = Utc.with_ymd_and_hms(2026, 3, 5, 17, 45, 12).unwrap();
        let midnight = midnight_of(dt);
        assert_eq!(midnight, Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("06:30:00"),
            NaiveTime::from_hms_opt(6, 30, 0)
        );
        assert_eq!(parse_time_of_day("22:15"), NaiveTime::from_hms_opt(22, 15, 0));
        assert_eq!(parse_time_of_day("二十二点"), None);
        assert_eq!(parse_time_of_day("25:00:00"), None);
    }

    #[test]
    fn test_time_of_day_on() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let t = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        assert_eq!(
            time_of_day_on(now, t),
            Utc.with_ymd_and_hms(2026, 3, 5, 6, 0, 0).unwrap()
        );
    }
}
