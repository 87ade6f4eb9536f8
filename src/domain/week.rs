// ==========================================
// 食品生产计划系统 - 计划周口径
// ==========================================
// 周键 = 所在周的周一 (week commencing)
// 红线: 所有写入路径必须先归一化周键,混合来源的记录不得撕裂同一计划周
// ==========================================

use chrono::{Datelike, Duration, NaiveDate};

/// 将任意日期归一化为所在周的周一
///
/// # 示例
/// ```
/// use chrono::NaiveDate;
/// use food_production_planner::domain::week::week_commencing_of;
///
/// let thursday = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
/// assert_eq!(week_commencing_of(thursday), monday);
/// ```
pub fn week_commencing_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// 日期是否已是周键（周一）
pub fn is_week_commencing(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() == 0
}
