// ==========================================
// 食品生产计划系统 - 下游汇总领域模型
// ==========================================
// 用途: 灌装/生产周度需求（引擎输出,只读视图的事实层）
// 对齐: filling_entry / production_entry 表
// 红线: 两表由重汇总整周删除重建,禁止手工编辑
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// FillingEntry - 灌装周度需求（已落库行）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillingEntry {
    pub id: i64,                    // 行 ID
    pub item_id: i64,               // 关联 item_master（WIPF 行）
    pub week_commencing: NaiveDate, // 周键（周一）
    pub total_kg: f64,              // 周汇总量（千克，2 位小数）
    pub updated_at: DateTime<Utc>,  // 重建时间
}

// ==========================================
// ProductionEntry - 生产周度需求（已落库行）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionEntry {
    pub id: i64,                    // 行 ID
    pub item_id: i64,               // 关联 item_master（WIP 行）
    pub week_commencing: NaiveDate, // 周键（周一）
    pub total_kg: f64,              // 周汇总量（千克，2 位小数）
    pub batches: f64,               // 批次数 = total_kg / 批次大小（保留小数）
    pub updated_at: DateTime<Utc>,  // 重建时间
}

// ==========================================
// FillingRequirement / ProductionRequirement - 汇总计算结果
// ==========================================
// 用途: 汇总引擎输出,重建写入的入参（无行 ID/审计字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillingRequirement {
    pub item_id: i64,  // WIPF 物料 ID
    pub total_kg: f64, // 周汇总量（千克）
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRequirement {
    pub item_id: i64,  // WIP 物料 ID
    pub total_kg: f64, // 周汇总量（千克）
    pub batches: f64,  // 批次数
}
