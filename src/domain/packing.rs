// ==========================================
// 食品生产计划系统 - 包装需求领域模型
// ==========================================
// 用途: 包装需求明细（汇总引擎的唯一输入叶子）
// 对齐: packing_entry 表
// 红线: 行上快照计算时所用的策略与库存,重算以行内快照为准(可追溯)
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PackingEntry - 包装需求明细
// ==========================================
// 同一 FG 同一周允许多行,以 packing_date / machinery_code 区分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingEntry {
    // ===== 主键与关联 =====
    pub id: i64,      // 行 ID
    pub item_id: i64, // 关联 item_master（FG 行）

    // ===== 周口径 =====
    pub week_commencing: NaiveDate, // 周键（周一）
    pub packing_date: NaiveDate,    // 计划包装日（主行取周一）

    // ===== 资源标签 =====
    pub machinery_code: Option<String>, // 包装线编码（可空，主行为空）

    // ===== 订单输入 =====
    pub special_order_kg: f64,    // 特殊订单量（千克，允许负数表示临时冲减）
    pub special_order_units: i64, // 特殊订单折算单位数（floor(kg / 单重)）

    // ===== 策略快照（计算时点）=====
    pub min_level_units: f64,        // 最低库存水位
    pub max_level_units: f64,        // 最高库存水位
    pub avg_weight_per_unit_kg: f64, // 平均单重

    // ===== 库存快照（计算时点）=====
    pub soh_units: f64, // 周现有库存（单位数）
    pub soh_kg: f64,    // 周现有库存（千克）

    // ===== 计算过程量 =====
    pub shortfall_units: f64, // 补货缺口（单位数）
    pub shortfall_kg: f64,    // 补货缺口（千克）

    // ===== 计算输出 =====
    pub requirement_kg: f64,    // 本周应包装量（千克，2 位小数）
    pub requirement_units: i64, // 本周应包装量（单位数）

    // ===== 审计字段 =====
    pub updated_at: DateTime<Utc>, // 最后更新时间
}

// ==========================================
// NewPackingEntry - 包装需求新建入参
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPackingEntry {
    pub item_code: String,              // 目标 FG 编码
    pub week_commencing: NaiveDate,     // 目标周（任意日期，落库前归一化为周一）
    pub packing_date: Option<NaiveDate>, // 计划包装日（缺省取周一）
    pub machinery_code: Option<String>, // 包装线编码
    pub special_order_kg: f64,          // 特殊订单量（千克）
}

// ==========================================
// PackingEntryUpdate - 包装需求修改入参
// ==========================================
// None 表示该字段不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackingEntryUpdate {
    pub packing_date: Option<NaiveDate>,
    pub machinery_code: Option<String>,
    pub special_order_kg: Option<f64>,
}

impl PackingEntryUpdate {
    /// 是否为空修改（所有字段均不变）
    pub fn is_empty(&self) -> bool {
        self.packing_date.is_none()
            && self.machinery_code.is_none()
            && self.special_order_kg.is_none()
    }
}
