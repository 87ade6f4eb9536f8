// ==========================================
// 食品生产计划系统 - 物料领域模型
// ==========================================
// 用途: 主数据维护写入,引擎层只读
// 对齐: item_master 表
// 红线: 下游链接(wip/wipf)只在 FG 行有意义,多个 FG 可指向同一上游(扇入汇总的基础)
// ==========================================

use crate::domain::types::ItemType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Item - 物料主数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    // ===== 主键 =====
    pub id: i64, // 行 ID（AUTOINCREMENT）

    // ===== 基础信息 =====
    pub item_code: String,           // 物料编码（唯一）
    pub description: Option<String>, // 物料描述
    pub item_type: ItemType,         // 物料类型（RM/WIP/WIPF/FG）

    // ===== 补货策略（单位域）=====
    pub min_level_units: Option<f64>, // 最低库存水位（单位数，0/NULL 表示未配置下限）
    pub max_level_units: Option<f64>, // 最高库存水位（单位数，补货目标）
    pub avg_weight_per_unit_kg: Option<f64>, // 平均单重（千克/单位，单位域↔重量域换算系数）

    // ===== 下游链接（仅 FG 行有意义）=====
    pub wip_item_id: Option<i64>,  // 上游生产半成品 ID
    pub wipf_item_id: Option<i64>, // 上游灌装半成品 ID

    // ===== 状态 =====
    pub is_active: bool, // 是否启用（停用 FG 拒绝新建包装需求，存量行仍参与汇总）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl Item {
    /// 是否为成品（包装需求只能挂在 FG 上）
    pub fn is_finished_good(&self) -> bool {
        self.item_type == ItemType::Fg
    }

    /// 提取补货策略快照（NULL 水位按 0 处理）
    pub fn replenishment_policy(&self) -> ReplenishmentPolicy {
        ReplenishmentPolicy {
            min_level_units: self.min_level_units.unwrap_or(0.0),
            max_level_units: self.max_level_units.unwrap_or(0.0),
            avg_weight_per_unit_kg: self.avg_weight_per_unit_kg.unwrap_or(0.0),
        }
    }
}

// ==========================================
// NewItem - 物料新建入参
// ==========================================
// 用途: 主数据维护/种子数据写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem {
    pub item_code: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    pub min_level_units: Option<f64>,
    pub max_level_units: Option<f64>,
    pub avg_weight_per_unit_kg: Option<f64>,
    pub wip_item_id: Option<i64>,
    pub wipf_item_id: Option<i64>,
}

impl NewItem {
    /// 构造最小物料（仅编码与类型），其余字段走默认
    pub fn new(item_code: &str, item_type: ItemType) -> Self {
        Self {
            item_code: item_code.to_string(),
            description: None,
            item_type,
            min_level_units: None,
            max_level_units: None,
            avg_weight_per_unit_kg: None,
            wip_item_id: None,
            wipf_item_id: None,
        }
    }
}

// ==========================================
// ReplenishmentPolicy - 补货策略快照
// ==========================================
// 用途: 计算器入参;包装需求行落库时同步快照本策略(可追溯)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentPolicy {
    pub min_level_units: f64,        // 最低库存水位（0 表示未配置下限）
    pub max_level_units: f64,        // 最高库存水位（补货目标）
    pub avg_weight_per_unit_kg: f64, // 平均单重（千克/单位）
}
