// ==========================================
// 食品生产计划系统 - 库存补货计算器
// ==========================================
// 职责: 由补货策略 + 周库存 + 特殊订单推导本周应包装量(单位域与重量域)
// 纯函数: 不触库,全部输入显式传入,中间量全精度,仅输出值舍入
// ==========================================
// 口径:
// - min_level <= 0 视为"未配置下限",库存低于 max 即补到 max
// - min_level > 0 为严格触发线: 低于 min 才补,补满到 max(不做 min/max 间的部分补货)
// - 单重 <= 0 时重量域输出一律为 0,单位域照常
// ==========================================

use crate::domain::item::ReplenishmentPolicy;
use crate::engine::round_kg;
use serde::{Deserialize, Serialize};

// ==========================================
// StockRequirement - 计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRequirement {
    pub shortfall_units: f64,     // 补货缺口（单位数，≥0）
    pub shortfall_kg: f64,        // 补货缺口（千克）
    pub soh_units: f64,           // 入参回传：周库存（单位数）
    pub soh_kg: f64,              // 周库存折算重量（千克）
    pub special_order_units: i64, // 特殊订单折算单位数（向下取整）
    pub requirement_kg: f64,      // 本周应包装量（千克，2 位小数，≥0）
    pub requirement_units: i64,   // 本周应包装量（单位数，≥0）
}

// ==========================================
// StockRequirementCalculator - 库存补货计算器
// ==========================================
pub struct StockRequirementCalculator;

impl StockRequirementCalculator {
    /// 计算某 FG 某周的包装需求
    ///
    /// # 参数
    /// - policy: 补货策略快照（负水位/负单重按 0 处理）
    /// - soh_units: 周现有库存（单位数，周内无上报按 0 传入）
    /// - special_order_kg: 特殊订单量（千克，允许负数冲减）
    pub fn calculate(
        policy: &ReplenishmentPolicy,
        soh_units: f64,
        special_order_kg: f64,
    ) -> StockRequirement {
        // 策略脏数据治理: 负值一律按 0
        let weight_per_unit = policy.avg_weight_per_unit_kg.max(0.0);
        let min_level = policy.min_level_units.max(0.0);
        let max_level = policy.max_level_units.max(0.0);

        // 补货触发: 未配置下限(min<=0)时向 max 看齐,否则严格低于 min 才触发
        let replenish = min_level <= 0.0 || soh_units < min_level;
        let shortfall_units = if replenish {
            (max_level - soh_units).max(0.0)
        } else {
            0.0
        };

        let shortfall_kg = shortfall_units * weight_per_unit;
        let soh_kg = soh_units * weight_per_unit;

        let special_order_units = if weight_per_unit > 0.0 {
            (special_order_kg / weight_per_unit).floor() as i64
        } else {
            0
        };

        // 单重缺失时整条重量域失真,输出按 0 处理(单位域仍然成立)
        let requirement_kg = if weight_per_unit > 0.0 {
            round_kg((shortfall_kg + special_order_kg - soh_kg).max(0.0))
        } else {
            0.0
        };

        let requirement_units =
            ((shortfall_units - soh_units + special_order_units as f64).max(0.0)).round() as i64;

        StockRequirement {
            shortfall_units,
            shortfall_kg,
            soh_units,
            soh_kg,
            special_order_units,
            requirement_kg,
            requirement_units,
        }
    }
}
