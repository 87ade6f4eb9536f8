// ==========================================
// 食品生产计划系统 - 库存领域模型
// ==========================================
// 用途: 库存上报写入,计算器只读
// 对齐: stock_on_hand 表 ((item, week) 唯一)
// 口径: soh_total_units = 发货仓 + 包装仓,计算器消费 total 口径
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// StockOnHand - 周度现有库存
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOnHand {
    pub id: i64,                  // 行 ID
    pub item_id: i64,             // 关联 item_master（FK）
    pub week_commencing: NaiveDate, // 周键（周一）
    pub soh_dispatch_units: f64,  // 发货仓库存（单位数，允许小数）
    pub soh_packing_units: f64,   // 包装仓库存（单位数）
    pub soh_total_units: f64,     // 合计库存（计算器消费口径）
    pub edit_date: DateTime<Utc>, // 最后上报时间
}

// ==========================================
// StockUploadRow - 库存批量上报行
// ==========================================
// 用途: 上游采集系统解析后的落库入参（按物料编码寻址）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUploadRow {
    pub item_code: String,          // 物料编码
    pub week_commencing: NaiveDate, // 目标周（任意日期，落库前归一化为周一）
    pub soh_dispatch_units: f64,    // 发货仓库存
    pub soh_packing_units: f64,     // 包装仓库存
}

impl StockUploadRow {
    /// 合计库存口径
    pub fn total_units(&self) -> f64 {
        self.soh_dispatch_units + self.soh_packing_units
    }
}

// ==========================================
// StockUploadReport - 批量上报结果
// ==========================================
// 未知编码/非 FG 行记录后跳过,不中断整批
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUploadReport {
    pub batch_id: String,                // 批次 ID（UUID）
    pub total_rows: usize,               // 入参总行数
    pub applied_rows: usize,             // 成功落库行数
    pub skipped_rows: usize,             // 跳过行数
    pub skipped: Vec<SkippedStockRow>,   // 跳过明细
    pub weeks_reaggregated: Vec<NaiveDate>, // 触发重汇总的周（去重）
}

/// 跳过行明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedStockRow {
    pub row_number: usize, // 入参行号（1 起）
    pub item_code: String, // 原始编码
    pub reason: String,    // 跳过原因
}
