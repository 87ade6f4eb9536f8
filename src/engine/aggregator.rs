// ==========================================
// 食品生产计划系统 - 下游汇总引擎
// ==========================================
// 职责: 把一周的包装需求沿 FG→WIPF / FG→WIP 两条链路独立分组求和
// 纯函数: 输入为叶子集合 + 层级快照,输出为完整结果集,不触库
// ==========================================
// 口径:
// - 分组键是解析后的上游物料 ID(不是编码,不是叶子自身)
// - 断链叶子只跳过对应分支,另一分支照常参与
// - 分组总量舍入后 <= 0 的组不产出(整组抑制)
// - 批次数 = 生产周总量 / 批次大小,保留小数(166.67 批是合法结果)
// ==========================================

use crate::config::DEFAULT_BATCH_SIZE_KG;
use crate::domain::downstream::{FillingRequirement, ProductionRequirement};
use crate::domain::packing::PackingEntry;
use crate::engine::resolver::HierarchyResolver;
use crate::engine::round_kg;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

// ==========================================
// AggregationOutcome - 汇总结果
// ==========================================
#[derive(Debug, Clone)]
pub struct AggregationOutcome {
    pub week_commencing: NaiveDate,
    pub fillings: Vec<FillingRequirement>,       // 灌装结果集（按物料 ID 升序）
    pub productions: Vec<ProductionRequirement>, // 生产结果集（按物料 ID 升序）

    // ===== 过程统计 =====
    pub leaf_count: usize,                  // 输入叶子数
    pub missing_wipf_count: usize,          // 灌装分支断链叶子数
    pub missing_wip_count: usize,           // 生产分支断链叶子数
    pub suppressed_filling_groups: usize,   // 被抑制的灌装组数（总量<=0）
    pub suppressed_production_groups: usize, // 被抑制的生产组数
}

impl AggregationOutcome {
    /// 灌装结果集总量（千克）
    pub fn total_filling_kg(&self) -> f64 {
        round_kg(self.fillings.iter().map(|f| f.total_kg).sum())
    }

    /// 生产结果集总量（千克）
    pub fn total_production_kg(&self) -> f64 {
        round_kg(self.productions.iter().map(|p| p.total_kg).sum())
    }
}

// ==========================================
// AggregationEngine - 下游汇总引擎
// ==========================================
pub struct AggregationEngine {
    batch_size_kg: f64,
}

impl AggregationEngine {
    /// 创建汇总引擎
    ///
    /// # 参数
    /// - batch_size_kg: 生产批次大小（非正值回落默认值）
    pub fn new(batch_size_kg: f64) -> Self {
        let batch_size_kg = if batch_size_kg > 0.0 {
            batch_size_kg
        } else {
            DEFAULT_BATCH_SIZE_KG
        };
        Self { batch_size_kg }
    }

    /// 汇总一周的包装需求
    ///
    /// # 参数
    /// - week_commencing: 周键（周一）
    /// - leaves: 该周全量包装需求行
    /// - resolver: 物料层级快照
    ///
    /// # 返回
    /// - AggregationOutcome: 两张派生表的完整结果集 + 过程统计
    pub fn aggregate(
        &self,
        week_commencing: NaiveDate,
        leaves: &[PackingEntry],
        resolver: &HierarchyResolver,
    ) -> AggregationOutcome {
        // BTreeMap 保证结果集按物料 ID 升序,重建结果可复现
        let mut filling_totals: BTreeMap<i64, f64> = BTreeMap::new();
        let mut production_totals: BTreeMap<i64, f64> = BTreeMap::new();
        let mut missing_wipf_count = 0usize;
        let mut missing_wip_count = 0usize;

        for leaf in leaves {
            let resolved = resolver.resolve(leaf.item_id);

            match resolved.wipf {
                Some(wipf) => {
                    *filling_totals.entry(wipf.id).or_insert(0.0) += leaf.requirement_kg;
                }
                None => missing_wipf_count += 1,
            }

            match resolved.wip {
                Some(wip) => {
                    *production_totals.entry(wip.id).or_insert(0.0) += leaf.requirement_kg;
                }
                None => missing_wip_count += 1,
            }
        }

        let mut suppressed_filling_groups = 0usize;
        let mut fillings = Vec::with_capacity(filling_totals.len());
        for (item_id, total) in filling_totals {
            let total_kg = round_kg(total);
            if total_kg <= 0.0 {
                debug!(item_id, total_kg, "灌装组总量非正,整组抑制");
                suppressed_filling_groups += 1;
                continue;
            }
            fillings.push(FillingRequirement { item_id, total_kg });
        }

        let mut suppressed_production_groups = 0usize;
        let mut productions = Vec::with_capacity(production_totals.len());
        for (item_id, total) in production_totals {
            let total_kg = round_kg(total);
            if total_kg <= 0.0 {
                debug!(item_id, total_kg, "生产组总量非正,整组抑制");
                suppressed_production_groups += 1;
                continue;
            }
            let batches = round_kg(total_kg / self.batch_size_kg);
            productions.push(ProductionRequirement {
                item_id,
                total_kg,
                batches,
            });
        }

        info!(
            week_commencing = %week_commencing,
            leaf_count = leaves.len(),
            filling_groups = fillings.len(),
            production_groups = productions.len(),
            missing_wipf_count,
            missing_wip_count,
            "周度下游汇总完成"
        );

        AggregationOutcome {
            week_commencing,
            fillings,
            productions,
            leaf_count: leaves.len(),
            missing_wipf_count,
            missing_wip_count,
            suppressed_filling_groups,
            suppressed_production_groups,
        }
    }
}
