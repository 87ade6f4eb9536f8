// ==========================================
// 食品生产计划系统 - 重算编排器
// ==========================================
// 职责: 串联"读叶子 → 建层级快照 → 汇总 → 整周替换"四步
// 红线: 同一周的重算必须串行化,不同周可并行
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::week::week_commencing_of;
use crate::engine::aggregator::AggregationEngine;
use crate::engine::resolver::HierarchyResolver;
use crate::repository::{
    DownstreamRepository, ItemRepository, PackingRepository, RepositoryError, RepositoryResult,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ==========================================
// ReaggregationSummary - 单周重算摘要
// ==========================================

#[derive(Debug, Clone)]
pub struct ReaggregationSummary {
    pub week_commencing: NaiveDate,

    // ===== 输入侧 =====
    pub leaf_count: usize, // 参与汇总的包装需求行数

    // ===== 输出侧 =====
    pub filling_count: usize,    // 写入的灌装需求行数
    pub production_count: usize, // 写入的生产需求行数
    pub total_filling_kg: f64,
    pub total_production_kg: f64,

    // ===== 质量信号 =====
    pub missing_wipf_count: usize,
    pub missing_wip_count: usize,
    pub suppressed_filling_groups: usize,
    pub suppressed_production_groups: usize,
}

// ==========================================
// ReaggregationOrchestrator - 重算编排器
// ==========================================

pub struct ReaggregationOrchestrator {
    items: Arc<ItemRepository>,
    packing: Arc<PackingRepository>,
    downstream: Arc<DownstreamRepository>,
    engine: AggregationEngine,

    // 周键 → 周级互斥锁。锁表本身只在取锁瞬间短暂持有
    week_locks: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl ReaggregationOrchestrator {
    /// 创建重算编排器
    ///
    /// # 参数
    /// - items / packing / downstream: 共享仓储实例
    /// - config: 计划参数（批次大小）
    pub fn new(
        items: Arc<ItemRepository>,
        packing: Arc<PackingRepository>,
        downstream: Arc<DownstreamRepository>,
        config: &PlannerConfig,
    ) -> Self {
        Self {
            items,
            packing,
            downstream,
            engine: AggregationEngine::new(config.batch_size_kg),
            week_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 获取某周的串行化锁（首次访问时创建）
    fn week_lock(&self, week_commencing: NaiveDate) -> RepositoryResult<Arc<Mutex<()>>> {
        let mut locks = self
            .week_locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(locks
            .entry(week_commencing)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// 重算一周的灌装/生产派生表
    ///
    /// # 参数
    /// - week: 周内任意日期（内部归一化为周一）
    ///
    /// # 说明
    /// 派生表整周删除后按本次汇总结果重建,单事务提交。
    /// 无叶子的周是合法输入,效果是清空该周的两张派生表。
    pub fn reaggregate_week(&self, week: NaiveDate) -> RepositoryResult<ReaggregationSummary> {
        let week_commencing = week_commencing_of(week);

        let lock = self.week_lock(week_commencing)?;
        let _guard = lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        info!(week_commencing = %week_commencing, "开始周度重算");

        // ==========================================
        // 步骤1: 读取该周全量包装需求
        // ==========================================
        debug!("步骤1: 读取包装需求叶子");

        let leaves = self.packing.list_for_week(week_commencing)?;

        // ==========================================
        // 步骤2: 构建物料层级快照
        // ==========================================
        debug!("步骤2: 构建物料层级快照");

        let resolver = HierarchyResolver::from_items(self.items.list_all()?);

        // ==========================================
        // 步骤3: 下游汇总
        // ==========================================
        debug!("步骤3: 执行下游汇总");

        let outcome = self.engine.aggregate(week_commencing, &leaves, &resolver);
        let total_filling_kg = outcome.total_filling_kg();
        let total_production_kg = outcome.total_production_kg();

        // ==========================================
        // 步骤4: 整周替换派生表
        // ==========================================
        debug!("步骤4: 整周替换派生表");

        let (filling_count, production_count) = self.downstream.replace_week(
            week_commencing,
            &outcome.fillings,
            &outcome.productions,
        )?;

        let summary = ReaggregationSummary {
            week_commencing,
            leaf_count: outcome.leaf_count,
            filling_count,
            production_count,
            total_filling_kg,
            total_production_kg,
            missing_wipf_count: outcome.missing_wipf_count,
            missing_wip_count: outcome.missing_wip_count,
            suppressed_filling_groups: outcome.suppressed_filling_groups,
            suppressed_production_groups: outcome.suppressed_production_groups,
        };

        info!(
            week_commencing = %week_commencing,
            leaf_count = summary.leaf_count,
            filling_count = summary.filling_count,
            production_count = summary.production_count,
            total_filling_kg = summary.total_filling_kg,
            total_production_kg = summary.total_production_kg,
            "周度重算完成"
        );

        Ok(summary)
    }
}
