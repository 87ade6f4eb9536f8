// ==========================================
// 食品生产计划系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 纯计算模块(resolver/calculator/aggregator)不触库,
//       持久化只经 orchestrator 调仓储完成
// ==========================================

pub mod aggregator;
pub mod calculator;
pub mod orchestrator;
pub mod resolver;

// 重导出核心引擎
pub use aggregator::{AggregationEngine, AggregationOutcome};
pub use calculator::{StockRequirement, StockRequirementCalculator};
pub use orchestrator::{ReaggregationOrchestrator, ReaggregationSummary};
pub use resolver::{HierarchyResolver, ResolvedHierarchy};

/// 重量域统一舍入口径: 千克保留 2 位小数，四舍五入（远离零）
///
/// 中间计算一律保持全精度，只在最终落库/输出值上调用
pub fn round_kg(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
