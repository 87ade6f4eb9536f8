// ==========================================
// 食品生产计划系统 - 配置层
// ==========================================
// 职责: 计划参数管理（批次大小等）
// 存储: JSON 配置文件，缺省回落到内置默认值
// ==========================================

pub mod planner_config;

// 重导出核心配置
pub use planner_config::{PlannerConfig, DEFAULT_BATCH_SIZE_KG};
