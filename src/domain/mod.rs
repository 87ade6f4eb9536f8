// ==========================================
// 食品生产计划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、周口径规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod downstream;
pub mod item;
pub mod packing;
pub mod stock;
pub mod types;
pub mod week;

// 重导出核心类型
pub use downstream::{
    FillingEntry, FillingRequirement, ProductionEntry, ProductionRequirement,
};
pub use item::{Item, NewItem, ReplenishmentPolicy};
pub use packing::{NewPackingEntry, PackingEntry, PackingEntryUpdate};
pub use stock::{SkippedStockRow, StockOnHand, StockUploadReport, StockUploadRow};
pub use types::ItemType;
pub use week::week_commencing_of;
