// ==========================================
// 食品生产计划系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod downstream_repo;
pub mod error;
pub mod item_repo;
pub mod packing_repo;
pub mod stock_repo;

// 重导出核心仓储
pub use downstream_repo::DownstreamRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use item_repo::ItemRepository;
pub use packing_repo::PackingRepository;
pub use stock_repo::StockRepository;
