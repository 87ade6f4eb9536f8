// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、标准物料层级、API 环境
// ==========================================

use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use food_production_planner::config::PlannerConfig;
use food_production_planner::db::{init_schema, open_sqlite_connection};
use food_production_planner::repository::{
    DownstreamRepository, ItemRepository, PackingRepository, StockRepository,
};
use food_production_planner::{ItemType, NewItem, PlanningApi};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 固定测试周（2026-08-24 为周一）
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
}

/// 完整 API 测试环境（共享单连接,仓储与 API 同库同连接）
pub struct PlanningTestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub api: Arc<PlanningApi>,
    pub item_repo: ItemRepository,
    pub stock_repo: StockRepository,
    pub packing_repo: PackingRepository,
    pub downstream_repo: DownstreamRepository,
}

impl PlanningTestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let (temp_file, db_path) = create_test_db()?;

        let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
        let api = Arc::new(PlanningApi::from_connection(
            conn.clone(),
            &PlannerConfig::default(),
        ));

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            conn: conn.clone(),
            api,
            item_repo: ItemRepository::from_connection(conn.clone()),
            stock_repo: StockRepository::from_connection(conn.clone()),
            packing_repo: PackingRepository::from_connection(conn.clone()),
            downstream_repo: DownstreamRepository::from_connection(conn),
        })
    }
}

/// 标准物料层级的 ID 集合
///
/// 结构:
/// - FG-P (2kg 装, 水位 0/100) → WIPF-X1 → WIP-Y
/// - FG-Q (1.5kg 装, 水位 10/60) → WIPF-X2 → WIP-Y
/// - FG-R (0.25kg 装, 无水位)   → WIPF-X1 → WIP-Y
#[derive(Debug, Clone, Copy)]
pub struct StandardItems {
    pub wip_y: i64,
    pub wipf_x1: i64,
    pub wipf_x2: i64,
    pub fg_p: i64,
    pub fg_q: i64,
    pub fg_r: i64,
}

/// 写入标准物料层级
pub fn seed_standard_hierarchy(items: &ItemRepository) -> Result<StandardItems, Box<dyn Error>> {
    let wip_y = items.insert_item(&NewItem::new("WIP-Y", ItemType::Wip))?;
    let wipf_x1 = items.insert_item(&NewItem::new("WIPF-X1", ItemType::Wipf))?;
    let wipf_x2 = items.insert_item(&NewItem::new("WIPF-X2", ItemType::Wipf))?;

    let fg_p = items.insert_item(&NewItem {
        min_level_units: Some(0.0),
        max_level_units: Some(100.0),
        avg_weight_per_unit_kg: Some(2.0),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x1),
        ..NewItem::new("FG-P", ItemType::Fg)
    })?;
    let fg_q = items.insert_item(&NewItem {
        min_level_units: Some(10.0),
        max_level_units: Some(60.0),
        avg_weight_per_unit_kg: Some(1.5),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x2),
        ..NewItem::new("FG-Q", ItemType::Fg)
    })?;
    let fg_r = items.insert_item(&NewItem {
        avg_weight_per_unit_kg: Some(0.25),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x1),
        ..NewItem::new("FG-R", ItemType::Fg)
    })?;

    Ok(StandardItems {
        wip_y,
        wipf_x1,
        wipf_x2,
        fg_p,
        fg_q,
        fg_r,
    })
}
