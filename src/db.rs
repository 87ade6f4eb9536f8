// ==========================================
// 食品生产计划系统 - SQLite 连接与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中管理 schema（item_master / stock_on_hand / packing_entry / filling_entry / production_entry）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等，可在已建库上重复执行）
///
/// 表设计：
/// - item_master: 物料主数据（RM/WIP/WIPF/FG 四级，FG 行携带 wip/wipf 上游链接）
/// - stock_on_hand: 周度现有库存（(item, week) 唯一）
/// - packing_entry: 包装需求明细（引擎输入，允许同一 FG 同周多行）
/// - filling_entry / production_entry: 周度汇总结果（(item, week) 唯一，引擎独占重建）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS item_master (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_code TEXT NOT NULL UNIQUE,
            description TEXT,
            item_type TEXT NOT NULL,
            min_level_units REAL,
            max_level_units REAL,
            avg_weight_per_unit_kg REAL,
            wip_item_id INTEGER REFERENCES item_master(id),
            wipf_item_id INTEGER REFERENCES item_master(id),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS stock_on_hand (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES item_master(id),
            week_commencing TEXT NOT NULL,
            soh_dispatch_units REAL NOT NULL DEFAULT 0,
            soh_packing_units REAL NOT NULL DEFAULT 0,
            soh_total_units REAL NOT NULL DEFAULT 0,
            edit_date TEXT NOT NULL,
            UNIQUE(item_id, week_commencing)
        );

        CREATE TABLE IF NOT EXISTS packing_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES item_master(id),
            week_commencing TEXT NOT NULL,
            packing_date TEXT NOT NULL,
            machinery_code TEXT,
            special_order_kg REAL NOT NULL DEFAULT 0,
            special_order_units INTEGER NOT NULL DEFAULT 0,
            min_level_units REAL NOT NULL DEFAULT 0,
            max_level_units REAL NOT NULL DEFAULT 0,
            avg_weight_per_unit_kg REAL NOT NULL DEFAULT 0,
            soh_units REAL NOT NULL DEFAULT 0,
            soh_kg REAL NOT NULL DEFAULT 0,
            shortfall_units REAL NOT NULL DEFAULT 0,
            shortfall_kg REAL NOT NULL DEFAULT 0,
            requirement_kg REAL NOT NULL DEFAULT 0,
            requirement_units INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_packing_entry_week
            ON packing_entry(week_commencing);
        CREATE INDEX IF NOT EXISTS idx_packing_entry_item_week
            ON packing_entry(item_id, week_commencing);

        CREATE TABLE IF NOT EXISTS filling_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES item_master(id),
            week_commencing TEXT NOT NULL,
            total_kg REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(item_id, week_commencing)
        );

        CREATE TABLE IF NOT EXISTS production_entry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL REFERENCES item_master(id),
            week_commencing TEXT NOT NULL,
            total_kg REAL NOT NULL DEFAULT 0,
            batches REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            UNIQUE(item_id, week_commencing)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
