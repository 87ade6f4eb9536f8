// ==========================================
// StockRepository - 周度库存仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::stock::StockOnHand;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const SOH_COLUMNS: &str = r#"
    id, item_id, week_commencing,
    soh_dispatch_units, soh_packing_units, soh_total_units,
    edit_date
"#;

/// 周度库存仓储
/// 职责: 管理 stock_on_hand 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
pub struct StockRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockRepository {
    /// 创建新的 StockRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入/覆盖某物料某周的库存（INSERT OR REPLACE）
    ///
    /// # 参数
    /// - item_id: 物料 ID
    /// - week_commencing: 周键（调用方已归一化为周一）
    /// - soh_dispatch_units / soh_packing_units: 分仓库存
    ///
    /// # 说明
    /// - soh_total_units 在此统一计算为两仓之和
    pub fn upsert(
        &self,
        item_id: i64,
        week_commencing: NaiveDate,
        soh_dispatch_units: f64,
        soh_packing_units: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO stock_on_hand (
                item_id, week_commencing,
                soh_dispatch_units, soh_packing_units, soh_total_units,
                edit_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                item_id,
                week_commencing.to_string(),
                soh_dispatch_units,
                soh_packing_units,
                soh_dispatch_units + soh_packing_units,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 查询某物料某周的库存
    ///
    /// # 返回
    /// - Ok(Some): 找到记录
    /// - Ok(None): 该周无库存上报（计算器按 0 处理）
    pub fn find_for_week(
        &self,
        item_id: i64,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Option<StockOnHand>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_on_hand WHERE item_id = ?1 AND week_commencing = ?2",
            SOH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(
            params![item_id, week_commencing.to_string()],
            |row| Self::map_row(row),
        );
        match result {
            Ok(soh) => Ok(Some(soh)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某周全量库存
    pub fn list_for_week(&self, week_commencing: NaiveDate) -> RepositoryResult<Vec<StockOnHand>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM stock_on_hand WHERE week_commencing = ?1 ORDER BY item_id",
            SOH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![week_commencing.to_string()], |row| {
                Self::map_row(row)
            })?
            .collect::<SqliteResult<Vec<StockOnHand>>>()?;
        Ok(rows)
    }

    /// 行映射
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<StockOnHand> {
        let week_str: String = row.get(2)?;
        let week_commencing =
            chrono::NaiveDate::parse_from_str(&week_str, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(StockOnHand {
            id: row.get(0)?,
            item_id: row.get(1)?,
            week_commencing,
            soh_dispatch_units: row.get(3)?,
            soh_packing_units: row.get(4)?,
            soh_total_units: row.get(5)?,
            edit_date: row
                .get::<_, String>(6)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}
