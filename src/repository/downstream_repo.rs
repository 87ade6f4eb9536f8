// ==========================================
// DownstreamRepository - 下游汇总仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::downstream::{
    FillingEntry, FillingRequirement, ProductionEntry, ProductionRequirement,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 下游汇总仓储（filling_entry + production_entry）
/// 职责: 两张派生表的整周替换与只读查询
/// 红线: 派生表只能整周删除重建,单行修改一律不提供
pub struct DownstreamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DownstreamRepository {
    /// 创建新的 DownstreamRepository 实例
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

    /// 整周替换两张派生表（单事务: 先删后插，全成或全败）
    ///
    /// # 参数
    /// - week_commencing: 周键（调用方已归一化为周一）
    /// - fillings / productions: 本次汇总的完整结果集（空集合法，表示清空该周）
    ///
    /// # 返回
    /// - Ok((filling_count, production_count)): 写入行数
    /// - Err: 任一语句失败时整个事务回滚，旧数据保持原样
    pub fn replace_week(
        &self,
        week_commencing: NaiveDate,
        fillings: &[FillingRequirement],
        productions: &[ProductionRequirement],
    ) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let week_str = week_commencing.to_string();
        let now = chrono::Utc::now().to_rfc3339();

        let deleted_filling = tx.execute(
            "DELETE FROM filling_entry WHERE week_commencing = ?1",
            params![week_str],
        )?;
        let deleted_production = tx.execute(
            "DELETE FROM production_entry WHERE week_commencing = ?1",
            params![week_str],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO filling_entry (item_id, week_commencing, total_kg, updated_at)
                   VALUES (?1, ?2, ?3, ?4)"#,
            )?;
            for filling in fillings {
                stmt.execute(params![filling.item_id, week_str, filling.total_kg, now])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO production_entry (item_id, week_commencing, total_kg, batches, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for production in productions {
                stmt.execute(params![
                    production.item_id,
                    week_str,
                    production.total_kg,
                    production.batches,
                    now
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            week_commencing = %week_commencing,
            deleted_filling,
            deleted_production,
            inserted_filling = fillings.len(),
            inserted_production = productions.len(),
            "整周替换派生表完成"
        );

        Ok((fillings.len(), productions.len()))
    }

    /// 查询某周灌装需求（按物料 ID 升序）
    pub fn list_filling_for_week(
        &self,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Vec<FillingEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, item_id, week_commencing, total_kg, updated_at
               FROM filling_entry WHERE week_commencing = ?1 ORDER BY item_id"#,
        )?;

        let entries = stmt
            .query_map(params![week_commencing.to_string()], |row| {
                Self::map_filling_row(row)
            })?
            .collect::<SqliteResult<Vec<FillingEntry>>>()?;
        Ok(entries)
    }

    /// 查询某周生产需求（按物料 ID 升序）
    pub fn list_production_for_week(
        &self,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Vec<ProductionEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, item_id, week_commencing, total_kg, batches, updated_at
               FROM production_entry WHERE week_commencing = ?1 ORDER BY item_id"#,
        )?;

        let entries = stmt
            .query_map(params![week_commencing.to_string()], |row| {
                Self::map_production_row(row)
            })?
            .collect::<SqliteResult<Vec<ProductionEntry>>>()?;
        Ok(entries)
    }

    /// 查询某物料某周的灌装需求
    pub fn find_filling(
        &self,
        item_id: i64,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Option<FillingEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, item_id, week_commencing, total_kg, updated_at
               FROM filling_entry WHERE item_id = ?1 AND week_commencing = ?2"#,
        )?;

        let result = stmt.query_row(
            params![item_id, week_commencing.to_string()],
            |row| Self::map_filling_row(row),
        );
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某物料某周的生产需求
    pub fn find_production(
        &self,
        item_id: i64,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Option<ProductionEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, item_id, week_commencing, total_kg, batches, updated_at
               FROM production_entry WHERE item_id = ?1 AND week_commencing = ?2"#,
        )?;

        let result = stmt.query_row(
            params![item_id, week_commencing.to_string()],
            |row| Self::map_production_row(row),
        );
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 行映射 - filling_entry
    fn map_filling_row(row: &rusqlite::Row) -> rusqlite::Result<FillingEntry> {
        Ok(FillingEntry {
            id: row.get(0)?,
            item_id: row.get(1)?,
            week_commencing: Self::date_col(row, 2)?,
            total_kg: row.get(3)?,
            updated_at: row
                .get::<_, String>(4)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }

    /// 行映射 - production_entry
    fn map_production_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionEntry> {
        Ok(ProductionEntry {
            id: row.get(0)?,
            item_id: row.get(1)?,
            week_commencing: Self::date_col(row, 2)?,
            total_kg: row.get(3)?,
            batches: row.get(4)?,
            updated_at: row
                .get::<_, String>(5)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }

    fn date_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
        let s: String = row.get(idx)?;
        chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    }
}
