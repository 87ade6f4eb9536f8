// ==========================================
// PackingRepository - 包装需求仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::packing::PackingEntry;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const PACKING_COLUMNS: &str = r#"
    id, item_id, week_commencing, packing_date, machinery_code,
    special_order_kg, special_order_units,
    min_level_units, max_level_units, avg_weight_per_unit_kg,
    soh_units, soh_kg, shortfall_units, shortfall_kg,
    requirement_kg, requirement_units, updated_at
"#;

/// 包装需求仓储
/// 职责: 管理 packing_entry 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问;计算字段由 API 层落库前算好
pub struct PackingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PackingRepository {
    /// 创建新的 PackingRepository 实例
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

    /// 插入包装需求（entry.id 忽略，返回新行 ID）
    pub fn insert(&self, entry: &PackingEntry) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO packing_entry (
                item_id, week_commencing, packing_date, machinery_code,
                special_order_kg, special_order_units,
                min_level_units, max_level_units, avg_weight_per_unit_kg,
                soh_units, soh_kg, shortfall_units, shortfall_kg,
                requirement_kg, requirement_units, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                entry.item_id,
                entry.week_commencing.to_string(),
                entry.packing_date.to_string(),
                entry.machinery_code,
                entry.special_order_kg,
                entry.special_order_units,
                entry.min_level_units,
                entry.max_level_units,
                entry.avg_weight_per_unit_kg,
                entry.soh_units,
                entry.soh_kg,
                entry.shortfall_units,
                entry.shortfall_kg,
                entry.requirement_kg,
                entry.requirement_units,
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按行 ID 整行覆盖更新
    pub fn update(&self, entry: &PackingEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE packing_entry
            SET item_id = ?2,
                week_commencing = ?3,
                packing_date = ?4,
                machinery_code = ?5,
                special_order_kg = ?6,
                special_order_units = ?7,
                min_level_units = ?8,
                max_level_units = ?9,
                avg_weight_per_unit_kg = ?10,
                soh_units = ?11,
                soh_kg = ?12,
                shortfall_units = ?13,
                shortfall_kg = ?14,
                requirement_kg = ?15,
                requirement_units = ?16,
                updated_at = ?17
            WHERE id = ?1
            "#,
            params![
                entry.id,
                entry.item_id,
                entry.week_commencing.to_string(),
                entry.packing_date.to_string(),
                entry.machinery_code,
                entry.special_order_kg,
                entry.special_order_units,
                entry.min_level_units,
                entry.max_level_units,
                entry.avg_weight_per_unit_kg,
                entry.soh_units,
                entry.soh_kg,
                entry.shortfall_units,
                entry.shortfall_kg,
                entry.requirement_kg,
                entry.requirement_units,
                entry.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PackingEntry".to_string(),
                id: entry.id.to_string(),
            });
        }
        Ok(())
    }

    /// 按行 ID 删除
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 行不存在
    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM packing_entry WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// 按行 ID 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<PackingEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM packing_entry WHERE id = ?1", PACKING_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(params![id], |row| Self::map_row(row));
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某周全量包装需求（汇总引擎的输入）
    pub fn list_for_week(
        &self,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Vec<PackingEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM packing_entry WHERE week_commencing = ?1 ORDER BY item_id, id",
            PACKING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let entries = stmt
            .query_map(params![week_commencing.to_string()], |row| {
                Self::map_row(row)
            })?
            .collect::<SqliteResult<Vec<PackingEntry>>>()?;
        Ok(entries)
    }

    /// 查询某物料某周的主行
    ///
    /// 主行口径: packing_date = 周一 且 machinery_code 为空
    /// 库存刷新只覆盖主行,带明确日期/包装线的手工行不被覆盖
    pub fn find_primary(
        &self,
        item_id: i64,
        week_commencing: NaiveDate,
    ) -> RepositoryResult<Option<PackingEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"SELECT {} FROM packing_entry
               WHERE item_id = ?1 AND week_commencing = ?2
                 AND packing_date = ?2 AND machinery_code IS NULL
               ORDER BY id LIMIT 1"#,
            PACKING_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(
            params![item_id, week_commencing.to_string()],
            |row| Self::map_row(row),
        );
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询存在包装需求的全部周键（去重，升序）
    pub fn list_weeks(&self) -> RepositoryResult<Vec<NaiveDate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT week_commencing FROM packing_entry ORDER BY week_commencing",
        )?;

        let weeks = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<String>>>()?;

        let mut result = Vec::with_capacity(weeks.len());
        for week_str in weeks {
            if let Ok(week) = chrono::NaiveDate::parse_from_str(&week_str, "%Y-%m-%d") {
                result.push(week);
            }
        }
        Ok(result)
    }

    /// 行映射
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PackingEntry> {
        Ok(PackingEntry {
            id: row.get(0)?,
            item_id: row.get(1)?,
            week_commencing: Self::date_col(row, 2)?,
            packing_date: Self::date_col(row, 3)?,
            machinery_code: row.get(4)?,
            special_order_kg: row.get(5)?,
            special_order_units: row.get(6)?,
            min_level_units: row.get(7)?,
            max_level_units: row.get(8)?,
            avg_weight_per_unit_kg: row.get(9)?,
            soh_units: row.get(10)?,
            soh_kg: row.get(11)?,
            shortfall_units: row.get(12)?,
            shortfall_kg: row.get(13)?,
            requirement_kg: row.get(14)?,
            requirement_units: row.get(15)?,
            updated_at: row
                .get::<_, String>(16)?
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
