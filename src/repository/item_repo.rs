// ==========================================
// ItemRepository - 物料主数据仓储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::item::{Item, NewItem};
use crate::domain::types::ItemType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const ITEM_COLUMNS: &str = r#"
    id, item_code, description, item_type,
    min_level_units, max_level_units, avg_weight_per_unit_kg,
    wip_item_id, wipf_item_id, is_active,
    created_at, updated_at
"#;

/// 物料主数据仓储
/// 职责: 管理 item_master 表的数据访问
/// 红线: 不含业务逻辑，只负责数据访问
pub struct ItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ItemRepository {
    /// 创建新的 ItemRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 插入物料主数据
    ///
    /// # 参数
    /// - item: 物料新建入参
    ///
    /// # 返回
    /// - Ok(i64): 新行 ID
    /// - Err: 数据库错误（编码重复返回唯一约束违反）
    pub fn insert_item(&self, item: &NewItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = chrono::Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO item_master (
                item_code, description, item_type,
                min_level_units, max_level_units, avg_weight_per_unit_kg,
                wip_item_id, wipf_item_id, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)
            "#,
            params![
                item.item_code,
                item.description,
                item.item_type.to_db_str(),
                item.min_level_units,
                item.max_level_units,
                item.avg_weight_per_unit_kg,
                item.wip_item_id,
                item.wipf_item_id,
                now,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按行 ID 查询物料
    ///
    /// # 返回
    /// - Ok(Some(Item)): 找到记录
    /// - Ok(None): 未找到记录
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM item_master WHERE id = ?1", ITEM_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(params![id], |row| Self::map_row(row));
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按物料编码查询物料
    pub fn find_by_code(&self, item_code: &str) -> RepositoryResult<Option<Item>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM item_master WHERE item_code = ?1",
            ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let result = stmt.query_row(params![item_code], |row| Self::map_row(row));
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全量物料（层级解析的快照输入）
    pub fn list_all(&self) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM item_master ORDER BY item_code", ITEM_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<Item>>>()?;
        Ok(items)
    }

    /// 按物料类型查询物料
    pub fn list_by_type(&self, item_type: ItemType) -> RepositoryResult<Vec<Item>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM item_master WHERE item_type = ?1 ORDER BY item_code",
            ITEM_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let items = stmt
            .query_map(params![item_type.to_db_str()], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<Item>>>()?;
        Ok(items)
    }

    /// 更新物料补货策略（None 表示清空该水位）
    ///
    /// # 返回
    /// - Ok(true): 已更新
    /// - Ok(false): 编码不存在
    pub fn update_policy(
        &self,
        item_code: &str,
        min_level_units: Option<f64>,
        max_level_units: Option<f64>,
        avg_weight_per_unit_kg: Option<f64>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE item_master
            SET min_level_units = ?2,
                max_level_units = ?3,
                avg_weight_per_unit_kg = ?4,
                updated_at = ?5
            WHERE item_code = ?1
            "#,
            params![
                item_code,
                min_level_units,
                max_level_units,
                avg_weight_per_unit_kg,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// 启用/停用物料
    pub fn set_active(&self, item_code: &str, is_active: bool) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE item_master SET is_active = ?2, updated_at = ?3 WHERE item_code = ?1",
            params![
                item_code,
                if is_active { 1 } else { 0 },
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(updated > 0)
    }

    /// 行映射
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Item> {
        let type_str: String = row.get(3)?;
        let item_type = ItemType::from_str(&type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("未知物料类型: {}", type_str).into(),
            )
        })?;

        Ok(Item {
            id: row.get(0)?,
            item_code: row.get(1)?,
            description: row.get(2)?,
            item_type,
            min_level_units: row.get(4)?,
            max_level_units: row.get(5)?,
            avg_weight_per_unit_kg: row.get(6)?,
            wip_item_id: row.get(7)?,
            wipf_item_id: row.get(8)?,
            is_active: row.get::<_, i64>(9)? != 0,
            created_at: row
                .get::<_, String>(10)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: row
                .get::<_, String>(11)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}
