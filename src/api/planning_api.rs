// ==========================================
// 食品生产计划系统 - 计划 API
// ==========================================
// 职责: 包装需求维护、库存上报、周度重算的统一入口
// 红线: 任何改变某周叶子集合的写操作,都必须触发该周重算
// ==========================================

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::PlannerConfig;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::downstream::{FillingEntry, ProductionEntry};
use crate::domain::item::{Item, ReplenishmentPolicy};
use crate::domain::packing::{NewPackingEntry, PackingEntry, PackingEntryUpdate};
use crate::domain::stock::{SkippedStockRow, StockOnHand, StockUploadReport, StockUploadRow};
use crate::domain::week::week_commencing_of;
use crate::engine::calculator::StockRequirementCalculator;
use crate::engine::orchestrator::ReaggregationOrchestrator;
use crate::repository::{
    DownstreamRepository, ItemRepository, PackingRepository, StockRepository,
};

// ==========================================
// ReaggregationResponse - 重算响应
// ==========================================
/// 用于上层展示的单周重算结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaggregationResponse {
    pub success: bool,
    pub message: String,
    pub week_commencing: NaiveDate,
    pub leaf_count: usize,
    pub filling_count: usize,
    pub production_count: usize,
    pub total_filling_kg: f64,
    pub total_production_kg: f64,
}

// ==========================================
// PlanningApi - 计划 API
// ==========================================

/// 计划API
///
/// 职责：
/// 1. 包装需求维护（创建、修改、删除、特殊订单）
/// 2. 库存上报（单条刷新、批量上报）
/// 3. 周度重算（手动触发 + 写操作后自动触发）
/// 4. 明细查询（包装/灌装/生产三张表）
pub struct PlanningApi {
    item_repo: Arc<ItemRepository>,
    stock_repo: Arc<StockRepository>,
    packing_repo: Arc<PackingRepository>,
    downstream_repo: Arc<DownstreamRepository>,
    orchestrator: Arc<ReaggregationOrchestrator>,
}

impl PlanningApi {
    /// 打开（或创建）数据库并构建完整 API 实例
    ///
    /// # 参数
    /// - db_path: SQLite 数据库路径
    /// - config: 计划参数
    pub fn new(db_path: &str, config: &PlannerConfig) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn)), config))
    }

    /// 从已有连接构建 API 实例（测试与嵌入场景）
    ///
    /// # 说明
    /// 调用方负责保证连接上已执行过建表。
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: &PlannerConfig) -> Self {
        let item_repo = Arc::new(ItemRepository::from_connection(conn.clone()));
        let stock_repo = Arc::new(StockRepository::from_connection(conn.clone()));
        let packing_repo = Arc::new(PackingRepository::from_connection(conn.clone()));
        let downstream_repo = Arc::new(DownstreamRepository::from_connection(conn));

        let orchestrator = Arc::new(ReaggregationOrchestrator::new(
            item_repo.clone(),
            packing_repo.clone(),
            downstream_repo.clone(),
            config,
        ));

        Self {
            item_repo,
            stock_repo,
            packing_repo,
            downstream_repo,
            orchestrator,
        }
    }

    // ==========================================
    // 包装需求维护接口
    // ==========================================

    /// 创建包装需求行
    ///
    /// # 参数
    /// - input: 新建入参（按物料编码寻址；指定 packing_date 时周键以该日期所在周为准）
    ///
    /// # 返回
    /// - Ok(PackingEntry): 已落库的完整行（含计算快照）
    /// - Err(ApiError): 物料不存在 / 非成品 / 已停用 / 数据库错误
    ///
    /// # 说明
    /// 行落库为独立提交；随后的周重算失败时行仍然保留，
    /// 可通过 reaggregate_week 补偿重试。
    pub fn create_packing_entry(&self, input: NewPackingEntry) -> ApiResult<PackingEntry> {
        if input.item_code.trim().is_empty() {
            return Err(ApiError::InvalidInput("物料编码不能为空".to_string()));
        }

        let item = self.require_finished_good(&input.item_code)?;
        if !item.is_active {
            return Err(ApiError::BusinessRuleViolation(format!(
                "物料{}已停用,不能新建包装需求",
                item.item_code
            )));
        }

        // 周键派生自实际包装日;未指定包装日时取目标周周一
        let week_commencing = match input.packing_date {
            Some(date) => week_commencing_of(date),
            None => week_commencing_of(input.week_commencing),
        };
        let packing_date = input.packing_date.unwrap_or(week_commencing);

        let soh_units = self.soh_units_for(item.id, week_commencing)?;
        let policy = item.replenishment_policy();
        let calc = StockRequirementCalculator::calculate(&policy, soh_units, input.special_order_kg);

        let mut entry = PackingEntry {
            id: 0,
            item_id: item.id,
            week_commencing,
            packing_date,
            machinery_code: input.machinery_code,
            special_order_kg: input.special_order_kg,
            special_order_units: calc.special_order_units,
            min_level_units: policy.min_level_units,
            max_level_units: policy.max_level_units,
            avg_weight_per_unit_kg: policy.avg_weight_per_unit_kg,
            soh_units: calc.soh_units,
            soh_kg: calc.soh_kg,
            shortfall_units: calc.shortfall_units,
            shortfall_kg: calc.shortfall_kg,
            requirement_kg: calc.requirement_kg,
            requirement_units: calc.requirement_units,
            updated_at: chrono::Utc::now(),
        };
        entry.id = self.packing_repo.insert(&entry)?;

        info!(
            entry_id = entry.id,
            item_code = %item.item_code,
            week_commencing = %week_commencing,
            requirement_kg = entry.requirement_kg,
            "创建包装需求"
        );

        self.orchestrator.reaggregate_week(week_commencing)?;
        Ok(entry)
    }

    /// 修改包装需求行
    ///
    /// # 参数
    /// - id: 行 ID
    /// - update: 修改入参（None 字段不变）
    ///
    /// # 说明
    /// - 派生字段按行内策略快照重算（策略快照不回读主数据）
    /// - 修改 packing_date 且跨周时,行迁移到新周并同步刷新新周库存快照,
    ///   新旧两周都会重算
    pub fn update_packing_entry(
        &self,
        id: i64,
        update: PackingEntryUpdate,
    ) -> ApiResult<PackingEntry> {
        let mut entry = self
            .packing_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("包装需求行{}不存在", id)))?;

        if update.is_empty() {
            return Ok(entry);
        }

        let old_week = entry.week_commencing;

        if let Some(date) = update.packing_date {
            entry.packing_date = date;
            entry.week_commencing = week_commencing_of(date);
        }
        if let Some(code) = update.machinery_code {
            entry.machinery_code = Some(code);
        }
        if let Some(kg) = update.special_order_kg {
            entry.special_order_kg = kg;
        }

        // 跨周迁移时库存快照随周刷新,同周修改保留原快照
        if entry.week_commencing != old_week {
            entry.soh_units = self.soh_units_for(entry.item_id, entry.week_commencing)?;
        }

        let policy = ReplenishmentPolicy {
            min_level_units: entry.min_level_units,
            max_level_units: entry.max_level_units,
            avg_weight_per_unit_kg: entry.avg_weight_per_unit_kg,
        };
        let calc =
            StockRequirementCalculator::calculate(&policy, entry.soh_units, entry.special_order_kg);

        entry.special_order_units = calc.special_order_units;
        entry.soh_kg = calc.soh_kg;
        entry.shortfall_units = calc.shortfall_units;
        entry.shortfall_kg = calc.shortfall_kg;
        entry.requirement_kg = calc.requirement_kg;
        entry.requirement_units = calc.requirement_units;
        entry.updated_at = chrono::Utc::now();

        self.packing_repo.update(&entry)?;

        info!(
            entry_id = entry.id,
            week_commencing = %entry.week_commencing,
            requirement_kg = entry.requirement_kg,
            moved_week = entry.week_commencing != old_week,
            "修改包装需求"
        );

        if entry.week_commencing != old_week {
            self.orchestrator.reaggregate_week(old_week)?;
        }
        self.orchestrator.reaggregate_week(entry.week_commencing)?;
        Ok(entry)
    }

    /// 设置特殊订单量（修改接口的便捷封装）
    pub fn set_special_order(&self, id: i64, special_order_kg: f64) -> ApiResult<PackingEntry> {
        self.update_packing_entry(
            id,
            PackingEntryUpdate {
                special_order_kg: Some(special_order_kg),
                ..Default::default()
            },
        )
    }

    /// 删除包装需求行
    pub fn delete_packing_entry(&self, id: i64) -> ApiResult<()> {
        let entry = self
            .packing_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("包装需求行{}不存在", id)))?;

        self.packing_repo.delete(id)?;

        info!(
            entry_id = id,
            week_commencing = %entry.week_commencing,
            "删除包装需求"
        );

        self.orchestrator.reaggregate_week(entry.week_commencing)?;
        Ok(())
    }

    // ==========================================
    // 库存上报接口
    // ==========================================

    /// 按当前主数据与库存刷新某 FG 某周的主行
    ///
    /// # 参数
    /// - item_code: 成品编码
    /// - week: 周内任意日期
    ///
    /// # 说明
    /// 主行 = (packing_date=周一, machinery_code 为空) 的第一行;
    /// 不存在则创建。已有特殊订单量保留并参与重算。
    pub fn refresh_from_stock(&self, item_code: &str, week: NaiveDate) -> ApiResult<PackingEntry> {
        let item = self.require_finished_good(item_code)?;
        let week_commencing = week_commencing_of(week);

        let entry = self.refresh_primary_leaf(&item, week_commencing)?;
        self.orchestrator.reaggregate_week(week_commencing)?;
        Ok(entry)
    }

    /// 批量库存上报
    ///
    /// # 参数
    /// - rows: 上报行（按物料编码寻址，任意周混排）
    ///
    /// # 返回
    /// - Ok(StockUploadReport): 批次摘要（未知编码/非成品行跳过,不中断整批）
    ///
    /// # 说明
    /// 每行落库并刷新该 FG 该周主行;涉及到的每个周在整批处理完后各重算一次。
    pub fn apply_stock_upload(&self, rows: Vec<StockUploadRow>) -> ApiResult<StockUploadReport> {
        let batch_id = uuid::Uuid::new_v4().to_string();
        let total_rows = rows.len();
        let mut applied_rows = 0usize;
        let mut skipped: Vec<SkippedStockRow> = Vec::new();
        let mut weeks: BTreeSet<NaiveDate> = BTreeSet::new();

        info!(batch_id = %batch_id, total_rows, "开始批量库存上报");

        for (index, row) in rows.into_iter().enumerate() {
            let row_number = index + 1;

            if row.item_code.trim().is_empty() {
                skipped.push(SkippedStockRow {
                    row_number,
                    item_code: row.item_code,
                    reason: "物料编码为空".to_string(),
                });
                continue;
            }

            let item = match self.item_repo.find_by_code(&row.item_code)? {
                Some(item) => item,
                None => {
                    warn!(row_number, item_code = %row.item_code, "库存上报遇到未知物料编码");
                    skipped.push(SkippedStockRow {
                        row_number,
                        item_code: row.item_code,
                        reason: "未知物料编码".to_string(),
                    });
                    continue;
                }
            };

            if !item.is_finished_good() {
                skipped.push(SkippedStockRow {
                    row_number,
                    item_code: row.item_code,
                    reason: format!("物料类型为{},仅接受成品", item.item_type),
                });
                continue;
            }

            let week_commencing = week_commencing_of(row.week_commencing);
            self.stock_repo.upsert(
                item.id,
                week_commencing,
                row.soh_dispatch_units,
                row.soh_packing_units,
            )?;
            self.refresh_primary_leaf(&item, week_commencing)?;

            applied_rows += 1;
            weeks.insert(week_commencing);
        }

        for week in &weeks {
            self.orchestrator.reaggregate_week(*week)?;
        }

        let report = StockUploadReport {
            batch_id,
            total_rows,
            applied_rows,
            skipped_rows: skipped.len(),
            skipped,
            weeks_reaggregated: weeks.into_iter().collect(),
        };

        info!(
            batch_id = %report.batch_id,
            applied_rows = report.applied_rows,
            skipped_rows = report.skipped_rows,
            weeks = report.weeks_reaggregated.len(),
            "批量库存上报完成"
        );

        Ok(report)
    }

    // ==========================================
    // 重算接口
    // ==========================================

    /// 手动触发某周重算（幂等,可用于写后补偿）
    pub fn reaggregate_week(&self, week: NaiveDate) -> ApiResult<ReaggregationResponse> {
        let summary = self.orchestrator.reaggregate_week(week)?;
        Ok(ReaggregationResponse {
            success: true,
            message: format!(
                "周 {} 重算完成: 灌装 {} 行 / 生产 {} 行",
                summary.week_commencing, summary.filling_count, summary.production_count
            ),
            week_commencing: summary.week_commencing,
            leaf_count: summary.leaf_count,
            filling_count: summary.filling_count,
            production_count: summary.production_count,
            total_filling_kg: summary.total_filling_kg,
            total_production_kg: summary.total_production_kg,
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询某周包装需求明细
    pub fn list_packing_for_week(&self, week: NaiveDate) -> ApiResult<Vec<PackingEntry>> {
        Ok(self.packing_repo.list_for_week(week_commencing_of(week))?)
    }

    /// 查询某周灌装需求
    pub fn list_filling_for_week(&self, week: NaiveDate) -> ApiResult<Vec<FillingEntry>> {
        Ok(self
            .downstream_repo
            .list_filling_for_week(week_commencing_of(week))?)
    }

    /// 查询某周生产需求
    pub fn list_production_for_week(&self, week: NaiveDate) -> ApiResult<Vec<ProductionEntry>> {
        Ok(self
            .downstream_repo
            .list_production_for_week(week_commencing_of(week))?)
    }

    /// 查询某物料某周库存快照
    pub fn get_stock_snapshot(
        &self,
        item_code: &str,
        week: NaiveDate,
    ) -> ApiResult<Option<StockOnHand>> {
        let item = self
            .item_repo
            .find_by_code(item_code)?
            .ok_or_else(|| ApiError::NotFound(format!("物料{}不存在", item_code)))?;
        Ok(self
            .stock_repo
            .find_for_week(item.id, week_commencing_of(week))?)
    }

    /// 查询全量物料主数据
    pub fn list_items(&self) -> ApiResult<Vec<Item>> {
        Ok(self.item_repo.list_all()?)
    }

    /// 查询存在包装需求的周键列表（升序）
    pub fn list_planning_weeks(&self) -> ApiResult<Vec<NaiveDate>> {
        Ok(self.packing_repo.list_weeks()?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 按编码取 FG,非 FG 报业务规则错误
    fn require_finished_good(&self, item_code: &str) -> ApiResult<Item> {
        let item = self
            .item_repo
            .find_by_code(item_code)?
            .ok_or_else(|| ApiError::NotFound(format!("物料{}不存在", item_code)))?;

        if !item.is_finished_good() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "物料{}类型为{},包装需求仅支持成品",
                item.item_code, item.item_type
            )));
        }
        Ok(item)
    }

    /// 周库存（单位数,无上报按 0）
    fn soh_units_for(&self, item_id: i64, week_commencing: NaiveDate) -> ApiResult<f64> {
        Ok(self
            .stock_repo
            .find_for_week(item_id, week_commencing)?
            .map(|soh| soh.soh_total_units)
            .unwrap_or(0.0))
    }

    /// 按当前主数据策略 + 当前库存重建某 FG 某周主行（不触发重算）
    fn refresh_primary_leaf(
        &self,
        item: &Item,
        week_commencing: NaiveDate,
    ) -> ApiResult<PackingEntry> {
        let soh_units = self.soh_units_for(item.id, week_commencing)?;
        let policy = item.replenishment_policy();

        let existing = self.packing_repo.find_primary(item.id, week_commencing)?;
        let special_order_kg = existing.as_ref().map(|e| e.special_order_kg).unwrap_or(0.0);

        let calc = StockRequirementCalculator::calculate(&policy, soh_units, special_order_kg);
        let now = chrono::Utc::now();

        let entry = match existing {
            Some(mut entry) => {
                entry.min_level_units = policy.min_level_units;
                entry.max_level_units = policy.max_level_units;
                entry.avg_weight_per_unit_kg = policy.avg_weight_per_unit_kg;
                entry.special_order_units = calc.special_order_units;
                entry.soh_units = calc.soh_units;
                entry.soh_kg = calc.soh_kg;
                entry.shortfall_units = calc.shortfall_units;
                entry.shortfall_kg = calc.shortfall_kg;
                entry.requirement_kg = calc.requirement_kg;
                entry.requirement_units = calc.requirement_units;
                entry.updated_at = now;
                self.packing_repo.update(&entry)?;
                entry
            }
            None => {
                let mut entry = PackingEntry {
                    id: 0,
                    item_id: item.id,
                    week_commencing,
                    packing_date: week_commencing,
                    machinery_code: None,
                    special_order_kg,
                    special_order_units: calc.special_order_units,
                    min_level_units: policy.min_level_units,
                    max_level_units: policy.max_level_units,
                    avg_weight_per_unit_kg: policy.avg_weight_per_unit_kg,
                    soh_units: calc.soh_units,
                    soh_kg: calc.soh_kg,
                    shortfall_units: calc.shortfall_units,
                    shortfall_kg: calc.shortfall_kg,
                    requirement_kg: calc.requirement_kg,
                    requirement_units: calc.requirement_units,
                    updated_at: now,
                };
                entry.id = self.packing_repo.insert(&entry)?;
                entry
            }
        };

        Ok(entry)
    }
}
