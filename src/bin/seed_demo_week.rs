use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use food_production_planner::config::PlannerConfig;
use food_production_planner::db::{init_schema, open_sqlite_connection};
use food_production_planner::domain::week_commencing_of;
use food_production_planner::repository::ItemRepository;
use food_production_planner::{ItemType, NewItem, NewPackingEntry, PlanningApi, StockUploadRow};

const DEFAULT_DB_PATH: &str = "food_planner_demo.db";

fn main() -> Result<(), Box<dyn Error>> {
    food_production_planner::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let item_repo = ItemRepository::from_connection(conn.clone());
    let api = PlanningApi::from_connection(conn, &PlannerConfig::default());

    let week = week_commencing_of(Local::now().date_naive());
    eprintln!("Seeding demo week {} into {}", week, db_path);

    // 物料层级: 一个生产半成品,两个灌装口味,三个成品
    let wip_y = item_repo.insert_item(&NewItem {
        description: Some("慢煮鸡胸 生产半成品".to_string()),
        ..NewItem::new("WIP-Y", ItemType::Wip)
    })?;
    let wipf_x1 = item_repo.insert_item(&NewItem {
        description: Some("原味灌装半成品".to_string()),
        ..NewItem::new("WIPF-X1", ItemType::Wipf)
    })?;
    let wipf_x2 = item_repo.insert_item(&NewItem {
        description: Some("香辣灌装半成品".to_string()),
        ..NewItem::new("WIPF-X2", ItemType::Wipf)
    })?;

    let fg_p = item_repo.insert_item(&NewItem {
        description: Some("原味即食鸡胸 2kg 装".to_string()),
        min_level_units: Some(0.0),
        max_level_units: Some(100.0),
        avg_weight_per_unit_kg: Some(2.0),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x1),
        ..NewItem::new("FG-P", ItemType::Fg)
    })?;
    item_repo.insert_item(&NewItem {
        description: Some("香辣即食鸡胸 1.5kg 装".to_string()),
        min_level_units: Some(10.0),
        max_level_units: Some(60.0),
        avg_weight_per_unit_kg: Some(1.5),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x2),
        ..NewItem::new("FG-Q", ItemType::Fg)
    })?;
    item_repo.insert_item(&NewItem {
        description: Some("原味鸡胸餐饮袋装".to_string()),
        avg_weight_per_unit_kg: Some(0.25),
        wip_item_id: Some(wip_y),
        wipf_item_id: Some(wipf_x1),
        ..NewItem::new("FG-R", ItemType::Fg)
    })?;

    // 库存上报: 两个有效行 + 一个未知编码行(演示跳过报告)
    let report = api.apply_stock_upload(vec![
        StockUploadRow {
            item_code: "FG-P".to_string(),
            week_commencing: week,
            soh_dispatch_units: 12.0,
            soh_packing_units: 8.0,
        },
        StockUploadRow {
            item_code: "FG-Q".to_string(),
            week_commencing: week,
            soh_dispatch_units: 5.0,
            soh_packing_units: 0.0,
        },
        StockUploadRow {
            item_code: "FG-UNKNOWN".to_string(),
            week_commencing: week,
            soh_dispatch_units: 1.0,
            soh_packing_units: 0.0,
        },
    ])?;
    println!(
        "库存上报批次 {}: 总行 {} / 落库 {} / 跳过 {}",
        report.batch_id, report.total_rows, report.applied_rows, report.skipped_rows
    );
    for skipped in &report.skipped {
        println!(
            "  跳过第{}行 {}: {}",
            skipped.row_number, skipped.item_code, skipped.reason
        );
    }

    // 给 FG-P 主行加一笔 10kg 特殊订单
    let fg_p_primary = api
        .list_packing_for_week(week)?
        .into_iter()
        .find(|e| e.item_id == fg_p && e.machinery_code.is_none())
        .ok_or("FG-P 主行未找到")?;
    api.set_special_order(fg_p_primary.id, 10.0)?;

    // FG-R 走餐饮专线,一笔 500kg 特殊订单
    api.create_packing_entry(NewPackingEntry {
        item_code: "FG-R".to_string(),
        week_commencing: week,
        packing_date: None,
        machinery_code: Some("LINE-2".to_string()),
        special_order_kg: 500.0,
    })?;

    print_week(&api, week)?;
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn print_week(api: &PlanningApi, week: chrono::NaiveDate) -> Result<(), Box<dyn Error>> {
    println!("\n===== 周 {} 包装需求 =====", week);
    for entry in api.list_packing_for_week(week)? {
        println!(
            "  行{:<3} 物料{:<3} 线体{:<8} 特殊订单{:>8.1}kg  应包装 {:>9.2}kg / {:>5} 单位",
            entry.id,
            entry.item_id,
            entry.machinery_code.as_deref().unwrap_or("-"),
            entry.special_order_kg,
            entry.requirement_kg,
            entry.requirement_units
        );
    }

    println!("===== 周 {} 灌装需求 =====", week);
    for filling in api.list_filling_for_week(week)? {
        println!("  物料{:<3} 合计 {:>9.2}kg", filling.item_id, filling.total_kg);
    }

    println!("===== 周 {} 生产需求 =====", week);
    for production in api.list_production_for_week(week)? {
        println!(
            "  物料{:<3} 合计 {:>9.2}kg  批次 {:>6.2}",
            production.item_id, production.total_kg, production.batches
        );
    }
    Ok(())
}
