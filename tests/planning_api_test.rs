// ==========================================
// PlanningApi 集成测试
// ==========================================
// 测试范围:
// 1. 库存上报: apply_stock_upload / refresh_from_stock
// 2. 包装需求维护: create / update / set_special_order / delete
// 3. 周口径: 任意日期入参归一化、跨周迁移
// 4. 入参校验: 未知物料、非成品、停用物料
// ==========================================

mod test_helpers;

use chrono::{Duration, NaiveDate};
use food_production_planner::api::ApiError;
use food_production_planner::{NewPackingEntry, PackingEntryUpdate, StockUploadRow};
use test_helpers::{monday, seed_standard_hierarchy, PlanningTestEnv};

fn upload_row(code: &str, week: NaiveDate, dispatch: f64, packing: f64) -> StockUploadRow {
    StockUploadRow {
        item_code: code.to_string(),
        week_commencing: week,
        soh_dispatch_units: dispatch,
        soh_packing_units: packing,
    }
}

// ==========================================
// 库存上报测试
// ==========================================

#[test]
fn test_stock_upload_worked_example() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    let items = seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    // FG-P: 水位 0/100, 单重 2.0, 库存 12+8=20
    env.api
        .apply_stock_upload(vec![upload_row("FG-P", monday(), 12.0, 8.0)])
        .expect("库存上报失败");

    let leaves = env.api.list_packing_for_week(monday()).unwrap();
    assert_eq!(leaves.len(), 1, "上报应生成主行");
    let primary = &leaves[0];
    assert_eq!(primary.item_id, items.fg_p);
    assert_eq!(primary.packing_date, monday());
    assert!(primary.machinery_code.is_none());
    assert_eq!(primary.soh_units, 20.0);
    assert_eq!(primary.soh_kg, 40.0);
    assert_eq!(primary.shortfall_units, 80.0);
    assert_eq!(primary.shortfall_kg, 160.0);
    assert_eq!(primary.requirement_kg, 120.0);
    assert_eq!(primary.requirement_units, 60);

    // 加 10kg 特殊订单: 需求 160 + 10 - 40 = 130kg / 65 单位
    let updated = env
        .api
        .set_special_order(primary.id, 10.0)
        .expect("设置特殊订单失败");
    assert_eq!(updated.special_order_units, 5);
    assert_eq!(updated.requirement_kg, 130.0);
    assert_eq!(updated.requirement_units, 65);

    // 派生表同步刷新
    let fillings = env.api.list_filling_for_week(monday()).unwrap();
    assert_eq!(fillings.len(), 1);
    assert_eq!(fillings[0].item_id, items.wipf_x1);
    assert_eq!(fillings[0].total_kg, 130.0);

    let productions = env.api.list_production_for_week(monday()).unwrap();
    assert_eq!(productions.len(), 1);
    assert_eq!(productions[0].item_id, items.wip_y);
    assert_eq!(productions[0].total_kg, 130.0);
    assert_eq!(productions[0].batches, 0.43);
}

#[test]
fn test_stock_upload_report_counts_and_skips() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let report = env
        .api
        .apply_stock_upload(vec![
            upload_row("FG-P", monday(), 10.0, 0.0),
            upload_row("FG-Q", monday(), 3.0, 2.0),
            upload_row("FG-NOPE", monday(), 1.0, 0.0),
            upload_row("WIP-Y", monday(), 7.0, 0.0),
        ])
        .expect("库存上报失败");

    assert!(!report.batch_id.is_empty());
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.applied_rows, 2);
    assert_eq!(report.skipped_rows, 2);

    assert_eq!(report.skipped[0].row_number, 3);
    assert_eq!(report.skipped[0].item_code, "FG-NOPE");
    assert!(report.skipped[0].reason.contains("未知物料编码"));

    assert_eq!(report.skipped[1].row_number, 4);
    assert!(report.skipped[1].reason.contains("仅接受成品"));

    // 同周多行只触发一次重算
    assert_eq!(report.weeks_reaggregated, vec![monday()]);
}

#[test]
fn test_refresh_from_stock_keeps_single_primary_and_special_order() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    let items = seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let first = env
        .api
        .refresh_from_stock("FG-P", monday())
        .expect("首次刷新失败");
    assert_eq!(first.soh_units, 0.0, "无库存上报按 0 计");
    assert_eq!(first.requirement_kg, 200.0, "空库存补到最高水位 100*2.0");

    env.api.set_special_order(first.id, 30.0).unwrap();

    // 上报库存后再次刷新: 主行原地更新,特殊订单保留
    env.stock_repo.upsert(items.fg_p, monday(), 12.0, 8.0).unwrap();
    let second = env
        .api
        .refresh_from_stock("FG-P", monday())
        .expect("二次刷新失败");

    assert_eq!(second.id, first.id, "主行应原地更新而不是新建");
    assert_eq!(second.special_order_kg, 30.0);
    assert_eq!(second.soh_units, 20.0);
    assert_eq!(second.requirement_kg, 150.0, "160 + 30 - 40");

    let leaves = env.api.list_packing_for_week(monday()).unwrap();
    assert_eq!(leaves.len(), 1, "反复刷新不应产生重复主行");
}

// ==========================================
// 包装需求维护测试
// ==========================================

#[test]
fn test_create_update_delete_flow_refreshes_derived_tables() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    let items = seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let entry = env
        .api
        .create_packing_entry(NewPackingEntry {
            item_code: "FG-R".to_string(),
            week_commencing: monday(),
            packing_date: None,
            machinery_code: Some("LINE-2".to_string()),
            special_order_kg: 500.0,
        })
        .expect("创建失败");
    assert_eq!(entry.requirement_kg, 500.0);
    assert_eq!(entry.special_order_units, 2000, "floor(500 / 0.25)");

    let fillings = env.api.list_filling_for_week(monday()).unwrap();
    assert_eq!(fillings.len(), 1);
    assert_eq!(fillings[0].item_id, items.wipf_x1);
    assert_eq!(fillings[0].total_kg, 500.0);

    let updated = env.api.set_special_order(entry.id, 800.0).expect("修改失败");
    assert_eq!(updated.requirement_kg, 800.0);
    let fillings = env.api.list_filling_for_week(monday()).unwrap();
    assert_eq!(fillings[0].total_kg, 800.0);

    env.api.delete_packing_entry(entry.id).expect("删除失败");
    assert!(env.api.list_packing_for_week(monday()).unwrap().is_empty());
    assert!(env.api.list_filling_for_week(monday()).unwrap().is_empty());
    assert!(env.api.list_production_for_week(monday()).unwrap().is_empty());
}

#[test]
fn test_week_move_reaggregates_both_weeks() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    let items = seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let week1 = monday();
    let week2 = monday() + Duration::days(7);
    let week2_thursday = week2 + Duration::days(3);

    // 目标周有库存上报: 迁移后库存快照应取新周口径
    env.stock_repo.upsert(items.fg_r, week2, 10.0, 0.0).unwrap();

    let entry = env
        .api
        .create_packing_entry(NewPackingEntry {
            item_code: "FG-R".to_string(),
            week_commencing: week1,
            packing_date: None,
            machinery_code: None,
            special_order_kg: 600.0,
        })
        .expect("创建失败");
    assert_eq!(entry.requirement_kg, 600.0);

    let moved = env
        .api
        .update_packing_entry(
            entry.id,
            PackingEntryUpdate {
                packing_date: Some(week2_thursday),
                ..Default::default()
            },
        )
        .expect("跨周迁移失败");

    assert_eq!(moved.week_commencing, week2, "周键随包装日迁移并归一化");
    assert_eq!(moved.packing_date, week2_thursday);
    assert_eq!(moved.soh_units, 10.0, "库存快照随周刷新");
    assert_eq!(moved.requirement_kg, 597.5, "600 - 10*0.25");

    // 旧周清空,新周产出
    assert!(env.api.list_filling_for_week(week1).unwrap().is_empty());
    assert!(env.api.list_production_for_week(week1).unwrap().is_empty());

    let fillings = env.api.list_filling_for_week(week2).unwrap();
    assert_eq!(fillings.len(), 1);
    assert_eq!(fillings[0].total_kg, 597.5);
}

#[test]
fn test_week_input_normalized_to_monday() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let wednesday = monday() + Duration::days(2);
    let sunday = monday() + Duration::days(6);

    let entry = env
        .api
        .create_packing_entry(NewPackingEntry {
            item_code: "FG-R".to_string(),
            week_commencing: wednesday,
            packing_date: None,
            machinery_code: None,
            special_order_kg: 100.0,
        })
        .expect("创建失败");

    assert_eq!(entry.week_commencing, monday());
    assert_eq!(entry.packing_date, monday());

    // 周内任意日期都能查回同一周
    assert_eq!(env.api.list_packing_for_week(sunday).unwrap().len(), 1);
    assert_eq!(env.api.list_planning_weeks().unwrap(), vec![monday()]);
}

// ==========================================
// 入参校验测试
// ==========================================

#[test]
fn test_create_rejects_unknown_nonfg_and_inactive() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let make_input = |code: &str| NewPackingEntry {
        item_code: code.to_string(),
        week_commencing: monday(),
        packing_date: None,
        machinery_code: None,
        special_order_kg: 0.0,
    };

    match env.api.create_packing_entry(make_input("FG-NOPE")) {
        Err(ApiError::NotFound(msg)) => assert!(msg.contains("FG-NOPE")),
        other => panic!("未知物料应报 NotFound, 实际: {:?}", other.map(|e| e.id)),
    }

    match env.api.create_packing_entry(make_input("WIP-Y")) {
        Err(ApiError::BusinessRuleViolation(msg)) => assert!(msg.contains("仅支持成品")),
        other => panic!("非成品应报业务规则错误, 实际: {:?}", other.map(|e| e.id)),
    }

    env.item_repo.set_active("FG-P", false).unwrap();
    match env.api.create_packing_entry(make_input("FG-P")) {
        Err(ApiError::BusinessRuleViolation(msg)) => assert!(msg.contains("已停用")),
        other => panic!("停用物料应报业务规则错误, 实际: {:?}", other.map(|e| e.id)),
    }
}

#[test]
fn test_update_missing_entry_not_found() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let result = env.api.set_special_order(9999, 10.0);
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let result = env.api.delete_packing_entry(9999);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_get_stock_snapshot_roundtrip() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    assert!(env
        .api
        .get_stock_snapshot("FG-P", monday())
        .unwrap()
        .is_none());

    env.api
        .apply_stock_upload(vec![upload_row("FG-P", monday(), 12.5, 7.5)])
        .unwrap();

    let snapshot = env
        .api
        .get_stock_snapshot("FG-P", monday())
        .unwrap()
        .expect("应有库存快照");
    assert_eq!(snapshot.soh_dispatch_units, 12.5);
    assert_eq!(snapshot.soh_packing_units, 7.5);
    assert_eq!(snapshot.soh_total_units, 20.0);
}
