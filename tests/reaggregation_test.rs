// ==========================================
// 周度重算集成测试
// ==========================================
// 测试范围:
// 1. 幂等性: 重复重算结果集一致
// 2. 原子性: 重建事务失败时旧派生行保持原样,可补偿重试
// 3. 并发: 同周多线程重算串行化
// ==========================================

mod test_helpers;

use std::collections::BTreeSet;
use std::thread;

use food_production_planner::NewPackingEntry;
use test_helpers::{monday, seed_standard_hierarchy, PlanningTestEnv};

fn create_order(env: &PlanningTestEnv, code: &str, kg: f64) -> i64 {
    env.api
        .create_packing_entry(NewPackingEntry {
            item_code: code.to_string(),
            week_commencing: monday(),
            packing_date: None,
            machinery_code: None,
            special_order_kg: kg,
        })
        .expect("创建包装需求失败")
        .id
}

/// 派生表的逻辑内容（忽略行 ID 与时间戳）
fn logical_state(env: &PlanningTestEnv) -> (BTreeSet<String>, BTreeSet<String>) {
    let fillings = env
        .api
        .list_filling_for_week(monday())
        .unwrap()
        .iter()
        .map(|f| format!("{}:{:.2}", f.item_id, f.total_kg))
        .collect();
    let productions = env
        .api
        .list_production_for_week(monday())
        .unwrap()
        .iter()
        .map(|p| format!("{}:{:.2}:{:.2}", p.item_id, p.total_kg, p.batches))
        .collect();
    (fillings, productions)
}

#[test]
fn test_reaggregation_is_idempotent() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    create_order(&env, "FG-P", 300.0);
    create_order(&env, "FG-Q", 450.0);
    create_order(&env, "FG-R", 150.0);

    let before = logical_state(&env);

    let first = env.api.reaggregate_week(monday()).expect("重算失败");
    assert!(first.success);
    assert_eq!(first.leaf_count, 3);
    let after_first = logical_state(&env);

    let second = env.api.reaggregate_week(monday()).expect("重算失败");
    assert!(second.success);
    let after_second = logical_state(&env);

    assert_eq!(before, after_first, "手动重算不应改变已正确的结果集");
    assert_eq!(after_first, after_second, "重复重算结果集应一致");
}

#[test]
fn test_reaggregation_response_counts() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    create_order(&env, "FG-P", 20500.0);
    create_order(&env, "FG-Q", 21900.0);

    let response = env.api.reaggregate_week(monday()).expect("重算失败");
    assert!(response.success);
    assert_eq!(response.week_commencing, monday());
    assert_eq!(response.leaf_count, 2);
    assert_eq!(response.filling_count, 2);
    assert_eq!(response.production_count, 1);
    assert!(response.message.contains("重算完成"));

    // 水位贡献: FG-P 无库存补到 100*2.0=200, FG-Q 补到 60*1.5=90
    assert_eq!(response.total_filling_kg, 20700.0 + 21990.0);
    assert_eq!(response.total_production_kg, 42690.0);
}

#[test]
fn test_empty_week_reaggregation_succeeds() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let response = env.api.reaggregate_week(monday()).expect("空周重算应成功");
    assert!(response.success);
    assert_eq!(response.leaf_count, 0);
    assert_eq!(response.filling_count, 0);
    assert_eq!(response.production_count, 0);
}

// ==========================================
// 原子性: 重建失败不破坏旧结果,修复后可重试
// ==========================================

#[test]
fn test_failed_rebuild_keeps_old_rows_and_is_retriable() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    let entry_id = create_order(&env, "FG-R", 600.0);
    let before = logical_state(&env);
    assert!(!before.0.is_empty());

    // 用触发器模拟生产表写入故障
    env.conn
        .lock()
        .unwrap()
        .execute_batch(
            r#"CREATE TRIGGER block_production BEFORE INSERT ON production_entry
               BEGIN
                   SELECT RAISE(ABORT, 'production_entry write blocked');
               END;"#,
        )
        .unwrap();

    // 叶子修改独立提交成功,随后的重建事务整体回滚
    let result = env.api.set_special_order(entry_id, 900.0);
    assert!(result.is_err(), "重建被触发器阻断时应报错");

    let leaf = env
        .packing_repo
        .find_by_id(entry_id)
        .unwrap()
        .expect("叶子行应存在");
    assert_eq!(leaf.special_order_kg, 900.0, "叶子修改应已提交");
    assert_eq!(
        logical_state(&env),
        before,
        "重建失败时旧派生行应保持原样"
    );

    // 故障排除后补偿重算成功
    env.conn
        .lock()
        .unwrap()
        .execute_batch("DROP TRIGGER block_production;")
        .unwrap();

    let response = env.api.reaggregate_week(monday()).expect("补偿重算失败");
    assert!(response.success);
    assert_eq!(response.total_production_kg, 900.0);

    let fillings = env.api.list_filling_for_week(monday()).unwrap();
    assert_eq!(fillings.len(), 1);
    assert_eq!(fillings[0].total_kg, 900.0);
}

// ==========================================
// 并发: 同周重算串行化
// ==========================================

#[test]
fn test_concurrent_reaggregation_same_week() {
    let env = PlanningTestEnv::new().expect("无法创建测试环境");
    seed_standard_hierarchy(&env.item_repo).expect("种子数据失败");

    create_order(&env, "FG-P", 300.0);
    create_order(&env, "FG-Q", 450.0);

    let expected = logical_state(&env);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let api = env.api.clone();
        handles.push(thread::spawn(move || {
            api.reaggregate_week(monday()).map(|r| r.success)
        }));
    }

    for handle in handles {
        let result = handle.join().expect("线程异常退出");
        assert!(result.expect("并发重算失败"));
    }

    assert_eq!(logical_state(&env), expected, "并发重算后结果集应一致");
}
