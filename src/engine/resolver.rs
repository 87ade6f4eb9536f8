// ==========================================
// 食品生产计划系统 - 层级解析器
// ==========================================
// 职责: FG → (WIPF?, WIP?) 的上游链接解析
// 输入: 物料主数据快照(一次加载,纯内存查找,不触库)
// 红线: 只读链接字段,不递归;断链不是错误,按缺失处理并记日志
// ==========================================

use crate::domain::item::Item;
use crate::domain::types::ItemType;
use std::collections::HashMap;
use tracing::warn;

// ==========================================
// ResolvedHierarchy - 解析结果
// ==========================================
// 任一分支缺失(未配置链接/链接悬空/叶子非 FG)即为 None,
// 对应分支的汇总跳过该叶子,另一分支不受影响
#[derive(Debug, Clone, Copy)]
pub struct ResolvedHierarchy<'a> {
    pub wipf: Option<&'a Item>, // 上游灌装半成品
    pub wip: Option<&'a Item>,  // 上游生产半成品
}

// ==========================================
// HierarchyResolver - 层级解析器
// ==========================================
pub struct HierarchyResolver {
    items_by_id: HashMap<i64, Item>,
}

impl HierarchyResolver {
    /// 从物料主数据快照构建解析器
    pub fn from_items(items: Vec<Item>) -> Self {
        let items_by_id = items.into_iter().map(|item| (item.id, item)).collect();
        Self { items_by_id }
    }

    /// 按物料 ID 查找快照内的物料
    pub fn get(&self, item_id: i64) -> Option<&Item> {
        self.items_by_id.get(&item_id)
    }

    /// 解析叶子物料的上游链接
    ///
    /// # 参数
    /// - leaf_item_id: 包装需求行挂载的 FG 物料 ID
    ///
    /// # 返回
    /// - ResolvedHierarchy: 两个分支各自独立,缺失即 None
    pub fn resolve(&self, leaf_item_id: i64) -> ResolvedHierarchy<'_> {
        let empty = ResolvedHierarchy {
            wipf: None,
            wip: None,
        };

        let leaf = match self.items_by_id.get(&leaf_item_id) {
            Some(item) => item,
            None => {
                warn!(leaf_item_id, "包装需求指向快照外的物料,跳过该叶子");
                return empty;
            }
        };

        if leaf.item_type != ItemType::Fg {
            warn!(
                item_code = %leaf.item_code,
                item_type = %leaf.item_type,
                "非成品物料不应携带包装需求,跳过该叶子"
            );
            return empty;
        }

        ResolvedHierarchy {
            wipf: self.follow_link(leaf, leaf.wipf_item_id, ItemType::Wipf),
            wip: self.follow_link(leaf, leaf.wip_item_id, ItemType::Wip),
        }
    }

    /// 跟随单个上游链接
    fn follow_link(
        &self,
        leaf: &Item,
        link: Option<i64>,
        expected_type: ItemType,
    ) -> Option<&Item> {
        let target_id = link?;
        match self.items_by_id.get(&target_id) {
            Some(target) => {
                if target.item_type != expected_type {
                    // 链接可用但类型不符,属数据质量问题,仍按链接汇总
                    warn!(
                        leaf_code = %leaf.item_code,
                        target_code = %target.item_code,
                        expected = %expected_type,
                        actual = %target.item_type,
                        "上游链接类型不符"
                    );
                }
                Some(target)
            }
            None => {
                warn!(
                    leaf_code = %leaf.item_code,
                    target_id,
                    expected = %expected_type,
                    "上游链接悬空,该分支按缺失处理"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, code: &str, item_type: ItemType) -> Item {
        Item {
            id,
            item_code: code.to_string(),
            description: None,
            item_type,
            min_level_units: None,
            max_level_units: None,
            avg_weight_per_unit_kg: None,
            wip_item_id: None,
            wipf_item_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fg_with_links(id: i64, code: &str, wipf: Option<i64>, wip: Option<i64>) -> Item {
        let mut fg = item(id, code, ItemType::Fg);
        fg.wipf_item_id = wipf;
        fg.wip_item_id = wip;
        fg
    }

    #[test]
    fn test_resolve_full_links() {
        let resolver = HierarchyResolver::from_items(vec![
            item(10, "WIP-Y", ItemType::Wip),
            item(20, "WIPF-X", ItemType::Wipf),
            fg_with_links(1, "FG-A", Some(20), Some(10)),
        ]);

        let resolved = resolver.resolve(1);
        assert_eq!(resolved.wipf.map(|i| i.id), Some(20));
        assert_eq!(resolved.wip.map(|i| i.id), Some(10));
    }

    #[test]
    fn test_resolve_missing_wipf_keeps_wip_branch() {
        let resolver = HierarchyResolver::from_items(vec![
            item(10, "WIP-Y", ItemType::Wip),
            fg_with_links(1, "FG-A", None, Some(10)),
        ]);

        let resolved = resolver.resolve(1);
        assert!(resolved.wipf.is_none());
        assert_eq!(resolved.wip.map(|i| i.id), Some(10));
    }

    #[test]
    fn test_resolve_dangling_link_treated_as_missing() {
        let resolver =
            HierarchyResolver::from_items(vec![fg_with_links(1, "FG-A", Some(999), None)]);

        let resolved = resolver.resolve(1);
        assert!(resolved.wipf.is_none());
        assert!(resolved.wip.is_none());
    }

    #[test]
    fn test_resolve_non_fg_leaf_yields_nothing() {
        let mut wip = item(10, "WIP-Y", ItemType::Wip);
        wip.wip_item_id = Some(10);
        let resolver = HierarchyResolver::from_items(vec![wip]);

        let resolved = resolver.resolve(10);
        assert!(resolved.wipf.is_none());
        assert!(resolved.wip.is_none());
    }

    #[test]
    fn test_resolve_unknown_leaf_yields_nothing() {
        let resolver = HierarchyResolver::from_items(vec![]);
        let resolved = resolver.resolve(42);
        assert!(resolved.wipf.is_none());
        assert!(resolved.wip.is_none());
    }
}
