// ==========================================
// 食品生产计划系统 - 领域类型定义
// ==========================================
// 物料四级层级: RM(原料) → WIP(生产半成品) → WIPF(灌装半成品) → FG(成品)
// 下游链接只存在于 FG 行: FG.wipf_item_id / FG.wip_item_id
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物料类型 (Item Type)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Rm,   // 原料
    Wip,  // 生产半成品（按批生产）
    Wipf, // 灌装半成品
    Fg,   // 成品（包装需求的挂载点）
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Rm => write!(f, "RM"),
            ItemType::Wip => write!(f, "WIP"),
            ItemType::Wipf => write!(f, "WIPF"),
            ItemType::Fg => write!(f, "FG"),
        }
    }
}

impl ItemType {
    /// 从字符串解析物料类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RM" => Some(ItemType::Rm),
            "WIP" => Some(ItemType::Wip),
            "WIPF" => Some(ItemType::Wipf),
            "FG" => Some(ItemType::Fg),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ItemType::Rm => "RM",
            ItemType::Wip => "WIP",
            ItemType::Wipf => "WIPF",
            ItemType::Fg => "FG",
        }
    }
}
