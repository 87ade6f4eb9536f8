// ==========================================
// 食品生产计划系统 - 计划参数配置
// ==========================================
// 职责: 引擎运行参数（批次大小等），支持 JSON 文件加载/保存
// 默认值即生产口径，缺省字段回落到默认值
// ==========================================

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 生产批次大小缺省值（千克/批）
pub const DEFAULT_BATCH_SIZE_KG: f64 = 300.0;

/// 计划参数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub batch_size_kg: f64, // 生产批次大小（千克/批），批次数 = 周总需求 / 批次大小
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            batch_size_kg: DEFAULT_BATCH_SIZE_KG,
        }
    }
}

impl PlannerConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// - Ok(PlannerConfig): 加载并校验通过的配置
    /// - Err: 文件读取/解析/校验失败
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("读取配置文件失败: {}", path.as_ref().display()))?;
        let config: PlannerConfig =
            serde_json::from_str(&content).context("配置文件 JSON 解析失败")?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("写入配置文件失败: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// 校验配置值
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size_kg <= 0.0 {
            bail!("batch_size_kg 必须为正数: {}", self.batch_size_kg);
        }
        Ok(())
    }
}
