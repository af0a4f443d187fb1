// ==========================================
// 沼气电站配料优化引擎 - 领域类型定义
// ==========================================
// 序列化格式: 与物料基础表 / 前端 JSON 契约保持一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物料类别 (Material Category)
// ==========================================
// 红线: 体积配比模式按类别分配吨位, 类别判定只在目录层发生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialCategory {
    #[serde(rename = "solido")]
    Solid, // 固体物料 (青贮、粪污固相等)
    #[serde(rename = "liquido")]
    Liquid, // 液体物料 (乳清、油脂等)
    #[serde(rename = "purin")]
    Slurry, // 粪浆 (以 m³ 计量供给)
}

impl fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialCategory::Solid => write!(f, "solido"),
            MaterialCategory::Liquid => write!(f, "liquido"),
            MaterialCategory::Slurry => write!(f, "purin"),
        }
    }
}

impl std::str::FromStr for MaterialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solido" | "solid" => Ok(MaterialCategory::Solid),
            "liquido" | "liquid" => Ok(MaterialCategory::Liquid),
            "purin" | "purín" | "slurry" => Ok(MaterialCategory::Slurry),
            other => Err(format!("未知物料类别: {}", other)),
        }
    }
}

// ==========================================
// 分配模式 (Allocation Mode)
// ==========================================
// energetico: 能效优先, 按单位吨位发电量填充目标
// volumetrico: 体积配比, 按固/液/粪浆目标比例分配吨位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationMode {
    #[serde(rename = "energetico")]
    Energetic,
    #[serde(rename = "volumetrico")]
    Volumetric,
}

impl AllocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationMode::Energetic => "energetico",
            AllocationMode::Volumetric => "volumetrico",
        }
    }
}

impl Default for AllocationMode {
    fn default() -> Self {
        AllocationMode::Energetic
    }
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AllocationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "energetico" | "energético" => Ok(AllocationMode::Energetic),
            "volumetrico" | "volumétrico" => Ok(AllocationMode::Volumetric),
            other => Err(format!("未知分配模式: {}", other)),
        }
    }
}

// ==========================================
// 非致命告警 (Recipe Warning)
// ==========================================
// 红线: 除配置校验外, 任何单物料级别的异常都降级为告警,
//       调用方始终拿到一个结构完整的配料结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecipeWarning {
    /// 物料缺少化验成分数据, 不参与排序
    InsufficientData { material: String },

    /// 物料计算产能为 0, 不参与分配
    ZeroYield { material: String },

    /// 评分调整器内部失败, 对该物料按未调整处理
    AdjusterFailure { adjuster: String, material: String },

    /// 校正阶段受库存上限约束, 该行未按比例缩放
    UnscalableLine { material: String, factor: f64 },

    /// 全部物料被排除, 输出空配料方案
    EmptyRecipe,
}

impl fmt::Display for RecipeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeWarning::InsufficientData { material } => {
                write!(f, "物料缺少成分数据, 已排除: {}", material)
            }
            RecipeWarning::ZeroYield { material } => {
                write!(f, "物料计算产能为 0, 已排除: {}", material)
            }
            RecipeWarning::AdjusterFailure { adjuster, material } => {
                write!(f, "调整器 {} 对物料 {} 失败, 按未调整处理", adjuster, material)
            }
            RecipeWarning::UnscalableLine { material, factor } => {
                write!(f, "库存不足, 无法按比例 {:.3} 缩放: {}", factor, material)
            }
            RecipeWarning::EmptyRecipe => write!(f, "无可用物料, 输出空配料方案"),
        }
    }
}
