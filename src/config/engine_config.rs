// ==========================================
// 沼气电站配料优化引擎 - 引擎配置
// ==========================================
// 职责: 单次调用的全部参数, 带命名默认值
// 红线: 配置只来自此结构体, 引擎不读任何环境/全局状态
// ==========================================

use crate::domain::types::AllocationMode;
use crate::engine::error::EngineError;
use serde::{Deserialize, Serialize};

// ==========================================
// 发动机参考参数 (Jenbacher J420 热电机组)
// ==========================================
pub mod engine_profile {
    /// 额定电功率 (kW)
    pub const POWER_KW: f64 = 1239.0;
    /// 沼气消耗量 (L/s)
    pub const CONSUMPTION_L_S: f64 = 170.0;
    /// 电效率
    pub const ELECTRICAL_EFFICIENCY: f64 = 0.42;
    /// 热效率
    pub const THERMAL_EFFICIENCY: f64 = 0.45;
    /// 沼气热值参考值 (kWh/m³, 按 65% CH4 标定)
    pub const BIOGAS_CALORIFIC_KWH_M3: f64 = 6.0;
    /// 热值标定甲烷浓度 (%)
    pub const REFERENCE_CH4_PCT: f64 = 65.0;
}

// ==========================================
// EngineConfiguration - 引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfiguration {
    // ===== 目标 =====
    pub target_kwh: f64,     // 目标发电量 (kWh), > 0
    pub target_ch4_pct: f64, // 目标甲烷浓度 (%), (0,100]

    // ===== 粪浆供给 =====
    pub slurry_volume_m3: f64, // 接收粪浆体积 (m³), ≥ 0
    pub include_slurry: bool,  // 是否将粪浆纳入配料

    // ===== 分配策略 =====
    pub mode: AllocationMode,
    pub solids_pct: f64,  // 体积配比模式固体目标百分比, ≥ 0
    pub liquids_pct: f64, // 体积配比模式液体目标百分比, ≥ 0
    pub slurry_pct: f64,  // 体积配比模式粪浆目标百分比, ≥ 0
    pub max_materials: usize, // 参与配料的物料上限, ≥ 1

    // ===== 评分调整器 =====
    pub selected_adjusters: Vec<String>, // 按声明顺序依次应用

    // ===== 发动机参数 =====
    pub engine_consumption_l_s: f64, // 沼气消耗量 (L/s), > 0
    pub engine_power_kw: f64,        // 电功率 (kW), > 0
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            target_kwh: engine_profile::POWER_KW * 24.0,
            target_ch4_pct: engine_profile::REFERENCE_CH4_PCT,
            slurry_volume_m3: 0.0,
            include_slurry: true,
            mode: AllocationMode::Energetic,
            solids_pct: 60.0,
            liquids_pct: 40.0,
            slurry_pct: 0.0,
            max_materials: 5,
            selected_adjusters: Vec::new(),
            engine_consumption_l_s: engine_profile::CONSUMPTION_L_S,
            engine_power_kw: engine_profile::POWER_KW,
        }
    }
}

impl EngineConfiguration {
    /// 配置校验 (致命错误, 校验失败不进入计算)
    ///
    /// # 返回
    /// - Ok(()): 配置合法
    /// - Err(EngineError::Validation): 字段越界, 附带字段名与实际值
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.target_kwh <= 0.0 {
            return Err(EngineError::validation("target_kwh", self.target_kwh));
        }
        if self.engine_consumption_l_s <= 0.0 {
            return Err(EngineError::validation(
                "engine_consumption_l_s",
                self.engine_consumption_l_s,
            ));
        }
        if self.engine_power_kw <= 0.0 {
            return Err(EngineError::validation(
                "engine_power_kw",
                self.engine_power_kw,
            ));
        }
        if self.max_materials < 1 {
            return Err(EngineError::validation(
                "max_materials",
                self.max_materials as f64,
            ));
        }
        Ok(())
    }

    /// 发动机沼气消耗量换算 (L/s → m³/h)
    pub fn consumption_m3_per_h(&self) -> f64 {
        (self.engine_consumption_l_s / 1000.0) * 3600.0
    }
}
