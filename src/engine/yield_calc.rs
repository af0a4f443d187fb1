// ==========================================
// 沼气电站配料优化引擎 - 电产率计算器
// ==========================================
// 职责: 纯换算, 沼气产率 + 发动机参数 + 目标甲烷浓度
//       → 单位吨位电/甲烷/热指标
// 红线: 本计算器永不失败, 退化输入 (消耗/功率 ≤ 0)
//       一律输出全零指标
// ==========================================

use crate::config::{engine_profile, EngineConfiguration};
use crate::domain::{round2, Material};

// ==========================================
// YieldMetrics - 单位吨位产能指标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct YieldMetrics {
    pub biogas_m3_per_tonne: f64,         // 沼气产率 (m³/t), 原样回显
    pub ch4_m3_per_tonne: f64,            // 甲烷产率 (m³/t), 按目标浓度折算
    pub operating_hours: f64,             // 每吨可支撑的满负荷运行小时
    pub kwh_per_tonne: f64,               // 电产率 (kWh/t)
    pub biogas_calorific_kwh_m3: f64,     // 沼气热值 (kWh/m³)
    pub thermal_energy_kwh_per_tonne: f64, // 热能总量 (kWh/t)
    pub thermal_power_kw_per_tonne: f64,  // 热功率 (kW/t)
}

// ==========================================
// YieldCalculator - 电产率计算器
// ==========================================
pub struct YieldCalculator {
    // 无状态引擎, 不需要注入依赖
}

impl Default for YieldCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl YieldCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算单位吨位产能指标
    ///
    /// 换算链:
    /// 1) consumption_m3_h = (consumption_l_s / 1000) × 3600
    /// 2) operating_hours = biogas_m3_per_tonne / consumption_m3_h
    /// 3) kwh_per_tonne = power_kw × operating_hours
    /// 4) ch4_m3_per_tonne = biogas_m3_per_tonne × target_ch4 / 100
    /// 5) 热值按 65% CH4 参考浓度线性折算, 热功率计入热效率
    ///
    /// # 参数
    /// - `material`: 物料 (只取沼气产率)
    /// - `config`: 引擎配置 (发动机参数 + 目标甲烷浓度)
    ///
    /// # 返回
    /// 产能指标; 消耗或功率 ≤ 0 时为全零
    pub fn compute(&self, material: &Material, config: &EngineConfiguration) -> YieldMetrics {
        self.compute_raw(material.biogas_m3_per_tonne, config)
    }

    /// 按裸沼气产率计算 (供粪浆直供路径复用)
    pub fn compute_raw(&self, biogas_m3_per_tonne: f64, config: &EngineConfiguration) -> YieldMetrics {
        // 退化输入: 不报错, 降级为全零
        if config.engine_consumption_l_s <= 0.0 || config.engine_power_kw <= 0.0 {
            return YieldMetrics {
                biogas_m3_per_tonne,
                ..YieldMetrics::default()
            };
        }

        let consumption_m3_h = config.consumption_m3_per_h();
        let operating_hours = if consumption_m3_h > 0.0 {
            biogas_m3_per_tonne / consumption_m3_h
        } else {
            0.0
        };
        let kwh_per_tonne = config.engine_power_kw * operating_hours;
        let ch4_m3_per_tonne = biogas_m3_per_tonne * (config.target_ch4_pct / 100.0);

        // 热值按参考浓度 65% CH4 线性折算
        let calorific = engine_profile::BIOGAS_CALORIFIC_KWH_M3
            * (config.target_ch4_pct / engine_profile::REFERENCE_CH4_PCT);
        let thermal_energy = biogas_m3_per_tonne * calorific;
        let thermal_power = if operating_hours > 0.0 {
            thermal_energy * engine_profile::THERMAL_EFFICIENCY / operating_hours
        } else {
            0.0
        };

        YieldMetrics {
            biogas_m3_per_tonne,
            ch4_m3_per_tonne: round2(ch4_m3_per_tonne),
            operating_hours: (operating_hours * 1000.0).round() / 1000.0,
            kwh_per_tonne: round2(kwh_per_tonne),
            biogas_calorific_kwh_m3: round2(calorific),
            thermal_energy_kwh_per_tonne: round2(thermal_energy),
            thermal_power_kw_per_tonne: round2(thermal_power),
        }
    }
}
