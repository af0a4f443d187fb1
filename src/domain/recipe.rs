// ==========================================
// 沼气电站配料优化引擎 - 配料方案领域模型
// ==========================================
// 用途: 引擎输出, 按 JSON 契约序列化 {receta, resumen}
// 红线: 结果为单次调用的值对象, 引擎不持有任何跨调用状态
// ==========================================

use crate::domain::types::{AllocationMode, MaterialCategory, RecipeWarning};
use serde::{Deserialize, Serialize};

/// 金额类字段统一保留 2 位小数 (与前端展示口径一致)
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// 百分比类字段统一保留 1 位小数
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ==========================================
// AllocationLine - 单物料投料行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    // ===== 标识 =====
    #[serde(rename = "material")]
    pub material: String, // 物料名称
    #[serde(rename = "tipo")]
    pub category: MaterialCategory, // 物料类别

    // ===== 投料量 =====
    #[serde(rename = "toneladas")]
    pub tonnes: f64, // 投料吨位, 0 ≤ tonnes ≤ stock_available_t
    #[serde(rename = "stock_disponible")]
    pub stock_available_t: f64, // 该物料当前可用库存 (t)

    // ===== 能量口径 =====
    #[serde(rename = "kwh_por_tn")]
    pub kwh_per_tonne: f64, // 分配采用的电产率 (调整器生效后)
    #[serde(rename = "kwh_total")]
    pub kwh_total: f64, // tonnes × kwh_per_tonne
    #[serde(rename = "m3_biogas")]
    pub biogas_m3: f64, // 沼气量 (m³)
    #[serde(rename = "m3_ch4")]
    pub ch4_m3: f64, // 甲烷量 (m³)

    // ===== 热能口径 =====
    #[serde(rename = "potencia_calorifica_kw")]
    pub thermal_power_kw: f64, // 热功率 (kW)
    #[serde(rename = "energia_termica_total_kwh")]
    pub thermal_energy_kwh: f64, // 热能总量 (kWh)
    #[serde(rename = "poder_calorifico_biogas")]
    pub biogas_calorific_kwh_m3: f64, // 沼气热值 (kWh/m³)

    // ===== 化验成分快照 =====
    #[serde(rename = "st_pct")]
    pub st_pct: f64,
    #[serde(rename = "sv_pct")]
    pub sv_pct: f64,
    #[serde(rename = "svt_pct")]
    pub svt_pct: f64,
    #[serde(rename = "carbohidratos")]
    pub carbohydrates_pct: f64,
    #[serde(rename = "lipidos")]
    pub lipids_pct: f64,
    #[serde(rename = "proteinas")]
    pub proteins_pct: f64,
    #[serde(rename = "densidad")]
    pub density: f64,

    // ===== 聚合阶段派生 =====
    #[serde(rename = "porcentaje_mezcla")]
    pub mix_percentage: f64, // 占总吨位百分比, 全表合计 100
}

// ==========================================
// CategoryProportions - 固/液/粪浆类别口径
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProportions {
    #[serde(rename = "toneladas_solidos")]
    pub solids_t: f64,
    #[serde(rename = "toneladas_liquidos")]
    pub liquids_t: f64,
    #[serde(rename = "toneladas_purin")]
    pub slurry_t: f64,
    #[serde(rename = "porcentaje_solidos")]
    pub solids_pct: f64,
    #[serde(rename = "porcentaje_liquidos")]
    pub liquids_pct: f64,
    #[serde(rename = "porcentaje_purin")]
    pub slurry_pct: f64,
}

// ==========================================
// RecipeSummary - 方案汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSummary {
    #[serde(rename = "modo")]
    pub mode: AllocationMode, // 分配模式回显
    #[serde(rename = "kwh_objetivo")]
    pub target_kwh: f64, // 目标发电量回显
    #[serde(rename = "kwh_generado")]
    pub kwh_generated: f64, // Σ line.kwh_total
    #[serde(rename = "cumplimiento")]
    pub fulfillment_pct: f64, // kwh_generated / target × 100
    #[serde(rename = "total_toneladas")]
    pub tonnes_total: f64,
    #[serde(rename = "total_biogas_m3")]
    pub biogas_total_m3: f64,
    #[serde(rename = "total_ch4_m3")]
    pub ch4_total_m3: f64,
    #[serde(rename = "porcentaje_metano")]
    pub ch4_pct_achieved: f64, // 实际甲烷浓度 = ch4 / biogas × 100
    #[serde(rename = "total_potencia_calorifica_kw")]
    pub thermal_power_total_kw: f64,
    #[serde(rename = "total_energia_termica_kwh")]
    pub thermal_energy_total_kwh: f64,
    #[serde(rename = "horas_operacion")]
    pub operating_hours: f64, // 总沼气量 / 发动机消耗量
    #[serde(rename = "dias_operacion")]
    pub operating_days: f64,
    #[serde(rename = "potencia_motor")]
    pub engine_power_kw: f64, // 发动机功率回显
    #[serde(rename = "porcentaje_ch4")]
    pub target_ch4_pct: f64, // 目标甲烷浓度回显
    #[serde(rename = "m3_purin")]
    pub slurry_volume_m3: f64, // 粪浆接收量回显
    #[serde(rename = "incluir_purin")]
    pub include_slurry: bool,
    #[serde(rename = "proporciones")]
    pub proportions: CategoryProportions,
}

// ==========================================
// RecipeResult - 引擎输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeResult {
    #[serde(rename = "receta")]
    pub lines: Vec<AllocationLine>,
    #[serde(rename = "resumen")]
    pub summary: RecipeSummary,
    #[serde(rename = "advertencias")]
    pub warnings: Vec<RecipeWarning>,
}

impl RecipeResult {
    /// 方案是否为空 (全部物料被排除时的降级输出)
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
