// ==========================================
// 沼气电站配料优化引擎 - 物料领域模型
// ==========================================
// 用途: 目录层写入, 引擎层只读
// 红线: 单次调用内的评分/产能调整只写在 ScoredMaterial
//       副本上, 绝不回写共享目录快照
// ==========================================

use crate::domain::types::MaterialCategory;
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 物料基础物性 (单次调用内不可变)
// ==========================================
// 序列化字段名与前端 / 物料基础表 JSON 契约一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    // ===== 标识 =====
    #[serde(rename = "nombre")]
    pub name: String, // 物料名称 (唯一标识)
    #[serde(rename = "tipo")]
    pub category: MaterialCategory, // 物料类别

    // ===== 化验成分 (百分比, [0,100]) =====
    #[serde(rename = "st_pct")]
    pub st_pct: f64, // 总固体 ST
    #[serde(rename = "sv_pct")]
    pub sv_pct: f64, // 挥发性固体 SV
    #[serde(rename = "svt_pct")]
    pub svt_pct: f64, // ST × SV
    #[serde(rename = "carbohidratos")]
    pub carbohydrates_pct: f64, // 碳水化合物
    #[serde(rename = "lipidos")]
    pub lipids_pct: f64, // 脂类
    #[serde(rename = "proteinas")]
    pub proteins_pct: f64, // 蛋白质

    // ===== 物性与基准产能 =====
    #[serde(rename = "densidad")]
    pub density: f64, // 密度 (t/m³), > 0
    #[serde(rename = "m3_biogas_por_tn")]
    pub biogas_m3_per_tonne: f64, // 沼气产率 (m³/t)
    #[serde(rename = "kw_por_tn")]
    pub baseline_kwh_per_tonne: f64, // 基准电产率 (kWh/t)
    #[serde(rename = "ch4_por_tn")]
    pub baseline_ch4_m3_per_tonne: f64, // 基准甲烷产率 (m³/t)
    #[serde(rename = "porcentaje_metano")]
    pub methane_pct: f64, // 物料自身沼气甲烷浓度 (%)

    // ===== 库存快照 =====
    #[serde(rename = "stock_disponible")]
    pub stock_available_t: f64, // 当前可用库存 (t)
}

impl Material {
    /// 是否具备参与排序所需的化验成分数据
    ///
    /// ST/SV 同时为 0 视为未录入化验数据
    pub fn has_lab_data(&self) -> bool {
        self.st_pct > 0.0 || self.sv_pct > 0.0
    }

    /// 是否可进入分配流程 (库存与基准产率均为正)
    pub fn is_allocatable(&self) -> bool {
        self.stock_available_t > 0.0 && self.biogas_m3_per_tonne > 0.0
    }
}

// ==========================================
// ScoredMaterial - 单次调用的物料工作副本
// ==========================================
// 生命周期: 仅在一次引擎调用内, 随结果丢弃
// 承载: 计算产能 + 调整器评分, 对应共享目录的"脏字段"
//       在本设计中被隔离到此副本
#[derive(Debug, Clone)]
pub struct ScoredMaterial {
    pub material: Material,

    // ===== 产能计算结果 (Yield Calculator 写入) =====
    pub kwh_per_tonne: f64,    // 计算电产率 (kWh/t), 未经调整
    pub ch4_m3_per_tonne: f64, // 目标甲烷浓度下的甲烷产率 (m³/t)
    pub thermal_power_kw_per_tonne: f64,   // 热功率 (kW/t)
    pub thermal_energy_kwh_per_tonne: f64, // 热能 (kWh/t)
    pub biogas_calorific_kwh_m3: f64,      // 沼气热值 (kWh/m³)

    // ===== 调整器输出 (Adjuster Registry 写入) =====
    pub score_ml: f64,            // 排序评分 (基础评分 + 各调整器贡献)
    pub kwh_per_tonne_used: f64,  // 实际用于分配的电产率
    pub adjusted: bool,           // 是否有调整器成功生效
}

impl ScoredMaterial {
    /// 从目录物料构造工作副本 (评分与产能字段置零, 由管线逐步填写)
    pub fn new(material: Material) -> Self {
        Self {
            material,
            kwh_per_tonne: 0.0,
            ch4_m3_per_tonne: 0.0,
            thermal_power_kw_per_tonne: 0.0,
            thermal_energy_kwh_per_tonne: 0.0,
            biogas_calorific_kwh_m3: 0.0,
            score_ml: 0.0,
            kwh_per_tonne_used: 0.0,
            adjusted: false,
        }
    }

    /// 按投料吨位生成配料行 (各能量字段按单位吨位指标展开)
    ///
    /// mix_percentage 留待聚合阶段统一回填
    pub fn allocation_line(&self, tonnes: f64) -> crate::domain::recipe::AllocationLine {
        use crate::domain::recipe::round2;

        let m = &self.material;
        crate::domain::recipe::AllocationLine {
            material: m.name.clone(),
            category: m.category,
            tonnes: round2(tonnes),
            stock_available_t: m.stock_available_t,
            kwh_per_tonne: self.kwh_per_tonne_used,
            kwh_total: round2(tonnes * self.kwh_per_tonne_used),
            biogas_m3: round2(tonnes * m.biogas_m3_per_tonne),
            ch4_m3: round2(tonnes * self.ch4_m3_per_tonne),
            thermal_power_kw: round2(tonnes * self.thermal_power_kw_per_tonne),
            thermal_energy_kwh: round2(tonnes * self.thermal_energy_kwh_per_tonne),
            biogas_calorific_kwh_m3: self.biogas_calorific_kwh_m3,
            st_pct: m.st_pct,
            sv_pct: m.sv_pct,
            svt_pct: m.svt_pct,
            carbohydrates_pct: m.carbohydrates_pct,
            lipids_pct: m.lipids_pct,
            proteins_pct: m.proteins_pct,
            density: m.density,
            mix_percentage: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.material.name
    }

    pub fn category(&self) -> MaterialCategory {
        self.material.category
    }

    pub fn stock_available_t(&self) -> f64 {
        self.material.stock_available_t
    }
}
