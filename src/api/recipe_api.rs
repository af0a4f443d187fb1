// ==========================================
// 沼气电站配料优化引擎 - 配料 API
// ==========================================
// 职责: 外部 JSON 请求契约 ↔ 引擎配置的转换,
//       以及管线的同步调用入口
// 红线: 字段命名遵循既有线上契约 (西语), 不得更名;
//       缺省值与线上表单口径一致
// ==========================================

use crate::api::error::ApiError;
use crate::config::{engine_profile, EngineConfiguration};
use crate::domain::types::AllocationMode;
use crate::domain::{Material, RecipeResult};
use crate::engine::orchestrator::{MaterialSuggestion, RecipeOrchestrator};
use serde::{Deserialize, Serialize};
use tracing::info;

// ==========================================
// RecipeRequest - 配料请求 (线上 JSON 契约)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequest {
    #[serde(rename = "kwh_objetivo", default = "default_target_kwh")]
    pub target_kwh: f64,
    #[serde(rename = "porcentaje_ch4", default = "default_ch4_pct")]
    pub target_ch4_pct: f64,
    #[serde(rename = "m3_purin", default)]
    pub slurry_volume_m3: f64,
    #[serde(rename = "modo", default)]
    pub mode: AllocationMode,
    #[serde(rename = "pct_solidos_kw", default = "default_solids_pct")]
    pub solids_pct: f64,
    #[serde(rename = "pct_liquidos_kw", default = "default_liquids_pct")]
    pub liquids_pct: f64,
    #[serde(rename = "pct_purin_kw", default)]
    pub slurry_pct: f64,
    #[serde(rename = "incluir_purin", default = "default_true")]
    pub include_slurry: bool,
    #[serde(rename = "num_materiales", default = "default_max_materials")]
    pub max_materials: usize,
    #[serde(rename = "consumo_motor", default = "default_consumption")]
    pub engine_consumption_l_s: f64,
    #[serde(rename = "potencia_motor", default = "default_power")]
    pub engine_power_kw: f64,
    #[serde(rename = "modelos_seleccionados", default)]
    pub selected_adjusters: Vec<String>,
}

fn default_target_kwh() -> f64 {
    engine_profile::POWER_KW * 24.0
}

fn default_ch4_pct() -> f64 {
    engine_profile::REFERENCE_CH4_PCT
}

fn default_solids_pct() -> f64 {
    60.0
}

fn default_liquids_pct() -> f64 {
    40.0
}

fn default_true() -> bool {
    true
}

fn default_max_materials() -> usize {
    5
}

fn default_consumption() -> f64 {
    engine_profile::CONSUMPTION_L_S
}

fn default_power() -> f64 {
    engine_profile::POWER_KW
}

impl Default for RecipeRequest {
    fn default() -> Self {
        // 等价于空 JSON 对象反序列化的结果
        Self {
            target_kwh: default_target_kwh(),
            target_ch4_pct: default_ch4_pct(),
            slurry_volume_m3: 0.0,
            mode: AllocationMode::default(),
            solids_pct: default_solids_pct(),
            liquids_pct: default_liquids_pct(),
            slurry_pct: 0.0,
            include_slurry: true,
            max_materials: default_max_materials(),
            engine_consumption_l_s: default_consumption(),
            engine_power_kw: default_power(),
            selected_adjusters: Vec::new(),
        }
    }
}

impl RecipeRequest {
    /// 由 JSON 字符串解析请求
    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 请求 → 引擎配置
    pub fn to_configuration(&self) -> EngineConfiguration {
        EngineConfiguration {
            target_kwh: self.target_kwh,
            target_ch4_pct: self.target_ch4_pct,
            slurry_volume_m3: self.slurry_volume_m3,
            include_slurry: self.include_slurry,
            mode: self.mode,
            solids_pct: self.solids_pct,
            liquids_pct: self.liquids_pct,
            slurry_pct: self.slurry_pct,
            max_materials: self.max_materials,
            selected_adjusters: self.selected_adjusters.clone(),
            engine_consumption_l_s: self.engine_consumption_l_s,
            engine_power_kw: self.engine_power_kw,
        }
    }
}

// ==========================================
// RecipeApi - 对外调用入口
// ==========================================
pub struct RecipeApi {
    orchestrator: RecipeOrchestrator,
}

impl Default for RecipeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeApi {
    pub fn new() -> Self {
        Self {
            orchestrator: RecipeOrchestrator::new(),
        }
    }

    pub fn with_orchestrator(orchestrator: RecipeOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// 计算配料方案
    ///
    /// # 参数
    /// - `materials`: 物料快照 (目录 + 库存已合并)
    /// - `request`: 线上契约请求
    pub fn calculate(
        &self,
        materials: &[Material],
        request: &RecipeRequest,
    ) -> Result<RecipeResult, ApiError> {
        let config = request.to_configuration();
        info!(mode = %config.mode, target_kwh = config.target_kwh, "收到配料请求");
        Ok(self.orchestrator.generate(materials, &config)?)
    }

    /// 计算配料方案并序列化为响应 JSON
    pub fn calculate_json(
        &self,
        materials: &[Material],
        raw_request: &str,
    ) -> Result<String, ApiError> {
        let request = RecipeRequest::from_json(raw_request)?;
        let result = self.calculate(materials, &request)?;
        Ok(serde_json::to_string_pretty(&result)?)
    }

    /// 推荐当前库存下产率最高的前 N 个物料
    pub fn suggest(
        &self,
        materials: &[Material],
        request: &RecipeRequest,
        count: usize,
    ) -> Result<Vec<MaterialSuggestion>, ApiError> {
        let config = request.to_configuration();
        Ok(self.orchestrator.suggest(materials, &config, count)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_takes_defaults() {
        let request = RecipeRequest::from_json("{}").unwrap();
        assert_eq!(request, RecipeRequest::default());
        assert_eq!(request.target_kwh, 1239.0 * 24.0);
        assert_eq!(request.max_materials, 5);
        assert!(request.include_slurry);
    }

    #[test]
    fn test_spanish_field_names_accepted() {
        let raw = r#"{
            "kwh_objetivo": 10000,
            "porcentaje_ch4": 60,
            "m3_purin": 12.5,
            "modo": "volumetrico",
            "pct_solidos_kw": 50,
            "pct_liquidos_kw": 30,
            "pct_purin_kw": 20,
            "incluir_purin": true,
            "num_materiales": 3,
            "modelos_seleccionados": ["cain_sistema"]
        }"#;
        let request = RecipeRequest::from_json(raw).unwrap();
        assert_eq!(request.target_kwh, 10000.0);
        assert_eq!(request.mode, AllocationMode::Volumetric);
        assert_eq!(request.slurry_pct, 20.0);
        assert_eq!(request.selected_adjusters, vec!["cain_sistema"]);

        let config = request.to_configuration();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_materials, 3);
    }

    #[test]
    fn test_malformed_json_is_client_error() {
        let err = RecipeRequest::from_json("{ no es json").unwrap_err();
        assert!(err.is_client_error());
    }
}
