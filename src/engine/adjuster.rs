// ==========================================
// 沼气电站配料优化引擎 - 评分调整器
// ==========================================
// 职责: 按 id 注册的启发式评分调整, 对物料的排序评分
//       与实际采用电产率做确定性修正
// 红线: 调整器永不向外抛错; 单物料失败按"未调整"处理,
//       未知 id 解析为直通 (no-op)
// 红线: 禁止任何未播种随机性, 相同输入必须可复现
// ==========================================

use crate::domain::types::RecipeWarning;
use crate::domain::ScoredMaterial;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

// ==========================================
// 调整器错误 (仅在注册表内部消化, 不出引擎)
// ==========================================
#[derive(Error, Debug)]
pub enum AdjusterError {
    #[error("调整器内部失败: {0}")]
    Internal(String),
}

// ==========================================
// Adjustment - 单物料调整输出
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    /// 调整后电产率 (kWh/t); None 表示只贡献评分, 不改产率
    pub adjusted_kwh_per_tonne: Option<f64>,
    /// 置信度, [0,1]
    pub confidence: f64,
    /// 排序评分增量
    pub score_delta: f64,
}

// ==========================================
// ScoreAdjuster - 调整器能力契约
// ==========================================
// 契约: adjust 只读物料副本, 返回 Ok(None) 表示对该物料跳过
pub trait ScoreAdjuster: Send + Sync {
    fn id(&self) -> &str;

    fn adjust(
        &self,
        material: &ScoredMaterial,
        target_kwh: f64,
        target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError>;
}

// ==========================================
// NoOpAdjuster - 直通调整器 (未知 id 的归宿)
// ==========================================
pub struct NoOpAdjuster;

impl ScoreAdjuster for NoOpAdjuster {
    fn id(&self) -> &str {
        "noop"
    }

    fn adjust(
        &self,
        _material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        Ok(None)
    }
}

// ==========================================
// GeneticAdjuster - 适应度启发式
// ==========================================
// 适应度 = 电产率×0.4 + 物料甲烷浓度×0.3 + 库存×0.3
// 产率增益: 1.0 ~ 1.1 (适应度/10000 × 0.1, 封顶)
pub struct GeneticAdjuster;

impl ScoreAdjuster for GeneticAdjuster {
    fn id(&self) -> &str {
        "algoritmo_genetico"
    }

    fn adjust(
        &self,
        material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        let m = &material.material;
        let fitness = material.kwh_per_tonne * 0.4
            + m.methane_pct * 0.3
            + m.stock_available_t * 0.3;

        let adjusted = if material.kwh_per_tonne > 0.0 {
            let factor = (1.0 + (fitness / 10000.0) * 0.1).min(1.1);
            Some(material.kwh_per_tonne * factor)
        } else {
            None
        };

        Ok(Some(Adjustment {
            adjusted_kwh_per_tonne: adjusted,
            confidence: 0.85,
            score_delta: fitness,
        }))
    }
}

// ==========================================
// CainAdjuster - 成分评分启发式
// ==========================================
// 评分 = 电产率×0.5 + 物料甲烷浓度×0.3 + 库存×0.2
// 产率增益: 1.0 ~ 1.12
pub struct CainAdjuster;

impl ScoreAdjuster for CainAdjuster {
    fn id(&self) -> &str {
        "cain_sistema"
    }

    fn adjust(
        &self,
        material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        let m = &material.material;
        let score = material.kwh_per_tonne * 0.5
            + m.methane_pct * 0.3
            + m.stock_available_t * 0.2;

        let adjusted = if material.kwh_per_tonne > 0.0 {
            let factor = (1.0 + (score / 10000.0) * 0.12).min(1.12);
            Some(material.kwh_per_tonne * factor)
        } else {
            None
        };

        Ok(Some(Adjustment {
            adjusted_kwh_per_tonne: adjusted,
            confidence: 0.97,
            score_delta: score,
        }))
    }
}

// ==========================================
// RandomForestAdjuster - 营养成分启发式 (保守)
// ==========================================
// 产率增益: 1.0 ~ 1.15, 按碳水+脂类+蛋白+密度之和折算
pub struct RandomForestAdjuster;

impl ScoreAdjuster for RandomForestAdjuster {
    fn id(&self) -> &str {
        "random_forest"
    }

    fn adjust(
        &self,
        material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        // 无计算产率的物料跳过
        if material.kwh_per_tonne <= 0.0 {
            return Ok(None);
        }

        let m = &material.material;
        let composition =
            m.carbohydrates_pct + m.lipids_pct + m.proteins_pct + m.density;
        let factor = if composition > 0.0 {
            (1.0 + (composition / 1000.0) * 0.15).min(1.15)
        } else {
            1.0
        };

        Ok(Some(Adjustment {
            adjusted_kwh_per_tonne: Some(material.kwh_per_tonne * factor),
            confidence: 0.88,
            score_delta: factor * 0.88,
        }))
    }
}

// ==========================================
// BayesianAdjuster - 营养成分启发式 (上限更高)
// ==========================================
// 产率增益: 1.0 ~ 1.2
pub struct BayesianAdjuster;

impl ScoreAdjuster for BayesianAdjuster {
    fn id(&self) -> &str {
        "optimizacion_bayesiana"
    }

    fn adjust(
        &self,
        material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        if material.kwh_per_tonne <= 0.0 {
            return Ok(None);
        }

        let m = &material.material;
        let composition =
            m.carbohydrates_pct + m.lipids_pct + m.proteins_pct + m.density;
        let factor = if composition > 0.0 {
            (1.0 + (composition / 1000.0) * 0.2).min(1.2)
        } else {
            1.0
        };

        Ok(Some(Adjustment {
            adjusted_kwh_per_tonne: Some(material.kwh_per_tonne * factor),
            confidence: 0.91,
            score_delta: factor * 0.91,
        }))
    }
}

// ==========================================
// PrecisionFallbackAdjuster - 精度降级调整器
// ==========================================
// 外部预测系统不可用时的替身: 只按标称精度加权评分,
// 不改动产率
pub struct PrecisionFallbackAdjuster {
    id: String,
    precision: f64,
}

impl PrecisionFallbackAdjuster {
    pub fn new(id: &str, precision: f64) -> Self {
        Self {
            id: id.to_string(),
            precision,
        }
    }
}

impl ScoreAdjuster for PrecisionFallbackAdjuster {
    fn id(&self) -> &str {
        &self.id
    }

    fn adjust(
        &self,
        material: &ScoredMaterial,
        _target_kwh: f64,
        _target_ch4_pct: f64,
    ) -> Result<Option<Adjustment>, AdjusterError> {
        Ok(Some(Adjustment {
            adjusted_kwh_per_tonne: None,
            confidence: 0.0,
            score_delta: material.kwh_per_tonne * self.precision,
        }))
    }
}

// ==========================================
// AdjusterRegistry - 调整器注册表
// ==========================================
pub struct AdjusterRegistry {
    adjusters: HashMap<String, Arc<dyn ScoreAdjuster>>,
    noop: Arc<dyn ScoreAdjuster>,
}

impl Default for AdjusterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl AdjusterRegistry {
    /// 空注册表 (任何 id 都解析为 no-op)
    pub fn empty() -> Self {
        Self {
            adjusters: HashMap::new(),
            noop: Arc::new(NoOpAdjuster),
        }
    }

    /// 内置调整器全集
    ///
    /// xgboost / redes_neuronales 的外部预测系统不在本引擎内,
    /// 注册为精度降级调整器 (标称精度 0.95 / 0.92)
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(GeneticAdjuster));
        registry.register(Arc::new(CainAdjuster));
        registry.register(Arc::new(RandomForestAdjuster));
        registry.register(Arc::new(BayesianAdjuster));
        registry.register(Arc::new(PrecisionFallbackAdjuster::new("xgboost", 0.95)));
        registry.register(Arc::new(PrecisionFallbackAdjuster::new(
            "redes_neuronales",
            0.92,
        )));
        registry
    }

    pub fn register(&mut self, adjuster: Arc<dyn ScoreAdjuster>) {
        self.adjusters.insert(adjuster.id().to_string(), adjuster);
    }

    /// 按 id 解析调整器; 未知 id 返回 no-op 直通
    pub fn get(&self, id: &str) -> Arc<dyn ScoreAdjuster> {
        match self.adjusters.get(id) {
            Some(adjuster) => Arc::clone(adjuster),
            None => {
                debug!(adjuster_id = %id, "未知调整器 id, 解析为 no-op");
                Arc::clone(&self.noop)
            }
        }
    }

    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.adjusters.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// 按声明顺序对全部物料副本应用所选调整器
    ///
    /// 累积规则:
    /// - score_ml += 各调整器的评分增量
    /// - kwh_per_tonne_used = 最后一个成功产率调整的值, 无则保持基准
    ///
    /// # 返回
    /// 非致命告警列表 (单物料失败不中断整体)
    pub fn apply(
        &self,
        materials: &mut [ScoredMaterial],
        selected: &[String],
        target_kwh: f64,
        target_ch4_pct: f64,
    ) -> Vec<RecipeWarning> {
        let mut warnings = Vec::new();

        for id in selected {
            let adjuster = self.get(id);
            for material in materials.iter_mut() {
                match adjuster.adjust(material, target_kwh, target_ch4_pct) {
                    Ok(Some(adjustment)) => {
                        if !Self::is_valid(&adjustment) {
                            debug!(
                                adjuster_id = %id,
                                material = %material.name(),
                                "调整器返回非法数据, 按未调整处理"
                            );
                            warnings.push(RecipeWarning::AdjusterFailure {
                                adjuster: id.clone(),
                                material: material.name().to_string(),
                            });
                            continue;
                        }

                        material.score_ml += adjustment.score_delta;
                        if let Some(kwh) = adjustment.adjusted_kwh_per_tonne {
                            material.kwh_per_tonne_used = kwh;
                            material.adjusted = true;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        debug!(
                            adjuster_id = %id,
                            material = %material.name(),
                            error = %err,
                            "调整器内部失败, 按未调整处理"
                        );
                        warnings.push(RecipeWarning::AdjusterFailure {
                            adjuster: id.clone(),
                            material: material.name().to_string(),
                        });
                    }
                }
            }
        }

        warnings
    }

    /// 调整输出合法性: 有限值, 置信度 [0,1], 产率非负
    fn is_valid(adjustment: &Adjustment) -> bool {
        if !adjustment.score_delta.is_finite() {
            return false;
        }
        if !(0.0..=1.0).contains(&adjustment.confidence) {
            return false;
        }
        match adjustment.adjusted_kwh_per_tonne {
            Some(v) => v.is_finite() && v >= 0.0,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MaterialCategory;
    use crate::domain::Material;

    fn scored(name: &str, kwh: f64, stock: f64) -> ScoredMaterial {
        let mut sm = ScoredMaterial::new(Material {
            name: name.to_string(),
            category: MaterialCategory::Solid,
            st_pct: 30.0,
            sv_pct: 90.0,
            svt_pct: 27.0,
            carbohydrates_pct: 55.0,
            lipids_pct: 4.0,
            proteins_pct: 9.0,
            density: 0.75,
            biogas_m3_per_tonne: 400.0,
            baseline_kwh_per_tonne: kwh,
            baseline_ch4_m3_per_tonne: 200.0,
            methane_pct: 54.0,
            stock_available_t: stock,
        });
        sm.kwh_per_tonne = kwh;
        sm.kwh_per_tonne_used = kwh;
        sm
    }

    /// 总是失败的调整器, 用于验证失败隔离
    struct FailingAdjuster;

    impl ScoreAdjuster for FailingAdjuster {
        fn id(&self) -> &str {
            "failing"
        }

        fn adjust(
            &self,
            _material: &ScoredMaterial,
            _target_kwh: f64,
            _target_ch4_pct: f64,
        ) -> Result<Option<Adjustment>, AdjusterError> {
            Err(AdjusterError::Internal("模拟失败".to_string()))
        }
    }

    #[test]
    fn test_builtin_registry_exposes_all_ids() {
        let registry = AdjusterRegistry::with_builtin();
        assert_eq!(
            registry.registered_ids(),
            vec![
                "algoritmo_genetico",
                "cain_sistema",
                "optimizacion_bayesiana",
                "random_forest",
                "redes_neuronales",
                "xgboost",
            ]
        );
    }

    #[test]
    fn test_unknown_id_resolves_to_noop() {
        let registry = AdjusterRegistry::with_builtin();
        let mut materials = vec![scored("maiz", 1200.0, 50.0)];
        let warnings = registry.apply(&mut materials, &["desconocido".to_string()], 10000.0, 65.0);

        assert!(warnings.is_empty());
        assert_eq!(materials[0].score_ml, 0.0);
        assert_eq!(materials[0].kwh_per_tonne_used, 1200.0);
        assert!(!materials[0].adjusted);
    }

    #[test]
    fn test_genetic_adjuster_caps_factor() {
        let adjuster = GeneticAdjuster;
        let sm = scored("maiz", 50000.0, 1000.0);
        let adjustment = adjuster.adjust(&sm, 10000.0, 65.0).unwrap().unwrap();
        // 适应度极大时产率增益封顶 1.1
        let adjusted = adjustment.adjusted_kwh_per_tonne.unwrap();
        assert!((adjusted - 50000.0 * 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_last_successful_adjuster_wins() {
        let registry = AdjusterRegistry::with_builtin();
        let mut materials = vec![scored("maiz", 1000.0, 50.0)];
        let selected = vec![
            "random_forest".to_string(),
            "optimizacion_bayesiana".to_string(),
        ];
        registry.apply(&mut materials, &selected, 10000.0, 65.0);

        // composition = 55 + 4 + 9 + 0.75 = 68.75
        // bayesian factor = 1 + 68.75/1000×0.2 = 1.01375 (最后生效)
        let expected = 1000.0 * (1.0 + (68.75 / 1000.0) * 0.2);
        assert!((materials[0].kwh_per_tonne_used - expected).abs() < 1e-9);
        assert!(materials[0].adjusted);
    }

    #[test]
    fn test_failure_is_isolated_to_warning() {
        let mut registry = AdjusterRegistry::empty();
        registry.register(Arc::new(FailingAdjuster));

        let mut materials = vec![scored("maiz", 1000.0, 50.0), scored("sorgo", 900.0, 30.0)];
        let warnings = registry.apply(&mut materials, &["failing".to_string()], 10000.0, 65.0);

        assert_eq!(warnings.len(), 2);
        // 失败物料保持基准产率
        assert_eq!(materials[0].kwh_per_tonne_used, 1000.0);
        assert_eq!(materials[1].kwh_per_tonne_used, 900.0);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let registry = AdjusterRegistry::with_builtin();
        let selected = vec![
            "algoritmo_genetico".to_string(),
            "cain_sistema".to_string(),
            "xgboost".to_string(),
        ];

        let mut a = vec![scored("maiz", 1200.0, 50.0), scored("sorgo", 900.0, 30.0)];
        let mut b = vec![scored("maiz", 1200.0, 50.0), scored("sorgo", 900.0, 30.0)];
        registry.apply(&mut a, &selected, 10000.0, 65.0);
        registry.apply(&mut b, &selected, 10000.0, 65.0);

        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.score_ml, y.score_ml);
            assert_eq!(x.kwh_per_tonne_used, y.kwh_per_tonne_used);
        }
    }

    #[test]
    fn test_fallback_contributes_score_only() {
        let registry = AdjusterRegistry::with_builtin();
        let mut materials = vec![scored("maiz", 1000.0, 50.0)];
        registry.apply(&mut materials, &["xgboost".to_string()], 10000.0, 65.0);

        assert!((materials[0].score_ml - 950.0).abs() < 1e-9);
        assert_eq!(materials[0].kwh_per_tonne_used, 1000.0);
        assert!(!materials[0].adjusted);
    }
}
