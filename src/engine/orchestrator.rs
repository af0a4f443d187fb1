// ==========================================
// 沼气电站配料优化引擎 - 引擎编排器
// ==========================================
// 用途: 协调产率计算/评分调整/分配/聚合的执行顺序
// 管线: 校验 → 物料快照副本 → 产率 → 调整器 →
//       分配 (能效 | 体积配比) → 聚合/校正 → 结果
// 红线: 校验失败即终止, 无重试; 快照只读,
//       所有过程量写在 ScoredMaterial 副本上
// ==========================================

use crate::config::EngineConfiguration;
use crate::domain::types::{AllocationMode, MaterialCategory, RecipeWarning};
use crate::domain::{round2, Material, RecipeResult, ScoredMaterial};
use crate::engine::adjuster::AdjusterRegistry;
use crate::engine::aggregator::ResultAggregator;
use crate::engine::allocator::RecipeAllocator;
use crate::engine::error::EngineError;
use crate::engine::rebalancer::{ProportionRebalancer, SlurryIntake};
use crate::engine::yield_calc::YieldCalculator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

// ==========================================
// MaterialSuggestion - 物料推荐条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSuggestion {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "tipo")]
    pub category: MaterialCategory,
    #[serde(rename = "kwh_por_tn")]
    pub kwh_per_tonne: f64,
    #[serde(rename = "m3_biogas_por_tn")]
    pub biogas_m3_per_tonne: f64,
    #[serde(rename = "stock_disponible")]
    pub stock_available_t: f64,
}

// ==========================================
// RecipeOrchestrator - 引擎编排器
// ==========================================
pub struct RecipeOrchestrator {
    yield_calc: YieldCalculator,
    allocator: RecipeAllocator,
    rebalancer: ProportionRebalancer,
    aggregator: ResultAggregator,
    registry: AdjusterRegistry,
}

impl Default for RecipeOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeOrchestrator {
    /// 使用内置调整器全集构造
    pub fn new() -> Self {
        Self::with_registry(AdjusterRegistry::with_builtin())
    }

    /// 注入自定义调整器注册表 (测试/扩展场景)
    pub fn with_registry(registry: AdjusterRegistry) -> Self {
        Self {
            yield_calc: YieldCalculator::new(),
            allocator: RecipeAllocator::new(),
            rebalancer: ProportionRebalancer::new(),
            aggregator: ResultAggregator::new(),
            registry,
        }
    }

    /// 生成配料方案 (单次调用的完整管线)
    ///
    /// # 参数
    /// - `materials`: 物料快照 (目录 + 库存已合并, 只读)
    /// - `config`: 引擎配置
    ///
    /// # 返回
    /// - Ok(RecipeResult): 结构完整的方案 (可能为空 + 告警)
    /// - Err(EngineError::Validation): 配置越界, 未进入计算
    #[instrument(skip(self, materials), fields(
        mode = %config.mode,
        target_kwh = config.target_kwh,
        materials_count = materials.len()
    ))]
    pub fn generate(
        &self,
        materials: &[Material],
        config: &EngineConfiguration,
    ) -> Result<RecipeResult, EngineError> {
        // 1) 校验 (致命边界)
        config.validate()?;

        let mut warnings: Vec<RecipeWarning> = Vec::new();

        // 2) 工作副本 + 产率计算 (固/液参与排序, 粪浆走直供路径)
        let (mut candidates, slurry_source) = self.prepare_candidates(materials, config, &mut warnings);

        // 3) 评分调整器 (按声明顺序)
        let adjuster_warnings = self.registry.apply(
            &mut candidates,
            &config.selected_adjusters,
            config.target_kwh,
            config.target_ch4_pct,
        );
        warnings.extend(adjuster_warnings);

        // 4) 粪浆直供口径
        let slurry = self.build_slurry_intake(slurry_source, config);
        let slurry_kwh = slurry.as_ref().map(|s| s.kwh_contribution).unwrap_or(0.0);
        let kwh_remaining = (config.target_kwh - slurry_kwh).max(0.0);
        debug!(slurry_kwh, kwh_remaining, "粪浆直供扣减后的剩余目标");

        // 5) 分配 (模式分派)
        let lines = match config.mode {
            AllocationMode::Energetic => {
                let mut ranked = candidates;
                Self::sort_by_score(&mut ranked);
                let mut lines =
                    self.allocator
                        .allocate(&ranked, kwh_remaining, config.max_materials);
                // 粪浆行追加在表尾, 全量投入 (能效模式不受类别配比约束)
                if let Some(intake) = &slurry {
                    if intake.tonnes_available > 0.01 {
                        lines.push(intake.material.allocation_line(intake.tonnes_available));
                    }
                }
                lines
            }
            AllocationMode::Volumetric => {
                let mut solids: Vec<ScoredMaterial> = Vec::new();
                let mut liquids: Vec<ScoredMaterial> = Vec::new();
                for sm in candidates {
                    match sm.category() {
                        MaterialCategory::Solid => solids.push(sm),
                        MaterialCategory::Liquid => liquids.push(sm),
                        MaterialCategory::Slurry => {}
                    }
                }
                Self::sort_by_score(&mut solids);
                Self::sort_by_score(&mut liquids);
                self.rebalancer
                    .allocate(&solids, &liquids, slurry.as_ref(), config, kwh_remaining)
            }
        };

        // 6) 聚合 + 校正
        let result = self.aggregator.aggregate(lines, config, warnings);
        info!(
            lines = result.lines.len(),
            kwh_generated = result.summary.kwh_generated,
            fulfillment_pct = result.summary.fulfillment_pct,
            "配料方案生成完成"
        );
        Ok(result)
    }

    /// 推荐当前库存下产率最高的前 N 个物料
    pub fn suggest(
        &self,
        materials: &[Material],
        config: &EngineConfiguration,
        count: usize,
    ) -> Result<Vec<MaterialSuggestion>, EngineError> {
        config.validate()?;

        let mut ranked: Vec<MaterialSuggestion> = materials
            .iter()
            .filter(|m| m.is_allocatable())
            .map(|m| {
                let metrics = self.yield_calc.compute(m, config);
                MaterialSuggestion {
                    name: m.name.clone(),
                    category: m.category,
                    kwh_per_tonne: round2(metrics.kwh_per_tonne),
                    biogas_m3_per_tonne: m.biogas_m3_per_tonne,
                    stock_available_t: m.stock_available_t,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.kwh_per_tonne
                .partial_cmp(&a.kwh_per_tonne)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(count);
        Ok(ranked)
    }

    // ==========================================
    // 内部步骤
    // ==========================================

    /// 构建参与排序的工作副本; 粪浆物料单独返回 (取目录中
    /// 首个粪浆条目, 原序)
    fn prepare_candidates(
        &self,
        materials: &[Material],
        config: &EngineConfiguration,
        warnings: &mut Vec<RecipeWarning>,
    ) -> (Vec<ScoredMaterial>, Option<Material>) {
        let mut candidates = Vec::new();
        let mut slurry_source: Option<Material> = None;

        for material in materials {
            if material.category == MaterialCategory::Slurry {
                if slurry_source.is_none() {
                    slurry_source = Some(material.clone());
                }
                continue;
            }

            // 零库存物料静默排除 (常态, 不告警)
            if material.stock_available_t <= 0.0 {
                continue;
            }

            // 缺化验数据: 不参与排序
            if !material.has_lab_data() {
                warnings.push(RecipeWarning::InsufficientData {
                    material: material.name.clone(),
                });
                continue;
            }

            let metrics = self.yield_calc.compute(material, config);
            if metrics.kwh_per_tonne <= 0.0 {
                warnings.push(RecipeWarning::ZeroYield {
                    material: material.name.clone(),
                });
                continue;
            }

            let mut sm = ScoredMaterial::new(material.clone());
            sm.kwh_per_tonne = metrics.kwh_per_tonne;
            sm.ch4_m3_per_tonne = metrics.ch4_m3_per_tonne;
            sm.thermal_power_kw_per_tonne = metrics.thermal_power_kw_per_tonne;
            sm.thermal_energy_kwh_per_tonne = metrics.thermal_energy_kwh_per_tonne;
            sm.biogas_calorific_kwh_m3 = metrics.biogas_calorific_kwh_m3;
            sm.kwh_per_tonne_used = metrics.kwh_per_tonne;
            // 基础排序评分: 产率 60% + 物料自身甲烷浓度 40%
            sm.score_ml = metrics.kwh_per_tonne * 0.6 + material.methane_pct * 0.4;
            candidates.push(sm);
        }

        (candidates, slurry_source)
    }

    /// 粪浆直供口径: 接收体积 × 密度 → 吨位, 产率走同一计算器
    ///
    /// 本次调用内粪浆的"库存"即体积换算吨位
    fn build_slurry_intake(
        &self,
        slurry_source: Option<Material>,
        config: &EngineConfiguration,
    ) -> Option<SlurryIntake> {
        if !config.include_slurry || config.slurry_volume_m3 <= 0.0 {
            return None;
        }
        let mut material = slurry_source?;

        let tonnes_available = config.slurry_volume_m3 * material.density;
        material.stock_available_t = tonnes_available;

        let metrics = self
            .yield_calc
            .compute_raw(material.biogas_m3_per_tonne, config);
        let mut sm = ScoredMaterial::new(material);
        sm.kwh_per_tonne = metrics.kwh_per_tonne;
        sm.ch4_m3_per_tonne = metrics.ch4_m3_per_tonne;
        sm.thermal_power_kw_per_tonne = metrics.thermal_power_kw_per_tonne;
        sm.thermal_energy_kwh_per_tonne = metrics.thermal_energy_kwh_per_tonne;
        sm.biogas_calorific_kwh_m3 = metrics.biogas_calorific_kwh_m3;
        sm.kwh_per_tonne_used = metrics.kwh_per_tonne;

        Some(SlurryIntake {
            kwh_contribution: tonnes_available * metrics.kwh_per_tonne,
            tonnes_available,
            material: sm,
        })
    }

    /// 排序键: 评分降序, 同分按名称升序 (确定性保证)
    fn sort_by_score(materials: &mut [ScoredMaterial]) {
        materials.sort_by(|a, b| {
            b.score_ml
                .partial_cmp(&a.score_ml)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name().cmp(b.name()))
        });
    }
}
