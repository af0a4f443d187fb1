// ==========================================
// 沼气电站配料优化引擎 - 结果聚合器
// ==========================================
// 职责: 行级贡献汇总、实际甲烷浓度/达成率/配比口径计算,
//       体积配比模式下执行一次比例校正
// 红线: 校正只跑一轮, 不做迭代收敛; 受库存约束的行保持
//       原值并产生告警
// ==========================================

use crate::config::EngineConfiguration;
use crate::domain::types::{AllocationMode, MaterialCategory, RecipeWarning};
use crate::domain::{
    round1, round2, AllocationLine, CategoryProportions, RecipeResult, RecipeSummary,
};
use tracing::debug;

/// 校正触发阈值: 偏差超过目标的 5%
const CORRECTION_THRESHOLD: f64 = 0.05;

// ==========================================
// ResultAggregator - 结果聚合器
// ==========================================
pub struct ResultAggregator {
    // 无状态引擎, 不需要注入依赖
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 聚合配料行为最终结果
    ///
    /// # 参数
    /// - `lines`: 分配器输出的投料行
    /// - `config`: 引擎配置
    /// - `warnings`: 管线前序阶段累积的告警 (校正告警在此追加)
    ///
    /// # 返回
    /// 结构完整的 RecipeResult (空方案时附 EmptyRecipe 告警)
    pub fn aggregate(
        &self,
        mut lines: Vec<AllocationLine>,
        config: &EngineConfiguration,
        mut warnings: Vec<RecipeWarning>,
    ) -> RecipeResult {
        // 体积配比模式: 一次比例校正
        if config.mode == AllocationMode::Volumetric && !lines.is_empty() {
            self.correct_toward_target(&mut lines, config, &mut warnings);
        }

        let kwh_generated: f64 = lines.iter().map(|l| l.kwh_total).sum();
        let tonnes_total: f64 = lines.iter().map(|l| l.tonnes).sum();
        let biogas_total: f64 = lines.iter().map(|l| l.biogas_m3).sum();
        let ch4_total: f64 = lines.iter().map(|l| l.ch4_m3).sum();
        let thermal_power_total: f64 = lines.iter().map(|l| l.thermal_power_kw).sum();
        let thermal_energy_total: f64 = lines.iter().map(|l| l.thermal_energy_kwh).sum();

        // 行级混合占比回填 (合计 100)
        for line in lines.iter_mut() {
            line.mix_percentage = if tonnes_total > 0.0 {
                round1(line.tonnes / tonnes_total * 100.0)
            } else {
                0.0
            };
        }

        // 实际甲烷浓度
        let ch4_pct_achieved = if biogas_total > 0.0 {
            round1(ch4_total / biogas_total * 100.0)
        } else {
            0.0
        };

        // 运行小时: 总沼气量 / 发动机小时消耗量
        let consumption_m3_h = config.consumption_m3_per_h();
        let operating_hours = if consumption_m3_h > 0.0 {
            biogas_total / consumption_m3_h
        } else {
            0.0
        };

        // 类别口径
        let solids_t: f64 = Self::category_tonnes(&lines, MaterialCategory::Solid);
        let liquids_t: f64 = Self::category_tonnes(&lines, MaterialCategory::Liquid);
        let slurry_t: f64 = Self::category_tonnes(&lines, MaterialCategory::Slurry);
        let category_pct = |t: f64| {
            if tonnes_total > 0.0 {
                round1(t / tonnes_total * 100.0)
            } else {
                0.0
            }
        };

        if lines.is_empty() {
            warnings.push(RecipeWarning::EmptyRecipe);
        }

        let summary = RecipeSummary {
            mode: config.mode,
            target_kwh: config.target_kwh,
            kwh_generated: round2(kwh_generated),
            fulfillment_pct: if config.target_kwh > 0.0 {
                round1(kwh_generated / config.target_kwh * 100.0)
            } else {
                0.0
            },
            tonnes_total: round2(tonnes_total),
            biogas_total_m3: round2(biogas_total),
            ch4_total_m3: round2(ch4_total),
            ch4_pct_achieved,
            thermal_power_total_kw: round2(thermal_power_total),
            thermal_energy_total_kwh: round2(thermal_energy_total),
            operating_hours: round2(operating_hours),
            operating_days: round2(operating_hours / 24.0),
            engine_power_kw: config.engine_power_kw,
            target_ch4_pct: config.target_ch4_pct,
            slurry_volume_m3: config.slurry_volume_m3,
            include_slurry: config.include_slurry,
            proportions: CategoryProportions {
                solids_t: round2(solids_t),
                liquids_t: round2(liquids_t),
                slurry_t: round2(slurry_t),
                solids_pct: category_pct(solids_t),
                liquids_pct: category_pct(liquids_t),
                slurry_pct: category_pct(slurry_t),
            },
        };

        RecipeResult {
            lines,
            summary,
            warnings,
        }
    }

    /// 比例校正: 产出偏离目标超 5% 时, 按 target/generated
    /// 整体缩放各行吨位; 缩放后越过库存的行保持原值
    fn correct_toward_target(
        &self,
        lines: &mut [AllocationLine],
        config: &EngineConfiguration,
        warnings: &mut Vec<RecipeWarning>,
    ) {
        let kwh_generated: f64 = lines.iter().map(|l| l.kwh_total).sum();
        if kwh_generated <= 0.0 {
            return;
        }

        let gap = config.target_kwh - kwh_generated;
        if gap.abs() <= config.target_kwh * CORRECTION_THRESHOLD {
            return;
        }

        let factor = config.target_kwh / kwh_generated;
        debug!(factor, kwh_generated, target = config.target_kwh, "触发比例校正");

        for line in lines.iter_mut() {
            let scaled_t = line.tonnes * factor;
            if scaled_t <= line.stock_available_t + 1e-9 {
                let ratio = if line.tonnes > 0.0 {
                    scaled_t / line.tonnes
                } else {
                    1.0
                };
                line.tonnes = round2(scaled_t);
                line.kwh_total = round2(scaled_t * line.kwh_per_tonne);
                line.biogas_m3 = round2(line.biogas_m3 * ratio);
                line.ch4_m3 = round2(line.ch4_m3 * ratio);
                line.thermal_power_kw = round2(line.thermal_power_kw * ratio);
                line.thermal_energy_kwh = round2(line.thermal_energy_kwh * ratio);
            } else {
                debug!(material = %line.material, factor, "库存不足, 该行不参与校正");
                warnings.push(RecipeWarning::UnscalableLine {
                    material: line.material.clone(),
                    factor,
                });
            }
        }
    }

    fn category_tonnes(lines: &[AllocationLine], category: MaterialCategory) -> f64 {
        lines
            .iter()
            .filter(|l| l.category == category)
            .map(|l| l.tonnes)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(
        name: &str,
        category: MaterialCategory,
        tonnes: f64,
        kwh_per_tonne: f64,
        stock: f64,
    ) -> AllocationLine {
        AllocationLine {
            material: name.to_string(),
            category,
            tonnes,
            stock_available_t: stock,
            kwh_per_tonne,
            kwh_total: round2(tonnes * kwh_per_tonne),
            biogas_m3: round2(tonnes * 400.0),
            ch4_m3: round2(tonnes * 400.0 * 0.54),
            thermal_power_kw: round2(tonnes * 100.0),
            thermal_energy_kwh: round2(tonnes * 2400.0),
            biogas_calorific_kwh_m3: 6.0,
            st_pct: 25.0,
            sv_pct: 85.0,
            svt_pct: 21.25,
            carbohydrates_pct: 45.0,
            lipids_pct: 6.0,
            proteins_pct: 12.0,
            density: 1.0,
            mix_percentage: 0.0,
        }
    }

    fn volumetric_config(target: f64) -> EngineConfiguration {
        EngineConfiguration {
            target_kwh: target,
            mode: AllocationMode::Volumetric,
            ..Default::default()
        }
    }

    #[test]
    fn test_correction_scales_all_lines() {
        let aggregator = ResultAggregator::new();
        // 合计 8000 kWh, 目标 10000: 偏差 20% > 5%, factor = 1.25
        let lines = vec![
            line("maiz", MaterialCategory::Solid, 5.0, 1000.0, 1000.0),
            line("suero", MaterialCategory::Liquid, 6.0, 500.0, 1000.0),
        ];
        let result = aggregator.aggregate(lines, &volumetric_config(10000.0), Vec::new());

        // 校正后 ≈ 10000, 偏差 < 0.1%
        assert!((result.summary.kwh_generated - 10000.0).abs() / 10000.0 < 0.001);
        assert!((result.lines[0].tonnes - 6.25).abs() < 0.01);
        assert!((result.lines[1].tonnes - 7.5).abs() < 0.01);
        assert!(result.warnings.is_empty());
        assert_eq!(result.summary.fulfillment_pct, 100.0);
    }

    #[test]
    fn test_correction_respects_stock_and_warns() {
        let aggregator = ResultAggregator::new();
        let lines = vec![
            // 库存刚好等于当前吨位: 无法放大
            line("maiz", MaterialCategory::Solid, 5.0, 1000.0, 5.0),
            line("suero", MaterialCategory::Liquid, 6.0, 500.0, 1000.0),
        ];
        let result = aggregator.aggregate(lines, &volumetric_config(10000.0), Vec::new());

        // 受限行保持原值
        assert!((result.lines[0].tonnes - 5.0).abs() < 1e-9);
        assert!((result.lines[1].tonnes - 7.5).abs() < 0.01);
        assert!(matches!(
            result.warnings[0],
            RecipeWarning::UnscalableLine { .. }
        ));
    }

    #[test]
    fn test_correction_not_fired_within_threshold() {
        let aggregator = ResultAggregator::new();
        // 9800 / 10000 = 2% 偏差, 低于阈值
        let lines = vec![line("maiz", MaterialCategory::Solid, 9.8, 1000.0, 1000.0)];
        let result = aggregator.aggregate(lines, &volumetric_config(10000.0), Vec::new());

        assert!((result.lines[0].tonnes - 9.8).abs() < 1e-9);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_energetic_mode_never_corrects() {
        let aggregator = ResultAggregator::new();
        let lines = vec![line("maiz", MaterialCategory::Solid, 5.0, 1000.0, 1000.0)];
        let config = EngineConfiguration {
            target_kwh: 10000.0,
            mode: AllocationMode::Energetic,
            ..Default::default()
        };
        let result = aggregator.aggregate(lines, &config, Vec::new());

        assert!((result.lines[0].tonnes - 5.0).abs() < 1e-9);
        assert_eq!(result.summary.fulfillment_pct, 50.0);
    }

    #[test]
    fn test_mix_percentage_closure() {
        let aggregator = ResultAggregator::new();
        let lines = vec![
            line("maiz", MaterialCategory::Solid, 3.0, 1000.0, 100.0),
            line("sorgo", MaterialCategory::Solid, 4.0, 900.0, 100.0),
            line("suero", MaterialCategory::Liquid, 5.0, 500.0, 100.0),
        ];
        let config = EngineConfiguration {
            target_kwh: 10000.0,
            ..Default::default()
        };
        let result = aggregator.aggregate(lines, &config, Vec::new());

        let pct_sum: f64 = result.lines.iter().map(|l| l.mix_percentage).sum();
        assert!((pct_sum - 100.0).abs() <= 0.1);
    }

    #[test]
    fn test_empty_lines_produce_empty_recipe_warning() {
        let aggregator = ResultAggregator::new();
        let config = EngineConfiguration {
            target_kwh: 10000.0,
            ..Default::default()
        };
        let result = aggregator.aggregate(Vec::new(), &config, Vec::new());

        assert!(result.is_empty());
        assert_eq!(result.summary.fulfillment_pct, 0.0);
        assert_eq!(result.summary.ch4_pct_achieved, 0.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, RecipeWarning::EmptyRecipe)));
    }

    #[test]
    fn test_totals_match_line_sums() {
        let aggregator = ResultAggregator::new();
        let lines = vec![
            line("maiz", MaterialCategory::Solid, 3.0, 1000.0, 100.0),
            line("suero", MaterialCategory::Liquid, 5.0, 500.0, 100.0),
        ];
        let config = EngineConfiguration {
            target_kwh: 5500.0,
            ..Default::default()
        };
        let result = aggregator.aggregate(lines, &config, Vec::new());

        let line_kwh: f64 = result.lines.iter().map(|l| l.kwh_total).sum();
        assert!((result.summary.kwh_generated - line_kwh).abs() / line_kwh < 1e-6);
        assert_eq!(result.summary.fulfillment_pct, 100.0);
    }

    #[test]
    fn test_category_breakdown() {
        let aggregator = ResultAggregator::new();
        let lines = vec![
            line("maiz", MaterialCategory::Solid, 6.0, 1000.0, 100.0),
            line("suero", MaterialCategory::Liquid, 3.0, 500.0, 100.0),
            line("purin", MaterialCategory::Slurry, 1.0, 200.0, 100.0),
        ];
        let config = EngineConfiguration {
            target_kwh: 7700.0,
            ..Default::default()
        };
        let result = aggregator.aggregate(lines, &config, Vec::new());

        let p = &result.summary.proportions;
        assert!((p.solids_t - 6.0).abs() < 1e-9);
        assert!((p.liquids_t - 3.0).abs() < 1e-9);
        assert!((p.slurry_t - 1.0).abs() < 1e-9);
        assert!((p.solids_pct - 60.0).abs() < 1e-9);
    }
}
