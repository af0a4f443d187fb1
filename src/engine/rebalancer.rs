// ==========================================
// 沼气电站配料优化引擎 - 体积配比模式分配器
// ==========================================
// 职责: 将目标发电量换算为总吨位估计, 再按固/液/粪浆
//       配比拆分为类别吨位目标, 类别内按评分占比分配
// 红线: 无可用物料的类别其配比重新归一到其余类别,
//       不凭空制造缺口
// ==========================================

use crate::config::EngineConfiguration;
use crate::domain::{AllocationLine, ScoredMaterial};
use tracing::debug;

/// 低于此吨位的行直接丢弃
const MIN_LINE_TONNES: f64 = 0.01;

/// 类别均值取样宽度: 固体取前 3, 液体取前 2
const SOLID_SAMPLE: usize = 3;
const LIQUID_SAMPLE: usize = 2;

/// 加权均产率退化时的总吨位兜底估计
const FALLBACK_TOTAL_TONNES: f64 = 100.0;

// ==========================================
// SlurryIntake - 粪浆直供口径
// ==========================================
// 粪浆按接收体积 (m³) 供给, 经密度换算为吨位
#[derive(Debug, Clone)]
pub struct SlurryIntake {
    pub material: ScoredMaterial,
    pub tonnes_available: f64,   // slurry_volume_m3 × density
    pub kwh_contribution: f64,   // tonnes_available × 计算产率
}

impl SlurryIntake {
    /// 粪浆单位吨位产率 (kWh/t)
    pub fn kwh_per_tonne(&self) -> f64 {
        if self.tonnes_available > 0.0 {
            self.kwh_contribution / self.tonnes_available
        } else {
            0.0
        }
    }
}

// ==========================================
// ProportionRebalancer - 体积配比模式分配器
// ==========================================
pub struct ProportionRebalancer {
    // 无状态引擎, 不需要注入依赖
}

impl Default for ProportionRebalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProportionRebalancer {
    pub fn new() -> Self {
        Self {}
    }

    /// 体积配比分配
    ///
    /// 流程:
    /// 1) 配比归一化 (合计为 0 时回退默认 60/30/10)
    /// 2) 空类别置零并再归一化
    /// 3) 加权均产率 (固体前 3 / 液体前 2 / 粪浆) 估计总吨位
    /// 4) 类别吨位目标 = 总吨位 × 类别配比
    /// 5) 类别内按评分占比分配, 末位物料吸收尾差, 逐行受库存约束
    /// 6) 粪浆行单独追加 (受体积可用量/类别目标/库存三重约束)
    ///
    /// # 参数
    /// - `solids_ranked` / `liquids_ranked`: 已按评分降序排好的候选
    /// - `slurry`: 粪浆直供口径 (不纳入时为 None)
    /// - `kwh_remaining`: 扣除粪浆直供后的剩余目标发电量
    pub fn allocate(
        &self,
        solids_ranked: &[ScoredMaterial],
        liquids_ranked: &[ScoredMaterial],
        slurry: Option<&SlurryIntake>,
        config: &EngineConfiguration,
        kwh_remaining: f64,
    ) -> Vec<AllocationLine> {
        let mut lines = Vec::new();

        // 1) 配比归一化
        let (mut solids_pct, mut liquids_pct, mut slurry_pct) =
            Self::normalize_percentages(config.solids_pct, config.liquids_pct, config.slurry_pct);

        // 2) 空类别置零, 其配比重新归一到其余类别
        let slurry_tonnes_available = slurry.map(|s| s.tonnes_available).unwrap_or(0.0);
        if solids_ranked.is_empty() {
            solids_pct = 0.0;
        }
        if liquids_ranked.is_empty() {
            liquids_pct = 0.0;
        }
        if slurry_tonnes_available <= 0.0 {
            slurry_pct = 0.0;
        }
        let active_sum = solids_pct + liquids_pct + slurry_pct;
        if active_sum <= 0.0 {
            return lines;
        }
        solids_pct = solids_pct / active_sum * 100.0;
        liquids_pct = liquids_pct / active_sum * 100.0;
        slurry_pct = slurry_pct / active_sum * 100.0;

        // 3) 加权均产率
        let solids_avg = Self::average_yield(solids_ranked, SOLID_SAMPLE);
        let liquids_avg = Self::average_yield(liquids_ranked, LIQUID_SAMPLE);
        let slurry_avg = slurry.map(|s| s.kwh_per_tonne()).unwrap_or(0.0);
        let weighted_avg = solids_avg * solids_pct / 100.0
            + liquids_avg * liquids_pct / 100.0
            + slurry_avg * slurry_pct / 100.0;

        // 4) 总吨位估计 (除零兜底)
        let total_tonnes = if weighted_avg > 0.0 {
            kwh_remaining / weighted_avg
        } else {
            FALLBACK_TOTAL_TONNES
        };

        let solids_target_t = total_tonnes * solids_pct / 100.0;
        let liquids_target_t = total_tonnes * liquids_pct / 100.0;
        let slurry_target_t = total_tonnes * slurry_pct / 100.0;

        debug!(
            total_tonnes,
            solids_target_t, liquids_target_t, slurry_target_t, "体积配比吨位目标"
        );

        // 5) 类别内分配
        Self::distribute_category(
            &solids_ranked[..solids_ranked.len().min(SOLID_SAMPLE)],
            solids_target_t,
            &mut lines,
        );
        Self::distribute_category(
            &liquids_ranked[..liquids_ranked.len().min(LIQUID_SAMPLE)],
            liquids_target_t,
            &mut lines,
        );

        // 6) 粪浆行单独追加
        if let Some(intake) = slurry {
            let tonnes = slurry_target_t
                .min(intake.tonnes_available)
                .min(intake.material.stock_available_t());
            if tonnes > MIN_LINE_TONNES {
                lines.push(intake.material.allocation_line(tonnes));
            }
        }

        lines
    }

    /// 配比归一化为合计 100; 合计为 0 时回退默认 60/30/10
    fn normalize_percentages(solids: f64, liquids: f64, slurry: f64) -> (f64, f64, f64) {
        let total = solids + liquids + slurry;
        if total > 0.0 {
            (
                solids / total * 100.0,
                liquids / total * 100.0,
                slurry / total * 100.0,
            )
        } else {
            (60.0, 30.0, 10.0)
        }
    }

    /// 类别前 N 物料的平均采用产率
    fn average_yield(ranked: &[ScoredMaterial], sample: usize) -> f64 {
        let n = ranked.len().min(sample);
        if n == 0 {
            return 0.0;
        }
        ranked[..n]
            .iter()
            .map(|sm| sm.kwh_per_tonne_used)
            .sum::<f64>()
            / n as f64
    }

    /// 类别内按评分占比分配吨位, 末位物料吸收尾差
    fn distribute_category(
        selected: &[ScoredMaterial],
        target_t: f64,
        lines: &mut Vec<AllocationLine>,
    ) {
        if selected.is_empty() || target_t <= 0.0 {
            return;
        }

        let weight_total: f64 = selected.iter().map(|sm| sm.score_ml.max(0.0)).sum();
        let mut accumulated_t = 0.0;

        for (i, sm) in selected.iter().enumerate() {
            let remaining_t = target_t - accumulated_t;
            if remaining_t <= 0.0 {
                break;
            }

            let tonnes_used = if i == selected.len() - 1 {
                // 末位物料: 吸收尾差
                remaining_t.min(sm.stock_available_t())
            } else {
                let share = if weight_total > 0.0 {
                    sm.score_ml.max(0.0) / weight_total
                } else {
                    1.0 / selected.len() as f64
                };
                (target_t * share)
                    .min(sm.stock_available_t())
                    .min(remaining_t)
            };

            if tonnes_used <= MIN_LINE_TONNES {
                continue;
            }

            lines.push(sm.allocation_line(tonnes_used));
            accumulated_t += tonnes_used;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MaterialCategory;
    use crate::domain::Material;

    fn candidate(
        name: &str,
        category: MaterialCategory,
        kwh_per_tonne: f64,
        stock: f64,
        score: f64,
    ) -> ScoredMaterial {
        let mut sm = ScoredMaterial::new(Material {
            name: name.to_string(),
            category,
            st_pct: 25.0,
            sv_pct: 85.0,
            svt_pct: 21.25,
            carbohydrates_pct: 45.0,
            lipids_pct: 6.0,
            proteins_pct: 12.0,
            density: 1.0,
            biogas_m3_per_tonne: 400.0,
            baseline_kwh_per_tonne: kwh_per_tonne,
            baseline_ch4_m3_per_tonne: 220.0,
            methane_pct: 55.0,
            stock_available_t: stock,
        });
        sm.kwh_per_tonne = kwh_per_tonne;
        sm.kwh_per_tonne_used = kwh_per_tonne;
        sm.score_ml = score;
        sm
    }

    fn config_with_split(solids: f64, liquids: f64, slurry: f64) -> EngineConfiguration {
        EngineConfiguration {
            solids_pct: solids,
            liquids_pct: liquids,
            slurry_pct: slurry,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_liquids_redistributes_to_solids() {
        let rebalancer = ProportionRebalancer::new();
        let solids = vec![
            candidate("maiz", MaterialCategory::Solid, 1000.0, 10000.0, 500.0),
            candidate("sorgo", MaterialCategory::Solid, 1000.0, 10000.0, 500.0),
        ];

        let lines = rebalancer.allocate(
            &solids,
            &[],
            None,
            &config_with_split(60.0, 40.0, 0.0),
            10000.0,
        );

        // 液体类别为空: 固体吸收 100% 吨位目标, 等分 (同分)
        assert_eq!(lines.len(), 2);
        let total_t: f64 = lines.iter().map(|l| l.tonnes).sum();
        assert!((total_t - 10.0).abs() < 0.01); // 10000 kWh / 1000 kWh/t
        assert!((lines[0].tonnes - lines[1].tonnes).abs() < 0.01);

        // 产出已对准目标, 校正阶段不应触发 (|gap| < 5%)
        let total_kwh: f64 = lines.iter().map(|l| l.kwh_total).sum();
        assert!((total_kwh - 10000.0).abs() / 10000.0 < 0.05);
    }

    #[test]
    fn test_score_proportional_split() {
        let rebalancer = ProportionRebalancer::new();
        let solids = vec![
            candidate("maiz", MaterialCategory::Solid, 1000.0, 10000.0, 750.0),
            candidate("sorgo", MaterialCategory::Solid, 1000.0, 10000.0, 250.0),
        ];

        let lines = rebalancer.allocate(
            &solids,
            &[],
            None,
            &config_with_split(100.0, 0.0, 0.0),
            10000.0,
        );

        assert_eq!(lines.len(), 2);
        // 评分 3:1 → 吨位 7.5 / 2.5
        assert!((lines[0].tonnes - 7.5).abs() < 0.01);
        assert!((lines[1].tonnes - 2.5).abs() < 0.01);
    }

    #[test]
    fn test_last_material_absorbs_remainder_with_stock_cap() {
        let rebalancer = ProportionRebalancer::new();
        let solids = vec![
            // 高分物料库存受限
            candidate("maiz", MaterialCategory::Solid, 1000.0, 2.0, 900.0),
            candidate("sorgo", MaterialCategory::Solid, 1000.0, 10000.0, 100.0),
        ];

        let lines = rebalancer.allocate(
            &solids,
            &[],
            None,
            &config_with_split(100.0, 0.0, 0.0),
            10000.0,
        );

        assert_eq!(lines.len(), 2);
        assert!((lines[0].tonnes - 2.0).abs() < 1e-9); // 库存截断
        assert!((lines[1].tonnes - 8.0).abs() < 0.01); // 尾差吸收
    }

    #[test]
    fn test_zero_percentages_fall_back_to_default_split() {
        let rebalancer = ProportionRebalancer::new();
        let solids = vec![candidate(
            "maiz",
            MaterialCategory::Solid,
            1000.0,
            10000.0,
            500.0,
        )];
        let liquids = vec![candidate(
            "suero",
            MaterialCategory::Liquid,
            800.0,
            10000.0,
            400.0,
        )];

        let lines =
            rebalancer.allocate(&solids, &liquids, None, &config_with_split(0.0, 0.0, 0.0), 9000.0);

        // 默认 60/30/10, 粪浆缺席 → 归一化为 66.67/33.33
        assert_eq!(lines.len(), 2);
        let solids_t = lines[0].tonnes;
        let liquids_t = lines[1].tonnes;
        assert!((solids_t / liquids_t - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_slurry_line_triple_cap() {
        let rebalancer = ProportionRebalancer::new();
        let solids = vec![candidate(
            "maiz",
            MaterialCategory::Solid,
            1000.0,
            10000.0,
            500.0,
        )];
        let mut slurry_material =
            candidate("purin vacuno", MaterialCategory::Slurry, 200.0, 50.0, 10.0);
        slurry_material.kwh_per_tonne_used = 200.0;
        let slurry = SlurryIntake {
            material: slurry_material,
            tonnes_available: 21.0, // 20 m³ × 1.05
            kwh_contribution: 21.0 * 200.0,
        };

        let lines = rebalancer.allocate(
            &solids,
            &[],
            Some(&slurry),
            &config_with_split(80.0, 0.0, 20.0),
            8000.0,
        );

        // 粪浆行存在且不超过体积可用量
        let slurry_line = lines
            .iter()
            .find(|l| l.category == MaterialCategory::Slurry)
            .expect("应有粪浆行");
        assert!(slurry_line.tonnes <= 21.0 + 1e-9);
        assert!(slurry_line.tonnes <= slurry_line.stock_available_t);
    }

    #[test]
    fn test_all_categories_empty_returns_no_lines() {
        let rebalancer = ProportionRebalancer::new();
        let lines = rebalancer.allocate(&[], &[], None, &config_with_split(60.0, 30.0, 10.0), 5000.0);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_zero_yield_falls_back_to_default_tonnage() {
        let rebalancer = ProportionRebalancer::new();
        // 产率全为 0: 总吨位兜底 100 t
        let solids = vec![candidate(
            "lodo",
            MaterialCategory::Solid,
            0.0,
            10000.0,
            1.0,
        )];
        let lines = rebalancer.allocate(
            &solids,
            &[],
            None,
            &config_with_split(100.0, 0.0, 0.0),
            5000.0,
        );

        assert_eq!(lines.len(), 1);
        assert!((lines[0].tonnes - 100.0).abs() < 1e-9);
    }
}
