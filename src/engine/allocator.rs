// ==========================================
// 沼气电站配料优化引擎 - 能效模式分配器
// ==========================================
// 职责: 按评分取前 N 物料, 目标发电量均分为 N 个槽位,
//       逐槽折算吨位并施加库存上限与多样化下限
// 红线: 槽位间不做剩余量再分配, 缺口直接体现为达成率下降
// 红线: 任何一行的吨位不得超过该物料库存
// ==========================================

use crate::domain::{AllocationLine, ScoredMaterial};
use tracing::debug;

/// 低于此吨位的行直接丢弃 (无工程意义)
const MIN_LINE_TONNES: f64 = 0.01;

// ==========================================
// RecipeAllocator - 能效模式分配器
// ==========================================
pub struct RecipeAllocator {
    // 无状态引擎, 不需要注入依赖
}

impl Default for RecipeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeAllocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 能效模式分配
    ///
    /// 规则:
    /// 1) 取排序后前 max_materials 个候选
    /// 2) 每槽子目标 = target_kwh / max_materials (均分, 保证多样化)
    /// 3) tonnes = min(子目标/产率, 库存); 下限 max(1.0, tonnes×0.1),
    ///    再按库存截断
    /// 4) tonnes ≤ 0.01 的行不输出
    ///
    /// # 参数
    /// - `ranked`: 已按评分降序 (同分按名称升序) 排好的候选
    /// - `target_kwh`: 扣除粪浆直供后的剩余目标发电量
    /// - `max_materials`: 槽位数
    ///
    /// # 返回
    /// 投料行列表 (无候选时为空)
    pub fn allocate(
        &self,
        ranked: &[ScoredMaterial],
        target_kwh: f64,
        max_materials: usize,
    ) -> Vec<AllocationLine> {
        let mut lines = Vec::new();
        if ranked.is_empty() || max_materials == 0 {
            return lines;
        }

        let slot_target_kwh = target_kwh / max_materials as f64;
        let selected = &ranked[..ranked.len().min(max_materials)];

        for sm in selected {
            let kwh_per_tonne = sm.kwh_per_tonne_used;
            if kwh_per_tonne <= 0.0 {
                continue;
            }

            let tonnes_needed = slot_target_kwh / kwh_per_tonne;
            let mut tonnes_used = tonnes_needed.min(sm.stock_available_t());

            // 多样化下限: 至少 1 t 或计算量的 10%, 但不得突破库存
            if tonnes_used > 0.0 {
                let floor = 1.0_f64.max(tonnes_used * 0.1);
                tonnes_used = tonnes_used.max(floor).min(sm.stock_available_t());
            }

            if tonnes_used <= MIN_LINE_TONNES {
                debug!(material = %sm.name(), tonnes = tonnes_used, "吨位过小, 跳过");
                continue;
            }

            lines.push(sm.allocation_line(tonnes_used));
        }

        lines
    }
}
