// ==========================================
// 沼气电站配料优化引擎 - 引擎层
// ==========================================
// 职责: 实现配料业务规则, 不做任何 I/O
// 红线: 引擎只消费已物化的物料/库存快照,
//       读写文件一律在目录层与调用方
// ==========================================

pub mod adjuster;
pub mod aggregator;
pub mod allocator;
pub mod error;
pub mod orchestrator;
pub mod rebalancer;
pub mod yield_calc;

// 重导出核心引擎
pub use adjuster::{
    Adjustment, AdjusterError, AdjusterRegistry, BayesianAdjuster, CainAdjuster,
    GeneticAdjuster, NoOpAdjuster, PrecisionFallbackAdjuster, RandomForestAdjuster,
    ScoreAdjuster,
};
pub use aggregator::ResultAggregator;
pub use allocator::RecipeAllocator;
pub use error::EngineError;
pub use orchestrator::{MaterialSuggestion, RecipeOrchestrator};
pub use rebalancer::{ProportionRebalancer, SlurryIntake};
pub use yield_calc::{YieldCalculator, YieldMetrics};
