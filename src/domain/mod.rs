// ==========================================
// 沼气电站配料优化引擎 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含业务规则
// ==========================================

pub mod material;
pub mod recipe;
pub mod types;

pub use material::{Material, ScoredMaterial};
pub use recipe::{
    round1, round2, AllocationLine, CategoryProportions, RecipeResult, RecipeSummary,
};
pub use types::{AllocationMode, MaterialCategory, RecipeWarning};
