// ==========================================
// 沼气电站配料优化引擎 - API 层
// ==========================================
// 职责: 对外 JSON 契约与调用入口
// ==========================================

pub mod error;
pub mod recipe_api;

pub use error::ApiError;
pub use recipe_api::{RecipeApi, RecipeRequest};
