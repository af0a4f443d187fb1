// ==========================================
// 沼气电站配料优化引擎 - 核心库
// ==========================================
// 技术栈: Rust + serde + tracing
// 系统定位: 决策支持系统 (配料方案由人工最终确认)
// ==========================================
// 职责: 根据目标发电量/目标甲烷浓度与当前物料库存,
//       计算各物料的投料吨位方案 (能效模式 / 体积配比模式)
// 红线: 引擎本身无持久状态, 单次调用 = 一条线性管线
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 配置层 - 引擎配置
pub mod config;

// 物料目录层 - 基础物性表与库存快照
pub mod catalog;

// 引擎层 - 业务规则
pub mod engine;

// API 层 - 请求/响应契约
pub mod api;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationMode, MaterialCategory, RecipeWarning};

// 领域实体
pub use domain::{AllocationLine, Material, RecipeResult, RecipeSummary, ScoredMaterial};

// 配置
pub use config::{engine_profile, EngineConfiguration};

// 物料目录
pub use catalog::{CatalogSnapshot, InMemoryStock, JsonStockFile, MaterialCatalog, StockProvider};

// 引擎
pub use engine::{
    AdjusterRegistry, ProportionRebalancer, RecipeAllocator, RecipeOrchestrator,
    ResultAggregator, ScoreAdjuster, YieldCalculator,
};

// API
pub use api::{RecipeApi, RecipeRequest};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "沼气电站配料优化引擎";
