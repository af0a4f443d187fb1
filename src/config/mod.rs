// ==========================================
// 沼气电站配料优化引擎 - 配置层
// ==========================================
// 红线: 默认值集中在 EngineConfiguration::default,
//       不散落在各引擎模块
// ==========================================

pub mod engine_config;

pub use engine_config::{engine_profile, EngineConfiguration};
