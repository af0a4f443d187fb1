// ==========================================
// 沼气电站配料优化引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 职责: 只有配置校验是硬失败; 物料级异常一律降级为
//       RecipeWarning 随结果返回 (见 domain::types)
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 配置校验错误 (致命, 不进入计算) =====
    // 其余一切物料级异常都不是 EngineError, 而是结果内的告警
    #[error("配置校验失败: 字段 {field} 值 {value} 越界")]
    Validation { field: String, value: f64 },
}

impl EngineError {
    pub fn validation(field: &str, value: f64) -> Self {
        EngineError::Validation {
            field: field.to_string(),
            value,
        }
    }

    /// 是否为配置校验错误 (调用方据此映射为 4xx 语义)
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation { .. })
    }
}
