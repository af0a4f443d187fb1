// ==========================================
// 沼气电站配料优化引擎 - API 层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 职责: 把目录层/引擎层错误映射到对外调用语义,
//       并区分调用方错误与数据侧错误
// ==========================================

use crate::catalog::CatalogError;
use crate::engine::EngineError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 请求解析错误 (调用方) =====
    #[error("请求解析失败: {0}")]
    BadRequest(#[from] serde_json::Error),

    // ===== 引擎错误 (配置校验失败同属调用方) =====
    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),

    // ===== 目录/库存数据错误 =====
    #[error("物料数据错误: {0}")]
    Catalog(#[from] CatalogError),
}

impl ApiError {
    /// 是否由调用方输入导致 (对应 HTTP 4xx 语义)
    pub fn is_client_error(&self) -> bool {
        match self {
            ApiError::BadRequest(_) => true,
            ApiError::Engine(e) => e.is_validation(),
            ApiError::Catalog(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_client_error() {
        let err = ApiError::Engine(EngineError::validation("target_kwh", -1.0));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_catalog_maps_to_data_error() {
        let err = ApiError::Catalog(CatalogError::FileNotFound("x.json".to_string()));
        assert!(!err.is_client_error());
    }
}
