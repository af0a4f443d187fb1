// ==========================================
// 沼气电站配料优化引擎 - 目录层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 物料目录 / 库存快照加载错误
#[derive(Error, Debug)]
pub enum CatalogError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .json/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),
}
