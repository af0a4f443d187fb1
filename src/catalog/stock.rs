// ==========================================
// 沼气电站配料优化引擎 - 库存快照提供方
// ==========================================
// 职责: 提供"物料名 → 当前可用吨位"的只读快照
// 红线: 快照由调用方在调用前物化, 引擎内不发生 I/O
// ==========================================

use crate::catalog::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

// ==========================================
// StockEntry - 单物料库存条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEntry {
    #[serde(rename = "cantidad")]
    pub quantity_t: f64, // 可用吨位
    #[serde(rename = "tipo", default)]
    pub category: Option<String>, // 类别标注 (可缺省, 以目录为准)
}

// ==========================================
// StockProvider - 库存快照契约
// ==========================================
pub trait StockProvider {
    /// 当前库存快照
    fn current(&self) -> Result<HashMap<String, StockEntry>, CatalogError>;
}

// ==========================================
// InMemoryStock - 内存库存 (测试与直连场景)
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct InMemoryStock {
    entries: HashMap<String, StockEntry>,
}

impl InMemoryStock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, quantity_t: f64) {
        self.entries.insert(
            name.to_string(),
            StockEntry {
                quantity_t,
                category: None,
            },
        );
    }
}

impl StockProvider for InMemoryStock {
    fn current(&self) -> Result<HashMap<String, StockEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}

// ==========================================
// JsonStockFile - JSON 文件库存
// ==========================================
// 文件形如: { "maiz": {"cantidad": 120.0, "tipo": "solido"}, ... }
#[derive(Debug, Clone)]
pub struct JsonStockFile {
    path: PathBuf,
}

impl JsonStockFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StockProvider for JsonStockFile {
    fn current(&self) -> Result<HashMap<String, StockEntry>, CatalogError> {
        if !self.path.exists() {
            return Err(CatalogError::FileNotFound(
                self.path.display().to_string(),
            ));
        }
        let raw = fs::read_to_string(&self.path)?;
        let entries: HashMap<String, StockEntry> = serde_json::from_str(&raw)?;
        Ok(entries)
    }
}
