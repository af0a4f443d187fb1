// ==========================================
// 沼气电站配料优化引擎 - 目录层
// ==========================================
// 职责: 物料目录与库存快照的加载, 引擎层的唯一数据入口
// ==========================================

pub mod error;
pub mod material_catalog;
pub mod stock;

pub use error::CatalogError;
pub use material_catalog::{CatalogSnapshot, MaterialCatalog, DEFAULT_STOCK_T};
pub use stock::{InMemoryStock, JsonStockFile, StockEntry, StockProvider};
