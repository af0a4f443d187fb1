// ==========================================
// 沼气电站配料优化引擎 - 物料目录加载器
// ==========================================
// 支持: JSON 物料基础表 / Excel 化验表 (.xlsx/.xls)
// 职责: 文件 → Material 快照; 库存叠加由快照方法完成
// 红线: 快照是值对象, 引擎层只读; 无模块级缓存,
//       刷新时机完全由调用方掌握
// ==========================================

use crate::catalog::error::CatalogError;
use crate::catalog::stock::StockEntry;
use crate::domain::types::MaterialCategory;
use crate::domain::Material;
use calamine::{open_workbook, Reader, Xlsx};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// 库存快照未覆盖的物料默认可用吨位
pub const DEFAULT_STOCK_T: f64 = 100.0;

// ==========================================
// RawJsonEntry - JSON 基础表原始条目
// ==========================================
// 成分字段以小数存储 (0.30 = 30%); kw/tn 以 MWh/t 存储
#[derive(Debug, Clone, Deserialize)]
struct RawJsonEntry {
    #[serde(default)]
    st: f64,
    #[serde(default)]
    sv: f64,
    #[serde(default)]
    carbohidratos: f64,
    #[serde(default)]
    lipidos: f64,
    #[serde(default)]
    proteinas: f64,
    #[serde(default = "default_density")]
    densidad: f64,
    #[serde(default)]
    m3_tnsv: f64,
    #[serde(rename = "kw/tn", default)]
    kw_tn: f64,
    #[serde(default)]
    ch4: f64,
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default = "default_methane_pct")]
    porcentaje_metano: f64,
}

fn default_density() -> f64 {
    1.0
}

fn default_methane_pct() -> f64 {
    65.0
}

// ==========================================
// CatalogSnapshot - 单次调用的目录快照
// ==========================================
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    materials: Vec<Material>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            materials,
            loaded_at: Utc::now(),
        }
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// 叠加库存快照: 覆盖快照内出现的物料吨位,
    /// 未覆盖的物料保持目录默认值
    pub fn apply_stock(&mut self, stock: &HashMap<String, StockEntry>) {
        for material in self.materials.iter_mut() {
            if let Some(entry) = stock.get(&material.name) {
                material.stock_available_t = entry.quantity_t;
            }
        }
    }

    pub fn into_materials(self) -> Vec<Material> {
        self.materials
    }
}

// ==========================================
// MaterialCatalog - 物料目录加载器
// ==========================================
pub struct MaterialCatalog {
    // 无状态加载器, 不需要注入依赖
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self {}
    }

    /// 按扩展名自动选择加载路径
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<CatalogSnapshot, CatalogError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "json" => self.load_json(path),
            "xlsx" | "xls" => self.load_excel(path),
            other => Err(CatalogError::UnsupportedFormat(other.to_string())),
        }
    }

    /// 加载 JSON 物料基础表
    ///
    /// 文件形如: { "maiz": {"st": 0.30, "sv": 0.90, "m3_tnsv": 600,
    ///            "kw/tn": 1.2, "tipo": "solido", ...}, ... }
    ///
    /// 换算口径: 成分小数 ×100 → 百分比; kw/tn ×1000 → kWh/t;
    /// ch4 ×1000 → m³/t
    pub fn load_json<P: AsRef<Path>>(&self, path: P) -> Result<CatalogSnapshot, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.display().to_string()));
        }

        let raw = fs::read_to_string(path)?;
        // BTreeMap: 目录遍历顺序与结果确定性
        let entries: BTreeMap<String, RawJsonEntry> = serde_json::from_str(&raw)?;

        let mut materials = Vec::with_capacity(entries.len());
        for (name, entry) in entries {
            let category = match entry.tipo.as_deref() {
                Some(raw_category) => raw_category
                    .parse::<MaterialCategory>()
                    .unwrap_or_else(|_| Self::classify_by_name(&name)),
                None => Self::classify_by_name(&name),
            };

            materials.push(Material {
                name,
                category,
                st_pct: entry.st * 100.0,
                sv_pct: entry.sv * 100.0,
                svt_pct: entry.st * entry.sv * 100.0,
                carbohydrates_pct: entry.carbohidratos * 100.0,
                lipids_pct: entry.lipidos * 100.0,
                proteins_pct: entry.proteinas * 100.0,
                density: entry.densidad,
                biogas_m3_per_tonne: entry.m3_tnsv,
                baseline_kwh_per_tonne: entry.kw_tn * 1000.0,
                baseline_ch4_m3_per_tonne: entry.ch4 * 1000.0,
                methane_pct: entry.porcentaje_metano,
                stock_available_t: DEFAULT_STOCK_T,
            });
        }

        debug!(count = materials.len(), path = %path.display(), "JSON 物料目录加载完成");
        Ok(CatalogSnapshot::new(materials))
    }

    /// 加载 Excel 化验表 (列: Tipo / ST % / SV % / SVT % /
    /// Carbohidratos % / Lipidos % / Proteinas % / m3/TnSV /
    /// Tn SV / Densidad (kg/L))
    ///
    /// 缺 Tipo 或 m3/TnSV 的行跳过; 类别按名称关键词判定
    pub fn load_excel<P: AsRef<Path>>(&self, path: P) -> Result<CatalogSnapshot, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CatalogError::FileNotFound(path.display().to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e: calamine::XlsxError| CatalogError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.is_empty() {
            return Err(CatalogError::ExcelParseError("Excel 文件无工作表".to_string()));
        }
        let sheet_name = sheet_names[0].clone();
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| CatalogError::ExcelParseError(e.to_string()))?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| CatalogError::ExcelParseError("Excel 文件无数据行".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let mut materials = Vec::new();
        for data_row in rows {
            let mut row_map: HashMap<&str, String> = HashMap::new();
            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.as_str(), cell.to_string().trim().to_string());
                }
            }

            let name = match row_map.get("Tipo") {
                Some(v) if !v.is_empty() => v.clone(),
                _ => continue,
            };
            let biogas = Self::cell_f64(&row_map, "m3/TnSV");
            if biogas <= 0.0 {
                warn!(material = %name, "m3/TnSV 缺失, 跳过该行");
                continue;
            }

            let st_pct = Self::cell_f64(&row_map, "ST %");
            let sv_pct = Self::cell_f64(&row_map, "SV %");
            materials.push(Material {
                category: Self::classify_by_name(&name),
                name,
                st_pct,
                sv_pct,
                svt_pct: Self::cell_f64(&row_map, "SVT %"),
                carbohydrates_pct: Self::cell_f64(&row_map, "Carbohidratos %"),
                lipids_pct: Self::cell_f64(&row_map, "Lipidos %"),
                proteins_pct: Self::cell_f64(&row_map, "Proteinas %"),
                density: {
                    let d = Self::cell_f64(&row_map, "Densidad (kg/L)");
                    if d > 0.0 {
                        d
                    } else {
                        1.0
                    }
                },
                biogas_m3_per_tonne: biogas,
                // 化验表不含基准电产率, 由产率计算器现算
                baseline_kwh_per_tonne: 0.0,
                baseline_ch4_m3_per_tonne: 0.0,
                methane_pct: default_methane_pct(),
                stock_available_t: Self::cell_f64(&row_map, "Tn SV"),
            });
        }

        debug!(count = materials.len(), path = %path.display(), "Excel 物料目录加载完成");
        Ok(CatalogSnapshot::new(materials))
    }

    /// 名称关键词分类 (与原始化验表口径一致)
    fn classify_by_name(name: &str) -> MaterialCategory {
        let lower = name.to_lowercase();
        if lower.contains("purin") || lower.contains("purín") {
            MaterialCategory::Slurry
        } else if ["lactosa", "suero", "gomas", "grasa"]
            .iter()
            .any(|kw| lower.contains(kw))
        {
            MaterialCategory::Liquid
        } else {
            MaterialCategory::Solid
        }
    }

    fn cell_f64(row: &HashMap<&str, String>, key: &str) -> f64 {
        row.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}
