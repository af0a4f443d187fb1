// ==========================================
// 沼气电站配料优化引擎 - 命令行主入口
// ==========================================
// 技术栈: Rust + serde + tracing
// 系统定位: 决策支持系统 (方案由人工最终确认)
// ==========================================
// 用法:
//   biogas-mix-engine <目录文件.json|.xlsx> [库存文件.json] [请求文件.json]
//
// 输出: 配料方案响应 JSON (stdout)
// ==========================================

use anyhow::{bail, Context, Result};
use biogas_mix_engine::api::{RecipeApi, RecipeRequest};
use biogas_mix_engine::catalog::{JsonStockFile, MaterialCatalog, StockProvider};
use biogas_mix_engine::logging;
use std::fs;

fn main() -> Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 决策支持系统", biogas_mix_engine::APP_NAME);
    tracing::info!("系统版本: {}", biogas_mix_engine::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let catalog_path = match args.next() {
        Some(p) => p,
        None => {
            bail!(
                "用法: biogas-mix-engine <目录文件.json|.xlsx> [库存文件.json] [请求文件.json]"
            );
        }
    };

    // 物料目录
    let catalog = MaterialCatalog::new();
    let mut snapshot = catalog
        .load(&catalog_path)
        .with_context(|| format!("加载物料目录失败: {}", catalog_path))?;
    tracing::info!("物料目录: {} ({} 条)", catalog_path, snapshot.materials().len());

    // 库存快照 (可选)
    if let Some(stock_path) = args.next() {
        let stock = JsonStockFile::new(&stock_path)
            .current()
            .with_context(|| format!("加载库存快照失败: {}", stock_path))?;
        snapshot.apply_stock(&stock);
        tracing::info!("库存快照: {} ({} 条)", stock_path, stock.len());
    }

    // 请求 (可选, 缺省走线上表单默认值)
    let request = match args.next() {
        Some(request_path) => {
            let raw = fs::read_to_string(&request_path)
                .with_context(|| format!("读取请求文件失败: {}", request_path))?;
            RecipeRequest::from_json(&raw)
                .with_context(|| format!("解析请求文件失败: {}", request_path))?
        }
        None => RecipeRequest::default(),
    };

    // 计算并输出
    let materials = snapshot.into_materials();
    let api = RecipeApi::new();
    let result = api
        .calculate(&materials, &request)
        .context("配料方案计算失败")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
