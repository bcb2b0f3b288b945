//! A 股数据工具服务
//!
//! 以 MCP（JSON-RPC 2.0）和 REST 两种形式提供 A 股数据查询工具
//! 数据来源：东方财富、同花顺、财新、沪深京交易所

mod config;     // 配置
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod tools;      // 工具注册表
mod validation; // 参数校验

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::services::{HttpDataSource, StockDataForwarder};

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    match &config.source {
        Some(path) => log::info!("已加载配置文件 {}", path.display()),
        None => log::info!("未找到配置文件，使用默认配置"),
    }
    if config.api.api_key.is_empty() {
        log::warn!("未配置 API Key，所有接口无需认证");
    }

    let source = HttpDataSource::new(&config.upstream)?;
    let forwarder = web::Data::new(StockDataForwarder::new(
        Arc::new(source),
        config.tools.clone(),
    ));

    let bind_addr = config.bind_addr();
    log::info!("启动 A 股数据工具服务，监听 {}", bind_addr);

    let api_key = config.api.api_key.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(forwarder.clone())
            .wrap(ApiKeyMiddleware::new(api_key.clone())) // API Key 认证
            .wrap(Logger::default()) // 请求日志
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await?;
    Ok(())
}
