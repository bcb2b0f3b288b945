//! 新闻数据模型

use serde::{Deserialize, Serialize};

/// 个股新闻
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockNews {
    /// 关键词（查询所用的股票代码）
    pub keyword: String,
    pub title: String,
    pub content: String,
    /// 发布时间 YYYY-MM-DD HH:MM:SS
    pub publish_time: String,
    /// 文章来源
    pub source: String,
    pub url: String,
}

/// 财经要闻
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialNews {
    pub title: String,
    pub content: String,
    /// 发布时间 YYYY-MM-DD HH:MM:SS
    pub publish_time: String,
    pub url: String,
}
