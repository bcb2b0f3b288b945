//! 上游数据源实现
//!
//! 参考 akshare 的接口实现，按数据提供方拆分：
//! - 东方财富：历史行情、主营构成、分红送配、个股新闻
//! - 同花顺：财务摘要
//! - 财新：财经要闻
//! - 沪深京交易所：代码表、融资融券明细

mod caixin;
mod common;
mod eastmoney;
mod exchange;
mod ths;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::Result;
use crate::models::{
    BusinessComposition, DividendDetail, FinancialAbstract, FinancialNews, MarginDetail,
    PriceBar, StockCodeRecord, StockNews,
};
use crate::validation::{AbstractIndicator, DateRange, PriceAdjust, PricePeriod, StockCode};

use super::source::DataSource;

pub use common::beijing_today;

/// 基于 HTTP 的数据源，所有请求共用一个连接池
pub struct HttpDataSource {
    /// HTTP 客户端
    client: Client,
}

impl HttpDataSource {
    /// 按配置构建 HTTP 客户端
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn a_share_code_list(&self) -> Result<Vec<StockCodeRecord>> {
        exchange::fetch_a_share_code_list(&self.client).await
    }

    async fn business_composition(&self, code: &StockCode) -> Result<Vec<BusinessComposition>> {
        eastmoney::fetch_business_composition(&self.client, code).await
    }

    async fn price_history(
        &self,
        code: &StockCode,
        range: &DateRange,
        period: PricePeriod,
        adjust: PriceAdjust,
    ) -> Result<Vec<PriceBar>> {
        eastmoney::fetch_price_history(&self.client, code, range, period, adjust).await
    }

    async fn financial_abstract(
        &self,
        code: &StockCode,
        indicator: AbstractIndicator,
    ) -> Result<Vec<FinancialAbstract>> {
        ths::fetch_financial_abstract(&self.client, code, indicator).await
    }

    async fn margin_detail(&self, code: &StockCode, date: NaiveDate) -> Result<Vec<MarginDetail>> {
        exchange::fetch_margin_detail(&self.client, code, date).await
    }

    async fn dividend_detail(&self, code: &StockCode) -> Result<Vec<DividendDetail>> {
        eastmoney::fetch_dividend_detail(&self.client, code).await
    }

    async fn financial_news(&self) -> Result<Vec<FinancialNews>> {
        caixin::fetch_financial_news(&self.client).await
    }

    async fn stock_news(&self, code: &StockCode) -> Result<Vec<StockNews>> {
        eastmoney::fetch_stock_news(&self.client, code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_from_default_config() {
        assert!(HttpDataSource::new(&UpstreamConfig::default()).is_ok());
    }
}
