//! 外部数据源接口
//!
//! 每个查询主题对应一个方法，返回已翻译字段的表格记录。
//! 生产实现为 [`HttpDataSource`](super::upstream::HttpDataSource)

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    BusinessComposition, DividendDetail, FinancialAbstract, FinancialNews, MarginDetail,
    PriceBar, StockCodeRecord, StockNews,
};
use crate::validation::{AbstractIndicator, DateRange, PriceAdjust, PricePeriod, StockCode};

#[async_trait]
pub trait DataSource: Send + Sync {
    /// 沪深京 A 股代码和简称全表
    async fn a_share_code_list(&self) -> Result<Vec<StockCodeRecord>>;

    async fn business_composition(&self, code: &StockCode) -> Result<Vec<BusinessComposition>>;

    async fn price_history(
        &self,
        code: &StockCode,
        range: &DateRange,
        period: PricePeriod,
        adjust: PriceAdjust,
    ) -> Result<Vec<PriceBar>>;

    async fn financial_abstract(
        &self,
        code: &StockCode,
        indicator: AbstractIndicator,
    ) -> Result<Vec<FinancialAbstract>>;

    /// 指定交易日的融资融券明细，只含该证券的记录
    async fn margin_detail(&self, code: &StockCode, date: NaiveDate) -> Result<Vec<MarginDetail>>;

    async fn dividend_detail(&self, code: &StockCode) -> Result<Vec<DividendDetail>>;

    /// 最新财经要闻，不按日期过滤
    async fn financial_news(&self) -> Result<Vec<FinancialNews>>;

    /// 个股最新新闻，不按日期过滤
    async fn stock_news(&self, code: &StockCode) -> Result<Vec<StockNews>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! 测试用数据源：返回预置数据并记录每次调用

    use super::*;
    use crate::error::ToolError;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeSource {
        pub codes: Vec<StockCodeRecord>,
        pub bars: Vec<PriceBar>,
        pub margin_rows: Vec<MarginDetail>,
        pub financial_news: Vec<FinancialNews>,
        pub stock_news: Vec<StockNews>,
        /// 设置后所有调用都返回 UpstreamUnavailable
        pub unavailable: bool,
        /// 调用记录
        pub call_log: Mutex<Vec<String>>,
    }

    impl FakeSource {
        pub fn calls(&self) -> Vec<String> {
            self.call_log.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<()> {
            self.call_log.lock().unwrap().push(call);
            if self.unavailable {
                return Err(ToolError::unavailable("connection refused"));
            }
            Ok(())
        }
    }

    pub fn code(name: &str, stock_code: &str) -> StockCodeRecord {
        StockCodeRecord {
            name: name.to_string(),
            stock_code: stock_code.to_string(),
        }
    }

    pub fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: date.to_string(),
            stock_code: "601688".to_string(),
            open: close - 0.1,
            close,
            high: close + 0.2,
            low: close - 0.3,
            volume: 100_000,
            turnover: Some(1.5e8),
            amplitude: Some(2.1),
            change_rate: Some(0.5),
            change_amount: Some(0.07),
            turnover_rate: Some(0.3),
        }
    }

    pub fn stock_news_item(title: &str, publish_time: &str) -> StockNews {
        StockNews {
            keyword: "601688".to_string(),
            title: title.to_string(),
            content: format!("{} 正文", title),
            publish_time: publish_time.to_string(),
            source: "证券时报".to_string(),
            url: "http://finance.eastmoney.com/a/202405103070000001.html".to_string(),
        }
    }

    pub fn news(title: &str, publish_time: &str) -> FinancialNews {
        FinancialNews {
            title: title.to_string(),
            content: format!("{} 正文", title),
            publish_time: publish_time.to_string(),
            url: "https://example.com/news".to_string(),
        }
    }

    #[async_trait]
    impl DataSource for FakeSource {
        async fn a_share_code_list(&self) -> Result<Vec<StockCodeRecord>> {
            self.record("a_share_code_list".to_string())?;
            Ok(self.codes.clone())
        }

        async fn business_composition(&self, code: &StockCode) -> Result<Vec<BusinessComposition>> {
            self.record(format!("business_composition:{}", code.prefixed()))?;
            Ok(Vec::new())
        }

        async fn price_history(
            &self,
            code: &StockCode,
            range: &DateRange,
            period: PricePeriod,
            adjust: PriceAdjust,
        ) -> Result<Vec<PriceBar>> {
            self.record(format!(
                "price_history:{}:{}-{}:{}:{}",
                code,
                range.start_str(),
                range.end_str(),
                period,
                adjust
            ))?;
            Ok(self.bars.clone())
        }

        async fn financial_abstract(
            &self,
            code: &StockCode,
            indicator: AbstractIndicator,
        ) -> Result<Vec<FinancialAbstract>> {
            self.record(format!("financial_abstract:{}:{}", code, indicator))?;
            Ok(Vec::new())
        }

        async fn margin_detail(&self, code: &StockCode, date: NaiveDate) -> Result<Vec<MarginDetail>> {
            let day = date.format("%Y%m%d").to_string();
            self.record(format!("margin_detail:{}:{}", code, day))?;
            Ok(self
                .margin_rows
                .iter()
                .filter(|row| row.trading_date == day && row.target_security_code == code.code())
                .cloned()
                .collect())
        }

        async fn dividend_detail(&self, code: &StockCode) -> Result<Vec<DividendDetail>> {
            self.record(format!("dividend_detail:{}", code))?;
            Ok(Vec::new())
        }

        async fn financial_news(&self) -> Result<Vec<FinancialNews>> {
            self.record("financial_news".to_string())?;
            Ok(self.financial_news.clone())
        }

        async fn stock_news(&self, code: &StockCode) -> Result<Vec<StockNews>> {
            self.record(format!("stock_news:{}", code))?;
            Ok(self.stock_news.clone())
        }
    }
}
