//! 数据转发层
//!
//! 每个工具对应一个方法：先校验参数，校验通过后才调用数据源，
//! 再按需做字段筛选或日期过滤。单次调用、不重试、不缓存

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

use crate::config::ToolsConfig;
use crate::error::{Result, ToolError};
use crate::models::{
    BusinessComposition, DividendDetail, FinancialAbstract, FinancialNews, MarginDetail,
    PriceBar, StockCodeRecord, StockNews,
};
use crate::validation::{
    validate_date_range, validate_news_date, validate_stock_code, AbstractIndicator, Market,
    MarginFrequency, PriceAdjust, PricePeriod,
};

use super::source::DataSource;
use super::upstream::beijing_today;

/// 新闻发布时间可能出现的格式
const PUBLISH_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

pub struct StockDataForwarder {
    source: Arc<dyn DataSource>,
    settings: ToolsConfig,
}

impl StockDataForwarder {
    pub fn new(source: Arc<dyn DataSource>, settings: ToolsConfig) -> Self {
        Self { source, settings }
    }

    /// 当前北京时间日期，格式 YYYY-MM-DD
    pub fn today(&self) -> String {
        beijing_today().format("%Y-%m-%d").to_string()
    }

    /// 按名称查询股票代码
    ///
    /// 名称按子串匹配，忽略空白（深交所简称中常含全角空格）；无匹配返回空列表
    pub async fn stock_code(&self, name: &str) -> Result<Vec<StockCodeRecord>> {
        let needle = normalize_name(name);
        if needle.is_empty() {
            return Err(ToolError::invalid("股票名称不能为空"));
        }

        let codes = self.source.a_share_code_list().await?;
        Ok(codes
            .into_iter()
            .filter(|record| normalize_name(&record.name).contains(&needle))
            .collect())
    }

    pub async fn business_structure(&self, stock_code: &str) -> Result<Vec<BusinessComposition>> {
        let code = validate_stock_code(stock_code)?;
        self.source.business_composition(&code).await
    }

    pub async fn historical_prices(
        &self,
        stock_code: &str,
        start_date: &str,
        end_date: &str,
        period: &str,
        adjust: &str,
    ) -> Result<Vec<PriceBar>> {
        let code = validate_stock_code(stock_code)?;
        let range = validate_date_range(start_date, end_date)?;
        let period: PricePeriod = period.parse()?;
        let adjust: PriceAdjust = adjust.parse()?;

        self.source.price_history(&code, &range, period, adjust).await
    }

    pub async fn financial_abstract(
        &self,
        stock_code: &str,
        indicator: &str,
    ) -> Result<Vec<FinancialAbstract>> {
        let code = validate_stock_code(stock_code)?;
        let indicator: AbstractIndicator = indicator.parse()?;
        self.source.financial_abstract(&code, indicator).await
    }

    /// 融资融券明细
    ///
    /// 按频率采样区间内的日期逐日查询；无数据的日期跳过，任一日期上游失败则整体失败
    pub async fn margin_detail(
        &self,
        stock_code: &str,
        start_date: &str,
        end_date: &str,
        freq: &str,
    ) -> Result<Vec<MarginDetail>> {
        let code = validate_stock_code(stock_code)?;
        let range = validate_date_range(start_date, end_date)?;
        let freq: MarginFrequency = freq.parse()?;

        let dates = freq.sample_dates(&range);
        if dates.len() > self.settings.max_margin_dates {
            return Err(ToolError::invalid(format!(
                "查询日期数 {} 超过上限 {}，请缩小日期区间或使用更稀疏的频率",
                dates.len(),
                self.settings.max_margin_dates
            )));
        }

        if code.market() == Market::Bj {
            log::info!("北交所证券 {} 无融资融券明细数据源", code);
            return Ok(Vec::new());
        }

        let mut result = Vec::new();
        for date in dates {
            let rows = self.source.margin_detail(&code, date).await?;
            if rows.is_empty() {
                log::debug!("{} 在 {} 无融资融券数据", code, date);
                continue;
            }
            result.extend(rows);
        }
        Ok(result)
    }

    pub async fn dividend_detail(&self, stock_code: &str) -> Result<Vec<DividendDetail>> {
        let code = validate_stock_code(stock_code)?;
        self.source.dividend_detail(&code).await
    }

    /// 财经要闻，按发布时间过滤到 [start, end] 区间（结束日全天有效）
    pub async fn financial_news(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<FinancialNews>> {
        let window = self.news_window(start_date, end_date, beijing_today())?;
        let news = self.source.financial_news().await?;
        Ok(news
            .into_iter()
            .filter(|item| window.contains(&item.publish_time))
            .collect())
    }

    /// 个股新闻，过滤规则同 financial_news
    pub async fn stock_news(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<StockNews>> {
        let code = validate_stock_code(stock_code)?;
        let window = self.news_window(start_date, end_date, beijing_today())?;
        let news = self.source.stock_news(&code).await?;
        Ok(news
            .into_iter()
            .filter(|item| window.contains(&item.publish_time))
            .collect())
    }

    fn news_window(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
        today: NaiveDate,
    ) -> Result<NewsWindow> {
        let start = non_blank(start_date).map(validate_news_date).transpose()?;
        let end = non_blank(end_date).map(validate_news_date).transpose()?;

        // 只有两端都由调用方给出时才校验先后；缺省的一端向给定的一端靠拢
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if start > end => {
                return Err(ToolError::invalid(format!(
                    "开始日期 {} 晚于结束日期 {}",
                    start, end
                )));
            }
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, start.max(today)),
            (None, Some(end)) => {
                let default_start = today - Duration::days(self.settings.news_window_days);
                (default_start.min(end), end)
            }
            (None, None) => (today - Duration::days(self.settings.news_window_days), today),
        };
        Ok(NewsWindow {
            start: start.and_time(NaiveTime::MIN),
            end: (end + Duration::days(1)).and_time(NaiveTime::MIN),
        })
    }
}

/// 新闻发布时间窗口 [start, end)
#[derive(Debug, Clone, Copy)]
struct NewsWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl NewsWindow {
    /// 无法解析的发布时间视为不在窗口内
    fn contains(&self, publish_time: &str) -> bool {
        parse_publish_time(publish_time).map_or(false, |t| t >= self.start && t < self.end)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

fn parse_publish_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    PUBLISH_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
