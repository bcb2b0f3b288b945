//! 工具注册表
//!
//! 工具定义（名称、说明、入参 Schema）以及按名称分发调用。
//! MCP 的 tools/call 和 REST 的 /tools/{name} 共用这里的逻辑

pub mod schema;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, ToolError};
use crate::models::ToolDefinition;
use crate::services::StockDataForwarder;
use crate::validation::{AbstractIndicator, MarginFrequency, PriceAdjust, PricePeriod};

use schema::{enumeration, object, string};

pub const GET_TODAY_DATE: &str = "get_today_date";
pub const GET_STOCK_CODE: &str = "get_stock_code";
pub const GET_STOCK_BUSINESS_STRUCTURE: &str = "get_stock_business_structure";
pub const GET_HISTORICAL_STOCKPRICE_DATA: &str = "get_historical_stockprice_data";
pub const GET_STOCK_FINANCIAL_ABSTRACT: &str = "get_stock_financial_abstract";
pub const GET_STOCK_MARGIN_DETAIL: &str = "get_stock_margin_detail";
pub const GET_STOCK_FHPS_DETAIL: &str = "get_stock_fhps_detail";
pub const FINANCIAL_NEWS: &str = "financial_news";
pub const STOCK_NEWS: &str = "stock_news";

const STOCK_CODE_DESC: &str = "股票代码，6 位数字，可带 SH/SZ/BJ 前缀，例如 \"600000\"";
const START_DATE_DESC: &str = "开始日期，格式 YYYYMMDD";
const END_DATE_DESC: &str = "结束日期，格式 YYYYMMDD";
const BUSINESS_STRUCTURE_DESC: &str = "获取 A 股上市公司主营构成（东方财富），按行业、产品、地区分类。\
返回 reporting_period、classification_direction、classification、operating_revenue、\
operating_revenue_pct_of_main、operating_cost、operating_cost_pct_of_main、operating_profit、\
operating_profit_pct_of_main、gross_profit_margin；比例为小数。不含收入、成本、毛利率的同比增长字段";
const NEWS_START_DESC: &str = "开始日期，格式 YYYY-MM-DD 或 YYYYMMDD，默认一周前";
const NEWS_END_DESC: &str = "结束日期，格式 YYYY-MM-DD 或 YYYYMMDD，默认今天";

// ==================== 入参 ====================

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StockCodeArgs {
    stock_code: String,
}

#[derive(Debug, Deserialize)]
struct PriceArgs {
    stock_code: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    adjust: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbstractArgs {
    stock_code: String,
    #[serde(default)]
    indicator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarginArgs {
    stock_code: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    freq: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsArgs {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StockNewsArgs {
    stock_code: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

/// 缺省参数按空对象处理
fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = match arguments {
        Value::Null => json!({}),
        Value::Object(_) => arguments,
        other => {
            return Err(ToolError::invalid(format!(
                "工具参数必须是 JSON 对象，实际为: {}",
                other
            )))
        }
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(format!("参数解析失败: {}", e)))
}

fn to_value<T: Serialize>(records: T) -> Result<Value> {
    serde_json::to_value(records).map_err(|e| ToolError::data(format!("序列化结果失败: {}", e)))
}

// ==================== 定义与分发 ====================

/// 所有工具的定义，顺序即 tools/list 的返回顺序
pub fn definitions() -> Vec<ToolDefinition> {
    let date_range = |extra: Value| {
        let mut properties = json!({
            "stock_code": string(STOCK_CODE_DESC),
            "start_date": string(START_DATE_DESC),
            "end_date": string(END_DATE_DESC),
        });
        if let (Some(map), Value::Object(extra)) = (properties.as_object_mut(), extra) {
            map.extend(extra);
        }
        object(properties, &["stock_code", "start_date", "end_date"])
    };

    vec![
        define(
            GET_TODAY_DATE,
            "获取当前日期（北京时间），格式 YYYY-MM-DD",
            object(json!({}), &[]),
        ),
        define(
            GET_STOCK_CODE,
            "按公司名称查询中国 A 股上市公司股票代码，名称按包含关系匹配。返回 name、stock_code",
            object(json!({ "name": string("公司名称或简称，例如 \"华泰证券\"") }), &["name"]),
        ),
        define(
            GET_STOCK_BUSINESS_STRUCTURE,
            BUSINESS_STRUCTURE_DESC,
            object(json!({ "stock_code": string(STOCK_CODE_DESC) }), &["stock_code"]),
        ),
        define(
            GET_HISTORICAL_STOCKPRICE_DATA,
            "获取 A 股历史行情：开盘、收盘、最高、最低、成交量、成交额、振幅、涨跌幅、涨跌额、换手率",
            date_range(json!({
                "period": enumeration("数据周期", PricePeriod::ALLOWED, PricePeriod::default().as_str()),
                "adjust": enumeration(
                    "复权方式：\"\" 不复权，qfq 前复权，hfq 后复权",
                    PriceAdjust::ALLOWED,
                    PriceAdjust::default().as_str(),
                ),
            })),
        ),
        define(
            GET_STOCK_FINANCIAL_ABSTRACT,
            "获取 A 股上市公司财务摘要：净利润、营业总收入、每股指标、盈利能力、营运能力、偿债能力",
            object(
                json!({
                    "stock_code": string(STOCK_CODE_DESC),
                    "indicator": enumeration(
                        "汇总口径",
                        AbstractIndicator::ALLOWED,
                        AbstractIndicator::default().as_str(),
                    ),
                }),
                &["stock_code"],
            ),
        ),
        define(
            GET_STOCK_MARGIN_DETAIL,
            "获取 A 股融资融券明细（沪深两市），按频率在日期区间内采样交易日",
            date_range(json!({
                "freq": enumeration(
                    "日期采样频率：D 每日，W 每周五，MS 月初，ME 月末，Q 季末，Y 年末",
                    MarginFrequency::ALLOWED,
                    MarginFrequency::default().as_str(),
                ),
            })),
        ),
        define(
            GET_STOCK_FHPS_DETAIL,
            "获取 A 股上市公司历年分红送配明细：送转比例、现金分红、股权登记日、除权除息日等",
            object(json!({ "stock_code": string(STOCK_CODE_DESC) }), &["stock_code"]),
        ),
        define(
            FINANCIAL_NEWS,
            "获取指定日期区间内的最新财经要闻",
            object(
                json!({
                    "start_date": string(NEWS_START_DESC),
                    "end_date": string(NEWS_END_DESC),
                }),
                &[],
            ),
        ),
        define(
            STOCK_NEWS,
            "获取指定日期区间内与某只股票相关的最新新闻",
            object(
                json!({
                    "stock_code": string(STOCK_CODE_DESC),
                    "start_date": string(NEWS_START_DESC),
                    "end_date": string(NEWS_END_DESC),
                }),
                &["stock_code"],
            ),
        ),
    ]
}

fn define(name: &str, description: &str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// 按名称调用工具，返回可直接序列化的结果
pub async fn call_tool(
    forwarder: &StockDataForwarder,
    name: &str,
    arguments: Value,
) -> Result<Value> {
    log::info!("🔧 调用工具 {} 参数: {}", name, arguments);

    match name {
        GET_TODAY_DATE => Ok(Value::String(forwarder.today())),
        GET_STOCK_CODE => {
            let args: NameArgs = parse_args(arguments)?;
            to_value(forwarder.stock_code(&args.name).await?)
        }
        GET_STOCK_BUSINESS_STRUCTURE => {
            let args: StockCodeArgs = parse_args(arguments)?;
            to_value(forwarder.business_structure(&args.stock_code).await?)
        }
        GET_HISTORICAL_STOCKPRICE_DATA => {
            let args: PriceArgs = parse_args(arguments)?;
            let period = args.period.as_deref().unwrap_or(PricePeriod::default().as_str());
            let adjust = args.adjust.as_deref().unwrap_or(PriceAdjust::default().as_str());
            to_value(
                forwarder
                    .historical_prices(&args.stock_code, &args.start_date, &args.end_date, period, adjust)
                    .await?,
            )
        }
        GET_STOCK_FINANCIAL_ABSTRACT => {
            let args: AbstractArgs = parse_args(arguments)?;
            let indicator = args
                .indicator
                .as_deref()
                .unwrap_or(AbstractIndicator::default().as_str());
            to_value(forwarder.financial_abstract(&args.stock_code, indicator).await?)
        }
        GET_STOCK_MARGIN_DETAIL => {
            let args: MarginArgs = parse_args(arguments)?;
            let freq = args.freq.as_deref().unwrap_or(MarginFrequency::default().as_str());
            to_value(
                forwarder
                    .margin_detail(&args.stock_code, &args.start_date, &args.end_date, freq)
                    .await?,
            )
        }
        GET_STOCK_FHPS_DETAIL => {
            let args: StockCodeArgs = parse_args(arguments)?;
            to_value(forwarder.dividend_detail(&args.stock_code).await?)
        }
        FINANCIAL_NEWS => {
            let args: NewsArgs = parse_args(arguments)?;
            to_value(
                forwarder
                    .financial_news(args.start_date.as_deref(), args.end_date.as_deref())
                    .await?,
            )
        }
        STOCK_NEWS => {
            let args: StockNewsArgs = parse_args(arguments)?;
            to_value(
                forwarder
                    .stock_news(&args.stock_code, args.start_date.as_deref(), args.end_date.as_deref())
                    .await?,
            )
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::services::source::testing::{bar, code, stock_news_item, FakeSource};
    use std::sync::Arc;

    fn forwarder(source: Arc<FakeSource>) -> StockDataForwarder {
        StockDataForwarder::new(source, ToolsConfig::default())
    }

    #[test]
    fn test_definitions_are_unique_and_complete() {
        let defs = definitions();
        assert_eq!(defs.len(), 9);

        let mut names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);

        for def in &defs {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
        }

        let price = defs
            .iter()
            .find(|d| d.name == GET_HISTORICAL_STOCKPRICE_DATA)
            .unwrap();
        assert_eq!(price.input_schema["required"], json!(["stock_code", "start_date", "end_date"]));
        assert_eq!(price.input_schema["properties"]["period"]["default"], "daily");
    }

    #[test]
    fn test_business_structure_description_lists_fields() {
        let defs = definitions();
        let def = defs
            .iter()
            .find(|d| d.name == GET_STOCK_BUSINESS_STRUCTURE)
            .unwrap();
        for field in ["operating_profit", "operating_profit_pct_of_main", "gross_profit_margin"] {
            assert!(def.description.contains(field), "缺少字段说明 {}", field);
        }
        assert!(!def.description.contains("yoy"));
        assert!(def.description.contains("同比增长"));
    }

    #[actix_web::test]
    async fn test_call_historical_prices_with_defaults() {
        let source = Arc::new(FakeSource {
            bars: vec![bar("2023-01-03", 14.1), bar("2023-01-04", 14.3)],
            ..Default::default()
        });
        let forwarder = forwarder(source.clone());

        let value = call_tool(
            &forwarder,
            GET_HISTORICAL_STOCKPRICE_DATA,
            json!({ "stock_code": "601688", "start_date": "20230101", "end_date": "20231001" }),
        )
        .await
        .unwrap();

        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[0]["date"], "2023-01-03");
        assert_eq!(source.calls(), vec!["price_history:601688:20230101-20231001:daily:"]);
    }

    #[actix_web::test]
    async fn test_call_stock_code() {
        let source = Arc::new(FakeSource {
            codes: vec![code("华泰证券", "601688"), code("平安银行", "000001")],
            ..Default::default()
        });
        let value = call_tool(&forwarder(source), GET_STOCK_CODE, json!({ "name": "华泰" }))
            .await
            .unwrap();
        assert_eq!(value, json!([{ "name": "华泰证券", "stock_code": "601688" }]));
    }

    #[actix_web::test]
    async fn test_call_stock_news_keeps_fields() {
        let source = Arc::new(FakeSource {
            stock_news: vec![
                stock_news_item("华泰证券发布公告", "2024-05-02 10:30:00"),
                stock_news_item("旧闻", "2024-04-01 08:00:00"),
            ],
            ..Default::default()
        });
        let value = call_tool(
            &forwarder(source.clone()),
            STOCK_NEWS,
            json!({ "stock_code": "601688", "start_date": "2024-05-01", "end_date": "2024-05-03" }),
        )
        .await
        .unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["keyword"], "601688");
        assert_eq!(items[0]["title"], "华泰证券发布公告");
        assert_eq!(items[0]["url"], "http://finance.eastmoney.com/a/202405103070000001.html");
        assert_eq!(items[0]["source"], "证券时报");
        assert_eq!(source.calls(), vec!["stock_news:601688"]);

        let err = call_tool(&forwarder(source), STOCK_NEWS, json!({ "stock_code": "SZ600000" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");
    }

    #[actix_web::test]
    async fn test_call_today_date_without_arguments() {
        let forwarder = forwarder(Arc::new(FakeSource::default()));
        let value = call_tool(&forwarder, GET_TODAY_DATE, Value::Null).await.unwrap();
        let today = value.as_str().unwrap();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
    }

    #[actix_web::test]
    async fn test_argument_errors() {
        let source = Arc::new(FakeSource::default());
        let forwarder = forwarder(source.clone());

        let err = call_tool(&forwarder, GET_STOCK_FHPS_DETAIL, json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        let err = call_tool(&forwarder, GET_STOCK_FHPS_DETAIL, json!(["600000"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        let err = call_tool(
            &forwarder,
            GET_STOCK_FINANCIAL_ABSTRACT,
            json!({ "stock_code": "600000", "indicator": "按月" }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "InvalidArgument");

        assert!(source.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_unknown_tool() {
        let forwarder = forwarder(Arc::new(FakeSource::default()));
        let err = call_tool(&forwarder, "get_weather", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "get_weather"));
    }
}
