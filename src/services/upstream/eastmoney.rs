//! 东方财富数据接口
//!
//! 历史行情、主营构成、分红送配、个股新闻

use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::OnceLock;
use url::Url;

use crate::error::{Result, ToolError};
use crate::models::{BusinessComposition, DividendDetail, PriceBar, StockNews};
use crate::validation::{DateRange, Market, PriceAdjust, PricePeriod, StockCode};

use super::common::{
    beijing_now, ensure_success, parse_number, strip_jsonp, value_date, value_f64, value_string,
    EM_ARTICLE_BASE, EM_BUSINESS_API, EM_DATACENTER_API, EM_KLINE_API, EM_SEARCH_API,
};

/// 东方财富前端使用的固定 ut 参数
const EM_KLINE_UT: &str = "7eea3edcaed734bea9cbfc24409ed989";
const EM_SEARCH_CALLBACK: &str = "jQuery3510875346244069884_1668256937995";
const STOCK_NEWS_PAGE_SIZE: u32 = 100;

fn highlight_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?em>").expect("高亮标签正则"))
}

// ==================== 历史行情 ====================

/// 获取A股历史行情
/// 对应 akshare 的 stock_zh_a_hist() 函数
pub async fn fetch_price_history(
    client: &Client,
    code: &StockCode,
    range: &DateRange,
    period: PricePeriod,
    adjust: PriceAdjust,
) -> Result<Vec<PriceBar>> {
    let market_id = if code.market() == Market::Sh { 1 } else { 0 };
    let secid = format!("{}.{}", market_id, code.code());
    let klt = match period {
        PricePeriod::Daily => "101",
        PricePeriod::Weekly => "102",
        PricePeriod::Monthly => "103",
    };
    let fqt = match adjust {
        PriceAdjust::Unadjusted => "0",
        PriceAdjust::Qfq => "1",
        PriceAdjust::Hfq => "2",
    };

    log::debug!("📡 请求历史行情 secid={} {}-{}", secid, range.start_str(), range.end_str());

    let response = client
        .get(EM_KLINE_API)
        .query(&[
            ("fields1", "f1,f2,f3,f4,f5,f6"),
            ("fields2", "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61,f116"),
            ("ut", EM_KLINE_UT),
            ("klt", klt),
            ("fqt", fqt),
            ("secid", secid.as_str()),
            ("beg", range.start_str().as_str()),
            ("end", range.end_str().as_str()),
        ])
        .send()
        .await?;
    let payload: Value = ensure_success(response, "历史行情")?.json().await?;

    parse_price_history(&payload, code)
}

/// 解析K线数据，每条为逗号分隔文本：
/// 日期,开盘,收盘,最高,最低,成交量,成交额,振幅,涨跌幅,涨跌额,换手率
pub fn parse_price_history(payload: &Value, code: &StockCode) -> Result<Vec<PriceBar>> {
    let data = &payload["data"];
    if data.is_null() {
        return Ok(Vec::new());
    }

    let klines = data["klines"]
        .as_array()
        .ok_or_else(|| ToolError::data("历史行情缺少 klines 字段"))?;
    let stock_code = data["code"].as_str().unwrap_or(code.code()).to_string();

    klines
        .iter()
        .map(|line| {
            let text = line
                .as_str()
                .ok_or_else(|| ToolError::data("K线记录不是文本"))?;
            let fields: Vec<&str> = text.split(',').collect();
            if fields.len() < 11 {
                return Err(ToolError::data(format!("K线字段不足: {}", text)));
            }
            let required = |idx: usize| {
                parse_number(fields[idx])
                    .ok_or_else(|| ToolError::data(format!("K线数值无效: {}", fields[idx])))
            };

            Ok(PriceBar {
                date: fields[0].to_string(),
                stock_code: stock_code.clone(),
                open: required(1)?,
                close: required(2)?,
                high: required(3)?,
                low: required(4)?,
                volume: required(5)? as u64,
                turnover: parse_number(fields[6]),
                amplitude: parse_number(fields[7]),
                change_rate: parse_number(fields[8]),
                change_amount: parse_number(fields[9]),
                turnover_rate: parse_number(fields[10]),
            })
        })
        .collect()
}

// ==================== 主营构成 ====================

/// 获取主营构成
/// 对应 akshare 的 stock_zygc_em() 函数，symbol 需带交易所前缀，如 SH688041
pub async fn fetch_business_composition(
    client: &Client,
    code: &StockCode,
) -> Result<Vec<BusinessComposition>> {
    let symbol = code.prefixed();
    log::debug!("📡 请求主营构成 URL: {}?code={}", EM_BUSINESS_API, symbol);

    let response = client
        .get(EM_BUSINESS_API)
        .query(&[("code", symbol.as_str())])
        .send()
        .await?;
    let payload: Value = ensure_success(response, "主营构成")?.json().await?;

    parse_business_composition(&payload)
}

fn classification_direction(value: &Value) -> String {
    match value_string(value).as_deref() {
        Some("1") => "按行业分类".to_string(),
        Some("2") => "按产品分类".to_string(),
        Some("3") => "按地区分类".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

pub fn parse_business_composition(payload: &Value) -> Result<Vec<BusinessComposition>> {
    let rows = match &payload["zygcfx"] {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        _ => return Err(ToolError::data("主营构成 zygcfx 字段不是数组")),
    };

    Ok(rows
        .iter()
        .map(|row| BusinessComposition {
            reporting_period: value_date(&row["REPORT_DATE"]).unwrap_or_default(),
            classification_direction: classification_direction(&row["MAINOP_TYPE"]),
            classification: value_string(&row["ITEM_NAME"]).unwrap_or_default(),
            operating_revenue: value_f64(&row["MAIN_BUSINESS_INCOME"]),
            operating_revenue_pct_of_main: value_f64(&row["MBI_RATIO"]),
            operating_cost: value_f64(&row["MAIN_BUSINESS_COST"]),
            operating_cost_pct_of_main: value_f64(&row["MBC_RATIO"]),
            // 东方财富接口字段名本身拼写为 RPOFIT
            operating_profit: value_f64(&row["MAIN_BUSINESS_RPOFIT"]),
            operating_profit_pct_of_main: value_f64(&row["MBR_RATIO"]),
            gross_profit_margin: value_f64(&row["GROSS_RPOFIT_RATIO"]),
        })
        .collect())
}

// ==================== 分红送配 ====================

/// 获取分红送配详情
/// 对应 akshare 的 stock_fhps_detail_em() 函数
pub async fn fetch_dividend_detail(client: &Client, code: &StockCode) -> Result<Vec<DividendDetail>> {
    let filter = format!("(SECURITY_CODE=\"{}\")", code.code());
    log::debug!("📡 请求分红送配 URL: {} filter={}", EM_DATACENTER_API, filter);

    let response = client
        .get(EM_DATACENTER_API)
        .query(&[
            ("sortColumns", "REPORT_DATE"),
            ("sortTypes", "-1"),
            ("pageSize", "500"),
            ("pageNumber", "1"),
            ("reportName", "RPT_SHAREBONUS_DET"),
            ("columns", "ALL"),
            ("quoteColumns", ""),
            ("js", ""),
            ("source", "WEB"),
            ("client", "WEB"),
            ("filter", filter.as_str()),
        ])
        .send()
        .await?;
    let payload: Value = ensure_success(response, "分红送配")?.json().await?;

    parse_dividend_detail(&payload)
}

pub fn parse_dividend_detail(payload: &Value) -> Result<Vec<DividendDetail>> {
    let result = &payload["result"];
    if result.is_null() {
        return Ok(Vec::new());
    }
    let rows = result["data"]
        .as_array()
        .ok_or_else(|| ToolError::data("分红送配缺少 result.data 字段"))?;

    Ok(rows
        .iter()
        .map(|row| DividendDetail {
            reporting_period: value_date(&row["REPORT_DATE"]),
            earnings_disclosure_date: value_date(&row["PUBLISH_DATE"]),
            total_share_conversion_ratio: value_f64(&row["BONUS_IT_RATIO"]),
            bonus_share_ratio: value_f64(&row["BONUS_RATIO"]),
            capitalization_ratio: value_f64(&row["IT_RATIO"]),
            cash_dividend_payout_ratio: value_f64(&row["PRETAX_BONUS_RMB"]),
            cash_dividend_payout_ratio_description: value_string(&row["IMPL_PLAN_PROFILE"]),
            dividend_yield: value_f64(&row["DIVIDENT_RATIO"]),
            earnings_per_share: value_f64(&row["BASIC_EPS"]),
            net_asset_value_per_share: value_f64(&row["BVPS"]),
            surplus_reserve_fund_per_share: value_f64(&row["PER_CAPITAL_RESERVE"]),
            undistributed_profit_per_share: value_f64(&row["PER_UNASSIGN_PROFIT"]),
            net_profit_growth_rate: value_f64(&row["PNP_YOY_RATIO"]),
            total_shares_outstanding: value_f64(&row["TOTAL_SHARES"]).map(|v| v as u64),
            preliminary_plan_announcement_date: value_date(&row["PLAN_NOTICE_DATE"]),
            record_date: value_date(&row["EQUITY_RECORD_DATE"]),
            ex_dividend_date: value_date(&row["EX_DIVIDEND_DATE"]),
            proposal_progress: value_string(&row["ASSIGN_PROGRESS"]),
            latest_announcement_date: value_date(&row["NOTICE_DATE"]),
        })
        .collect())
}

// ==================== 个股新闻 ====================

/// 获取个股新闻
/// 对应 akshare 的 stock_news_em() 函数
pub async fn fetch_stock_news(client: &Client, code: &StockCode) -> Result<Vec<StockNews>> {
    let param = json!({
        "uid": "",
        "keyword": code.code(),
        "type": ["cmsArticleWebOld"],
        "client": "web",
        "clientType": "web",
        "clientVersion": "curr",
        "param": {
            "cmsArticleWebOld": {
                "searchScope": "default",
                "sort": "default",
                "pageIndex": 1,
                "pageSize": STOCK_NEWS_PAGE_SIZE,
                "preTag": "<em>",
                "postTag": "</em>"
            }
        }
    })
    .to_string();
    let timestamp = beijing_now().timestamp_millis().to_string();

    log::debug!("📡 请求个股新闻 keyword={}", code);

    let response = client
        .get(EM_SEARCH_API)
        .query(&[
            ("cb", EM_SEARCH_CALLBACK),
            ("param", param.as_str()),
            ("_", timestamp.as_str()),
        ])
        .header("Referer", "https://so.eastmoney.com/")
        .send()
        .await?;
    let text = ensure_success(response, "个股新闻")?.text().await?;

    parse_stock_news(&text, code)
}

fn clean_text(raw: &str) -> String {
    highlight_regex()
        .replace_all(raw, "")
        .replace('\u{3000}', "")
        .replace("\r\n", " ")
        .replace('\n', " ")
        .trim()
        .to_string()
}

pub fn parse_stock_news(text: &str, code: &StockCode) -> Result<Vec<StockNews>> {
    let payload: Value = serde_json::from_str(strip_jsonp(text)?)?;
    let result = payload
        .get("result")
        .ok_or_else(|| ToolError::data("个股新闻缺少 result 字段"))?;
    let articles = match &result["cmsArticleWebOld"] {
        Value::Null => return Ok(Vec::new()),
        Value::Array(articles) => articles,
        _ => return Err(ToolError::data("个股新闻 cmsArticleWebOld 字段不是数组")),
    };

    let base = Url::parse(EM_ARTICLE_BASE).map_err(|e| ToolError::data(e.to_string()))?;

    articles
        .iter()
        .map(|article| {
            let url = match value_string(&article["code"]) {
                Some(id) => base
                    .join(&format!("{}.html", id))
                    .map_err(|e| ToolError::data(format!("新闻链接无效: {}", e)))?
                    .to_string(),
                None => String::new(),
            };
            Ok(StockNews {
                keyword: code.code().to_string(),
                title: clean_text(article["title"].as_str().unwrap_or_default()),
                content: clean_text(article["content"].as_str().unwrap_or_default()),
                publish_time: value_string(&article["date"]).unwrap_or_default(),
                source: value_string(&article["mediaName"]).unwrap_or_default(),
                url,
            })
        })
        .collect()
}
