//! 同花顺数据接口
//!
//! 财务摘要页面把表格数据以 JSON 形式嵌在 `<p id="main">` 中

use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::models::FinancialAbstract;
use crate::validation::{AbstractIndicator, StockCode};

use super::common::{ensure_success, decode_html, THS_FINANCE_URL};

/// 获取财务摘要
/// 对应 akshare 的 stock_financial_abstract_ths() 函数
pub async fn fetch_financial_abstract(
    client: &Client,
    code: &StockCode,
    indicator: AbstractIndicator,
) -> Result<Vec<FinancialAbstract>> {
    let url = format!("{}/{}/finance.html", THS_FINANCE_URL, code.code());
    log::debug!("📡 请求财务摘要 {} indicator={}", url, indicator);

    let response = client.get(&url).send().await?;
    let response = ensure_success(response, "财务摘要")?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;
    let html = decode_html(&bytes, content_type.as_deref());

    parse_financial_abstract(&html, indicator)
}

pub fn parse_financial_abstract(
    html: &str,
    indicator: AbstractIndicator,
) -> Result<Vec<FinancialAbstract>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p#main")
        .map_err(|e| ToolError::data(format!("选择器解析失败: {:?}", e)))?;
    let embedded = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or_else(|| ToolError::data("财务摘要页面缺少数据节点"))?;

    let payload: Value = serde_json::from_str(embedded.trim())?;
    let titles: Vec<String> = payload["title"]
        .as_array()
        .ok_or_else(|| ToolError::data("财务摘要缺少 title 字段"))?
        .iter()
        .map(|item| match item {
            Value::Array(parts) => parts.first().and_then(Value::as_str).unwrap_or_default().to_string(),
            other => other.as_str().unwrap_or_default().to_string(),
        })
        .collect();

    let key = match indicator {
        AbstractIndicator::ByReportPeriod => "report",
        AbstractIndicator::ByYear => "year",
        AbstractIndicator::BySingleQuarter => "simple",
    };
    // 每行对应一个科目，第 0 行是报告期
    let columns = payload[key]
        .as_array()
        .ok_or_else(|| ToolError::data(format!("财务摘要缺少 {} 字段", key)))?;
    let periods = match columns.first().and_then(Value::as_array) {
        Some(periods) => periods,
        None => return Ok(Vec::new()),
    };

    let mut result = Vec::with_capacity(periods.len());
    for (j, period) in periods.iter().enumerate() {
        let Some(reporting_period) = cell_text(period) else {
            continue;
        };
        let mut record = FinancialAbstract {
            reporting_period,
            ..Default::default()
        };
        for (title, column) in titles.iter().zip(columns.iter()).skip(1) {
            if let Some(slot) = field_mut(&mut record, title) {
                *slot = column.get(j).and_then(cell_text);
            }
        }
        result.push(record);
    }

    Ok(result)
}

/// 同花顺用 false 和 "--" 表示缺失
fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    match text.as_str() {
        "" | "--" | "False" | "false" => None,
        _ => Some(text),
    }
}

fn field_mut<'a>(record: &'a mut FinancialAbstract, title: &str) -> Option<&'a mut Option<String>> {
    let slot = match title {
        "净利润" => &mut record.net_profit,
        "净利润同比增长率" => &mut record.net_profit_growth_rate,
        "扣非净利润" => &mut record.non_recurring_net_profit,
        "扣非净利润同比增长率" => &mut record.non_recurring_net_profit_growth_rate,
        "营业总收入" => &mut record.total_operating_revenue,
        "营业总收入同比增长率" => &mut record.total_operating_revenue_growth_rate,
        "基本每股收益" => &mut record.basic_earnings_per_share,
        "每股净资产" => &mut record.net_asset_per_share,
        "每股资本公积金" => &mut record.capital_reserve_fund_per_share,
        "每股未分配利润" => &mut record.undistributed_profit_per_share,
        "每股经营现金流" => &mut record.operating_cash_flow_per_share,
        "销售净利率" => &mut record.net_profit_margin,
        "销售毛利率" => &mut record.gross_profit_margin,
        "净资产收益率" => &mut record.return_on_equity_of_roe,
        "净资产收益率-摊薄" => &mut record.diluted_return_on_equity_of_roe,
        "营业周期" => &mut record.operating_cycle,
        "存货周转率" => &mut record.inventory_turnover_ratio,
        "存货周转天数" => &mut record.days_inventory_outstanding,
        "应收账款周转天数" => &mut record.days_sales_outstanding,
        "流动比率" => &mut record.current_ratio,
        "速动比率" => &mut record.quick_ratio,
        "保守速动比率" => &mut record.conservative_quick_ratio,
        "产权比率" => &mut record.debt_to_equity_ratio,
        "资产负债率" => &mut record.asset_to_liability_ratio,
        _ => return None,
    };
    Some(slot)
}
