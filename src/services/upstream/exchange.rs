//! 交易所数据接口
//!
//! 沪深京 A 股代码表、融资融券明细

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::models::{MarginDetail, StockCodeRecord};
use crate::validation::{Market, StockCode};

use super::common::{
    ensure_success, find_column, pad_code, parse_number, read_first_sheet, value_f64,
    value_string, BSE_LIST_API, SSE_COMMON_QUERY_API, SSE_MARGIN_API, SZSE_REPORT_API,
};

const SSE_REFERER: &str = "https://www.sse.com.cn/";
const SSE_LIST_REFERER: &str = "https://www.sse.com.cn/assortment/stock/list/share/";
/// 上交所股票类型：主板A股
const SSE_MAIN_BOARD: &str = "1";
/// 上交所股票类型：科创板
const SSE_STAR_MARKET: &str = "8";
/// 北交所列表分页上限
const BSE_MAX_PAGES: u64 = 100;

// ==================== 代码表 ====================

/// 获取沪深京 A 股代码和简称
/// 对应 akshare 的 stock_info_a_code_name() 函数
pub async fn fetch_a_share_code_list(client: &Client) -> Result<Vec<StockCodeRecord>> {
    let (sh_main, sh_star, sz, bj) = tokio::try_join!(
        fetch_sse_code_list(client, SSE_MAIN_BOARD),
        fetch_sse_code_list(client, SSE_STAR_MARKET),
        fetch_szse_code_list(client),
        fetch_bse_code_list(client),
    )?;

    log::info!(
        "📊 A股代码表: 沪主板 {} / 科创板 {} / 深市 {} / 北交所 {}",
        sh_main.len(),
        sh_star.len(),
        sz.len(),
        bj.len()
    );

    Ok(sh_main.into_iter().chain(sh_star).chain(sz).chain(bj).collect())
}

async fn fetch_sse_code_list(client: &Client, stock_type: &str) -> Result<Vec<StockCodeRecord>> {
    let response = client
        .get(SSE_COMMON_QUERY_API)
        .query(&[
            ("STOCK_TYPE", stock_type),
            ("REG_PROVINCE", ""),
            ("CSRC_CODE", ""),
            ("STOCK_CODE", ""),
            ("sqlId", "COMMON_SSE_CP_GPJCTPZ_GPLB_GP_L"),
            ("COMPANY_STATUS", "2,4,5,7,8"),
            ("type", "inParams"),
            ("isPagination", "true"),
            ("pageHelp.cacheSize", "1"),
            ("pageHelp.beginPage", "1"),
            ("pageHelp.pageSize", "10000"),
            ("pageHelp.pageNo", "1"),
            ("pageHelp.endPage", "1"),
        ])
        .header("Referer", SSE_LIST_REFERER)
        .send()
        .await?;
    let payload: Value = ensure_success(response, "上交所股票列表")?.json().await?;

    parse_sse_code_list(&payload)
}

pub fn parse_sse_code_list(payload: &Value) -> Result<Vec<StockCodeRecord>> {
    let rows = payload["result"]
        .as_array()
        .ok_or_else(|| ToolError::data("上交所股票列表缺少 result 字段"))?;

    Ok(rows
        .iter()
        .filter_map(|row| {
            let stock_code = value_string(&row["A_STOCK_CODE"])?;
            let name = value_string(&row["SEC_NAME_CN"])
                .or_else(|| value_string(&row["COMPANY_ABBR"]))?;
            Some(StockCodeRecord { name, stock_code })
        })
        .collect())
}

async fn fetch_szse_code_list(client: &Client) -> Result<Vec<StockCodeRecord>> {
    let response = client
        .get(SZSE_REPORT_API)
        .query(&[
            ("SHOWTYPE", "xlsx"),
            ("CATALOGID", "1110"),
            ("TABKEY", "tab1"),
            ("random", "0.6935816432433362"),
        ])
        .send()
        .await?;
    let bytes = ensure_success(response, "深交所股票列表")?.bytes().await?;

    parse_szse_code_list(&read_first_sheet(&bytes)?)
}

pub fn parse_szse_code_list(rows: &[Vec<String>]) -> Result<Vec<StockCodeRecord>> {
    let header = rows
        .first()
        .ok_or_else(|| ToolError::data("深交所股票列表为空"))?;
    let (code_idx, name_idx) = match (find_column(header, "A股代码"), find_column(header, "A股简称")) {
        (Some(c), Some(n)) => (c, n),
        _ => return Err(ToolError::data("深交所股票列表缺少 A股代码/A股简称 列")),
    };

    Ok(rows
        .iter()
        .skip(1)
        .filter_map(|row| {
            let stock_code = pad_code(row.get(code_idx)?);
            let name = row.get(name_idx)?.trim().to_string();
            (!stock_code.is_empty() && !name.is_empty()).then_some(StockCodeRecord { name, stock_code })
        })
        .collect())
}

async fn fetch_bse_code_list(client: &Client) -> Result<Vec<StockCodeRecord>> {
    let mut result = Vec::new();
    let mut page = 0u64;

    loop {
        let page_str = page.to_string();
        let response = client
            .post(BSE_LIST_API)
            .form(&[
                ("page", page_str.as_str()),
                ("typejb", "T"),
                ("xxfcbj[]", "2"),
                ("xxzqdm", ""),
                ("sortfield", "xxzqdm"),
                ("sorttype", "asc"),
            ])
            .send()
            .await?;
        let text = ensure_success(response, "北交所股票列表")?.text().await?;
        let (records, total_pages) = parse_bse_page(&text)?;
        result.extend(records);

        page += 1;
        if page >= total_pages.min(BSE_MAX_PAGES) {
            break;
        }
    }

    Ok(result)
}

/// 北交所返回 `null([{...}])` 形式，取方括号内的数组
pub fn parse_bse_page(text: &str) -> Result<(Vec<StockCodeRecord>, u64)> {
    let start = text.find('[');
    let end = text.rfind(']');
    let json_text = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(ToolError::data("北交所股票列表响应格式无效")),
    };

    let pages: Value = serde_json::from_str(json_text)?;
    let first = pages
        .get(0)
        .ok_or_else(|| ToolError::data("北交所股票列表为空"))?;
    let total_pages = first["totalPages"].as_u64().unwrap_or(1);
    let content = first["content"]
        .as_array()
        .ok_or_else(|| ToolError::data("北交所股票列表缺少 content 字段"))?;

    let records = content
        .iter()
        .filter_map(|row| {
            Some(StockCodeRecord {
                stock_code: value_string(&row["xxzqdm"])?,
                name: value_string(&row["xxzqjc"])?,
            })
        })
        .collect();

    Ok((records, total_pages))
}

// ==================== 融资融券 ====================

/// 获取单日融资融券明细，只保留指定证券
/// 上交所对应 akshare 的 stock_margin_detail_sse()，深交所对应 stock_margin_detail_szse()
pub async fn fetch_margin_detail(
    client: &Client,
    code: &StockCode,
    date: NaiveDate,
) -> Result<Vec<MarginDetail>> {
    match code.market() {
        Market::Sh => fetch_sse_margin_detail(client, code, date).await,
        Market::Sz => fetch_szse_margin_detail(client, code, date).await,
        Market::Bj => Ok(Vec::new()),
    }
}

async fn fetch_sse_margin_detail(
    client: &Client,
    code: &StockCode,
    date: NaiveDate,
) -> Result<Vec<MarginDetail>> {
    let day = date.format("%Y%m%d").to_string();
    log::debug!("📡 请求上交所融资融券明细 date={} code={}", day, code);

    let response = client
        .get(SSE_MARGIN_API)
        .query(&[
            ("isPagination", "true"),
            ("tabType", "mxtype"),
            ("detailsDate", day.as_str()),
            ("stockCode", code.code()),
            ("beginDate", ""),
            ("endDate", ""),
            ("pageHelp.pageSize", "5000"),
            ("pageHelp.pageCount", "50"),
            ("pageHelp.pageNo", "1"),
            ("pageHelp.beginPage", "1"),
            ("pageHelp.cacheSize", "1"),
            ("pageHelp.endPage", "5"),
        ])
        .header("Referer", SSE_REFERER)
        .send()
        .await?;
    let payload: Value = ensure_success(response, "上交所融资融券明细")?.json().await?;

    parse_sse_margin_detail(&payload, code)
}

pub fn parse_sse_margin_detail(payload: &Value, code: &StockCode) -> Result<Vec<MarginDetail>> {
    let rows = match &payload["result"] {
        Value::Null => return Ok(Vec::new()),
        Value::Array(rows) => rows,
        _ => return Err(ToolError::data("上交所融资融券 result 字段不是数组")),
    };

    Ok(rows
        .iter()
        .filter(|row| value_string(&row["stockCode"]).as_deref() == Some(code.code()))
        .map(|row| MarginDetail {
            trading_date: value_string(&row["opDate"]).unwrap_or_default(),
            target_security_code: code.code().to_string(),
            target_security_name: value_string(&row["securityAbbr"]).unwrap_or_default(),
            margin_balance: value_f64(&row["rzye"]),
            margin_buy_amount: value_f64(&row["rzmre"]),
            margin_repayment: value_f64(&row["rzche"]),
            short_selling_balance: value_f64(&row["rqyl"]),
            short_selling_volume: value_f64(&row["rqmcl"]),
            short_selling_repayment: value_f64(&row["rqchl"]),
        })
        .collect())
}

async fn fetch_szse_margin_detail(
    client: &Client,
    code: &StockCode,
    date: NaiveDate,
) -> Result<Vec<MarginDetail>> {
    let day = date.format("%Y-%m-%d").to_string();
    log::debug!("📡 请求深交所融资融券明细 date={} code={}", day, code);

    let response = client
        .get(SZSE_REPORT_API)
        .query(&[
            ("SHOWTYPE", "xlsx"),
            ("CATALOGID", "1837_xxpl"),
            ("txtDate", day.as_str()),
            ("random", "0.7425245522795993"),
            ("TABKEY", "tab2"),
        ])
        .send()
        .await?;
    let bytes = ensure_success(response, "深交所融资融券明细")?.bytes().await?;

    parse_szse_margin_detail(&read_first_sheet(&bytes)?, code, date)
}

/// 深交所明细表没有偿还额列
pub fn parse_szse_margin_detail(
    rows: &[Vec<String>],
    code: &StockCode,
    date: NaiveDate,
) -> Result<Vec<MarginDetail>> {
    let Some(header) = rows.first() else {
        return Ok(Vec::new());
    };
    let code_idx = find_column(header, "证券代码")
        .ok_or_else(|| ToolError::data("深交所融资融券明细缺少 证券代码 列"))?;
    let name_idx = find_column(header, "证券简称");
    let column = |prefix: &str| find_column(header, prefix);
    let (buy_idx, balance_idx, short_sell_idx, short_balance_idx) = (
        column("融资买入额"),
        column("融资余额"),
        column("融券卖出量"),
        column("融券余量"),
    );

    let cell = |row: &Vec<String>, idx: Option<usize>| -> Option<f64> {
        idx.and_then(|i| row.get(i)).and_then(|v| parse_number(v))
    };

    Ok(rows
        .iter()
        .skip(1)
        .filter(|row| row.get(code_idx).map(|c| pad_code(c)).as_deref() == Some(code.code()))
        .map(|row| MarginDetail {
            trading_date: date.format("%Y%m%d").to_string(),
            target_security_code: code.code().to_string(),
            target_security_name: name_idx
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default(),
            margin_balance: cell(row, balance_idx),
            margin_buy_amount: cell(row, buy_idx),
            margin_repayment: None,
            short_selling_balance: cell(row, short_balance_idx),
            short_selling_volume: cell(row, short_sell_idx),
            short_selling_repayment: None,
        })
        .collect())
}
