//! 公共常量和辅助函数

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;
use reqwest::Response;
use serde_json::Value;

use crate::error::{Result, ToolError};

// ==================== 东方财富 API 常量 ====================

/// 东方财富历史K线 API
pub const EM_KLINE_API: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
/// 东方财富 F10 主营构成 API
pub const EM_BUSINESS_API: &str =
    "https://emweb.securities.eastmoney.com/PC_HSF10/BusinessAnalysis/PageAjax";
/// 东方财富数据中心 API
pub const EM_DATACENTER_API: &str = "https://datacenter-web.eastmoney.com/api/data/v1/get";
/// 东方财富搜索 API（JSONP）
pub const EM_SEARCH_API: &str = "https://search-api-web.eastmoney.com/search/jsonp";
/// 东方财富资讯文章地址前缀
pub const EM_ARTICLE_BASE: &str = "http://finance.eastmoney.com/a/";

// ==================== 交易所 API 常量 ====================

/// 上交所通用查询 API（股票列表）
pub const SSE_COMMON_QUERY_API: &str = "https://query.sse.com.cn/sseQuery/commonQuery.do";
/// 上交所融资融券明细 API
pub const SSE_MARGIN_API: &str = "https://query.sse.com.cn/marketdata/tradedata/queryMargin.do";
/// 深交所报表下载 API（xlsx）
pub const SZSE_REPORT_API: &str = "https://www.szse.cn/api/report/ShowReport";
/// 北交所股票列表 API（JSONP）
pub const BSE_LIST_API: &str = "https://www.bse.cn/nqxxController/nqxxCnzq.do";

// ==================== 其他数据源常量 ====================

/// 同花顺个股财务页面
pub const THS_FINANCE_URL: &str = "https://basic.10jqka.com.cn/new";
/// 财新数据通要闻 API
pub const CAIXIN_NEWS_API: &str = "https://cxdata.caixin.com/api/dataplus/sjtPc/news";

/// 获取北京时间
pub fn beijing_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// 获取北京时间当天日期
pub fn beijing_today() -> NaiveDate {
    beijing_now().date_naive()
}

/// 非 2xx 状态码视为上游不可用
pub fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::unavailable(format!("获取{}失败: {}", what, status)));
    }
    Ok(response)
}

/// 去掉 JSONP 回调包装，返回括号内的 JSON 文本
pub fn strip_jsonp(text: &str) -> Result<&str> {
    let start = text.find('(');
    let end = text.rfind(')');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start + 1..end]),
        _ => Err(ToolError::data("无效的 JSONP 响应")),
    }
}

/// 按响应头声明的字符集解码 HTML，未声明时先尝试 UTF-8 再回退 GBK
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let declared = content_type
        .and_then(|ct| ct.split("charset=").nth(1))
        .and_then(|label| encoding_rs::Encoding::for_label(label.trim().as_bytes()));

    match declared {
        Some(encoding) => encoding.decode(bytes).0.into_owned(),
        None => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => encoding_rs::GBK.decode(bytes).0.into_owned(),
        },
    }
}

/// 数值字段：兼容 JSON 数字和带千分位/百分号的字符串，占位符返回 None
pub fn value_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// 解析数字文本，如 "1,234.5"、"12.3%"
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 文本字段：空串和 null 返回 None，数字转为文本
pub fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 日期字段：截取 "2023-06-30 00:00:00" 的日期部分
pub fn value_date(value: &Value) -> Option<String> {
    value_string(value).map(|s| s.split(' ').next().unwrap_or_default().to_string())
}

/// 读取 Excel 第一个工作表，所有单元格转为文本
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    use calamine::{open_workbook_auto_from_rs, Reader};
    use std::io::Cursor;

    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ToolError::data(format!("打开Excel文件失败: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| ToolError::data("Excel文件没有工作表"))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| ToolError::data(format!("读取工作表失败: {}", e)))?;

    Ok(range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    calamine::Data::String(s) => s.trim().to_string(),
                    calamine::Data::Float(f) => format!("{}", f),
                    calamine::Data::Int(i) => format!("{}", i),
                    calamine::Data::Bool(b) => format!("{}", b),
                    calamine::Data::DateTime(dt) => format!("{}", dt),
                    calamine::Data::Empty => String::new(),
                    _ => String::new(),
                })
                .collect()
        })
        .collect())
}

/// 在表头行中查找列，按前缀匹配（表头常带单位，如 "融资余额(元)"）
pub fn find_column(header: &[String], prefix: &str) -> Option<usize> {
    header.iter().position(|h| h.starts_with(prefix))
}

/// 交易所代码可能被存成数字，补齐为 6 位
pub fn pad_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.len() < 6 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>6}", trimmed)
    } else {
        trimmed.to_string()
    }
}
