//! 财新数据通接口

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Asia::Shanghai;
use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::models::FinancialNews;

use super::common::{ensure_success, value_string, CAIXIN_NEWS_API};

const PUBLISH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 获取财经要闻
/// 对应 akshare 的 stock_news_main_cx() 函数
pub async fn fetch_financial_news(client: &Client) -> Result<Vec<FinancialNews>> {
    let response = client
        .get(CAIXIN_NEWS_API)
        .query(&[("pageNum", "1"), ("pageSize", "100"), ("showLabels", "true")])
        .send()
        .await?;
    let payload: Value = ensure_success(response, "财经要闻")?.json().await?;

    parse_financial_news(&payload)
}

pub fn parse_financial_news(payload: &Value) -> Result<Vec<FinancialNews>> {
    let items = payload["data"]["data"]
        .as_array()
        .ok_or_else(|| ToolError::data("财经要闻缺少 data.data 字段"))?;

    Ok(items
        .iter()
        .map(|item| FinancialNews {
            title: value_string(&item["tag"]).unwrap_or_default(),
            content: value_string(&item["summary"]).unwrap_or_default(),
            publish_time: publish_time(&item["pubTime"]).unwrap_or_default(),
            url: value_string(&item["url"]).unwrap_or_default(),
        })
        .collect())
}

/// pubTime 可能是文本，也可能是毫秒时间戳
fn publish_time(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => {
            let millis = n.as_i64()?;
            let utc = DateTime::from_timestamp_millis(millis)?;
            Some(utc.with_timezone(&Shanghai).format(PUBLISH_TIME_FORMAT).to_string())
        }
        Value::String(s) => {
            let s = s.trim();
            match NaiveDateTime::parse_from_str(s, PUBLISH_TIME_FORMAT) {
                Ok(dt) => Some(dt.format(PUBLISH_TIME_FORMAT).to_string()),
                Err(_) if !s.is_empty() => Some(s.to_string()),
                Err(_) => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_financial_news() {
        let payload = json!({
            "data": {
                "data": [
                    {
                        "tag": "央行开展逆回购操作",
                        "summary": "央行今日开展2000亿元7天期逆回购操作。",
                        "intervalTime": "3小时前",
                        "pubTime": "2023-10-09 09:20:00",
                        "url": "https://database.caixin.com/2023-10-09/102112233.html"
                    },
                    {
                        "tag": "A股收评",
                        "summary": "沪指收涨",
                        "pubTime": 1696838400000i64,
                        "url": "https://database.caixin.com/2023-10-09/102112234.html"
                    }
                ]
            }
        });
        let news = parse_financial_news(&payload).unwrap();
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].title, "央行开展逆回购操作");
        assert_eq!(news[0].publish_time, "2023-10-09 09:20:00");
        // 2023-10-09 08:00:00 UTC
        assert_eq!(news[1].publish_time, "2023-10-09 16:00:00");
    }

    #[test]
    fn test_missing_data_is_error() {
        let err = parse_financial_news(&json!({ "code": 500 })).unwrap_err();
        assert_eq!(err.kind(), "UpstreamDataError");
    }
}
