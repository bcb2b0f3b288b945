//! 参数校验模块
//!
//! 所有工具参数在转发到上游数据源之前都经过这里的纯函数校验：
//! - 股票代码格式（6 位数字，可带 SH/SZ/BJ 交易所前缀）
//! - 日期与日期区间（YYYYMMDD）
//! - 枚举参数（财务摘要指标、K线周期、复权方式、融资融券采样频率）

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Result, ToolError};

/// 日期格式 YYYYMMDD
pub const DATE_FORMAT: &str = "%Y%m%d";

fn stock_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i:(?P<market>SH|SZ|BJ))?(?P<code>[0-9]{6})$").expect("股票代码正则"))
}

// ==================== 股票代码 ====================

/// 证券交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Market {
    /// 上海证券交易所
    Sh,
    /// 深圳证券交易所
    Sz,
    /// 北京证券交易所
    Bj,
}

impl Market {
    /// 交易所前缀，如 SH
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Sh => "SH",
            Self::Sz => "SZ",
            Self::Bj => "BJ",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_uppercase().as_str() {
            "SH" => Some(Self::Sh),
            "SZ" => Some(Self::Sz),
            "BJ" => Some(Self::Bj),
            _ => None,
        }
    }

    /// 根据代码号段推断交易所
    fn from_code(code: &str) -> Option<Self> {
        if code.starts_with("92") {
            return Some(Self::Bj);
        }
        match code.chars().next()? {
            '6' | '9' => Some(Self::Sh),
            '0' | '2' | '3' => Some(Self::Sz),
            '4' | '8' => Some(Self::Bj),
            _ => None,
        }
    }
}

/// 校验后的股票代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCode {
    code: String,
    market: Market,
}

impl StockCode {
    /// 不带交易所前缀的 6 位代码
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn market(&self) -> Market {
        self.market
    }

    /// 带交易所前缀的代码，如 SH688041
    pub fn prefixed(&self) -> String {
        format!("{}{}", self.market.prefix(), self.code)
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// 校验股票代码
///
/// 接受 `600000`、`SH600000`、`sz000001` 等形式；前缀与号段不一致时拒绝
pub fn validate_stock_code(code: &str) -> Result<StockCode> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ToolError::invalid("股票代码不能为空"));
    }

    let caps = stock_code_regex().captures(trimmed).ok_or_else(|| {
        ToolError::invalid(format!(
            "股票代码格式错误，应为 6 位数字（可带 SH/SZ/BJ 前缀），实际输入：{}",
            code
        ))
    })?;

    let digits = &caps["code"];
    let market = Market::from_code(digits).ok_or_else(|| {
        ToolError::invalid(format!("{} 不属于 A 股代码号段", digits))
    })?;

    if let Some(declared) = caps.name("market").and_then(|m| Market::from_prefix(m.as_str())) {
        if declared != market {
            return Err(ToolError::invalid(format!(
                "交易所前缀 {} 与代码 {} 不匹配",
                declared.prefix(),
                digits
            )));
        }
    }

    Ok(StockCode {
        code: digits.to_string(),
        market,
    })
}

// ==================== 日期 ====================

/// 校验 YYYYMMDD 格式日期
pub fn validate_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ToolError::invalid(format!(
            "日期格式错误，应为 YYYYMMDD，实际输入：{}",
            value
        )));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ToolError::invalid(format!("无效的日历日期：{}", value)))
}

/// 校验新闻查询日期，额外接受 YYYY-MM-DD
pub fn validate_news_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.len() == 10 && trimmed.as_bytes()[4] == b'-' && trimmed.as_bytes()[7] == b'-' {
        return validate_date(&trimmed.replace('-', ""));
    }
    validate_date(trimmed)
}

/// 日期区间，保证 start <= end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ToolError::invalid(format!(
                "开始日期 {} 晚于结束日期 {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// 区间内所有日期（含首尾）
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// 校验日期区间
pub fn validate_date_range(start: &str, end: &str) -> Result<DateRange> {
    DateRange::new(validate_date(start)?, validate_date(end)?)
}

// ==================== 枚举参数 ====================

/// 校验枚举参数，返回允许集合中的规范取值
pub fn validate_indicator(value: &str, allowed: &[&'static str]) -> Result<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| *candidate == value)
        .ok_or_else(|| {
            ToolError::invalid(format!("参数取值无效：{:?}，可选值：{:?}", value, allowed))
        })
}

/// 生成字符串枚举：取值集合、FromStr（经 validate_indicator 校验）、Display
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// 允许的取值
            pub const ALLOWED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ToolError;

            fn from_str(value: &str) -> Result<Self> {
                let matched = validate_indicator(value, Self::ALLOWED)?;
                $( if matched == $text { return Ok(Self::$variant); } )+
                Err(ToolError::invalid(format!("参数取值无效：{:?}", value)))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// 财务摘要汇总口径
    AbstractIndicator {
        /// 按报告期
        ByReportPeriod => "按报告期",
        /// 按年度
        ByYear => "按年度",
        /// 按单季度
        BySingleQuarter => "按单季度",
    }
}

string_enum! {
    /// K线周期
    PricePeriod {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

string_enum! {
    /// 复权方式
    PriceAdjust {
        /// 不复权
        Unadjusted => "",
        /// 前复权
        Qfq => "qfq",
        /// 后复权
        Hfq => "hfq",
    }
}

string_enum! {
    /// 融资融券明细的日期采样频率
    MarginFrequency {
        /// 每日
        Daily => "D",
        /// 每周五
        Weekly => "W",
        /// 每月第一天
        MonthStart => "MS",
        /// 每月最后一天
        MonthEnd => "ME",
        /// 每季度最后一天
        QuarterEnd => "Q",
        /// 每年最后一天
        YearEnd => "Y",
    }
}

impl Default for AbstractIndicator {
    fn default() -> Self {
        Self::ByReportPeriod
    }
}

impl Default for PricePeriod {
    fn default() -> Self {
        Self::Daily
    }
}

impl Default for PriceAdjust {
    fn default() -> Self {
        Self::Unadjusted
    }
}

impl Default for MarginFrequency {
    fn default() -> Self {
        Self::Daily
    }
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

impl MarginFrequency {
    /// 按频率从日期区间中采样查询日期
    pub fn sample_dates(&self, range: &DateRange) -> Vec<NaiveDate> {
        range
            .days()
            .filter(|date| match self {
                Self::Daily => true,
                Self::Weekly => date.weekday() == Weekday::Fri,
                Self::MonthStart => date.day() == 1,
                Self::MonthEnd => is_month_end(*date),
                Self::QuarterEnd => date.month() % 3 == 0 && is_month_end(*date),
                Self::YearEnd => date.month() == 12 && date.day() == 31,
            })
            .collect()
    }
}
