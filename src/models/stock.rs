//! 股票数据模型
//!
//! 各工具返回的表格记录，字段已翻译为英文；上游可能缺失的字段为 Option，序列化为 null

use serde::{Deserialize, Serialize};

/// 股票名称及代码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockCodeRecord {
    /// 股票名称
    pub name: String,
    /// 股票代码（不带交易所前缀）
    pub stock_code: String,
}

/// 主营构成
///
/// 对应 akshare 的 stock_zygc_em()，比例字段为小数（0.35 表示 35%）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessComposition {
    /// 报告期
    pub reporting_period: String,
    /// 分类方向：按行业分类 / 按产品分类 / 按地区分类
    pub classification_direction: String,
    /// 分类名称
    pub classification: String,
    /// 主营收入（元）
    pub operating_revenue: Option<f64>,
    /// 收入比例
    pub operating_revenue_pct_of_main: Option<f64>,
    /// 主营成本（元）
    pub operating_cost: Option<f64>,
    /// 成本比例
    pub operating_cost_pct_of_main: Option<f64>,
    /// 主营利润（元）
    pub operating_profit: Option<f64>,
    /// 利润比例
    pub operating_profit_pct_of_main: Option<f64>,
    /// 毛利率
    pub gross_profit_margin: Option<f64>,
}

/// 历史行情K线
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    /// 交易日期 YYYY-MM-DD
    pub date: String,
    /// 股票代码（不带市场标识）
    pub stock_code: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    /// 成交量（手）
    pub volume: u64,
    /// 成交额（元）
    pub turnover: Option<f64>,
    /// 振幅（%）
    pub amplitude: Option<f64>,
    /// 涨跌幅（%）
    pub change_rate: Option<f64>,
    /// 涨跌额（元）
    pub change_amount: Option<f64>,
    /// 换手率（%）
    pub turnover_rate: Option<f64>,
}

/// 财务摘要
///
/// 同花顺原始数据带单位（如 "1.23亿"、"15.2%"），保持原样返回
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialAbstract {
    pub reporting_period: String,
    pub net_profit: Option<String>,
    pub net_profit_growth_rate: Option<String>,
    pub non_recurring_net_profit: Option<String>,
    pub non_recurring_net_profit_growth_rate: Option<String>,
    pub total_operating_revenue: Option<String>,
    pub total_operating_revenue_growth_rate: Option<String>,
    pub basic_earnings_per_share: Option<String>,
    pub net_asset_per_share: Option<String>,
    pub capital_reserve_fund_per_share: Option<String>,
    pub undistributed_profit_per_share: Option<String>,
    pub operating_cash_flow_per_share: Option<String>,
    pub net_profit_margin: Option<String>,
    pub gross_profit_margin: Option<String>,
    pub return_on_equity_of_roe: Option<String>,
    pub diluted_return_on_equity_of_roe: Option<String>,
    pub operating_cycle: Option<String>,
    pub inventory_turnover_ratio: Option<String>,
    pub days_inventory_outstanding: Option<String>,
    pub days_sales_outstanding: Option<String>,
    pub current_ratio: Option<String>,
    pub quick_ratio: Option<String>,
    pub conservative_quick_ratio: Option<String>,
    pub debt_to_equity_ratio: Option<String>,
    pub asset_to_liability_ratio: Option<String>,
}

/// 融资融券明细
///
/// 深交所数据不含偿还额字段，对应值为 null
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarginDetail {
    /// 信用交易日期 YYYYMMDD
    pub trading_date: String,
    /// 标的证券代码
    pub target_security_code: String,
    /// 标的证券简称
    pub target_security_name: String,
    /// 融资余额（元）
    pub margin_balance: Option<f64>,
    /// 融资买入额（元）
    pub margin_buy_amount: Option<f64>,
    /// 融资偿还额（元）
    pub margin_repayment: Option<f64>,
    /// 融券余量
    pub short_selling_balance: Option<f64>,
    /// 融券卖出量
    pub short_selling_volume: Option<f64>,
    /// 融券偿还量
    pub short_selling_repayment: Option<f64>,
}

/// 分红送配详情
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DividendDetail {
    /// 报告期
    pub reporting_period: Option<String>,
    /// 业绩披露日期
    pub earnings_disclosure_date: Option<String>,
    /// 送转股份-送转总比例
    pub total_share_conversion_ratio: Option<f64>,
    /// 送转股份-送股比例
    pub bonus_share_ratio: Option<f64>,
    /// 送转股份-转股比例
    pub capitalization_ratio: Option<f64>,
    /// 现金分红-现金分红比例
    pub cash_dividend_payout_ratio: Option<f64>,
    /// 现金分红-现金分红比例描述
    pub cash_dividend_payout_ratio_description: Option<String>,
    /// 现金分红-股息率
    pub dividend_yield: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub net_asset_value_per_share: Option<f64>,
    pub surplus_reserve_fund_per_share: Option<f64>,
    pub undistributed_profit_per_share: Option<f64>,
    /// 净利润同比增长（%）
    pub net_profit_growth_rate: Option<f64>,
    /// 总股本
    pub total_shares_outstanding: Option<u64>,
    /// 预案公告日
    pub preliminary_plan_announcement_date: Option<String>,
    /// 股权登记日
    pub record_date: Option<String>,
    /// 除权除息日
    pub ex_dividend_date: Option<String>,
    /// 方案进度
    pub proposal_progress: Option<String>,
    /// 最新公告日期
    pub latest_announcement_date: Option<String>,
}
