//! 业务逻辑服务模块
//!
//! 参数校验与转发、外部数据源抽象及其 HTTP 实现

pub mod forwarder; // 参数校验与转发
pub mod source;    // 数据源接口
pub mod upstream;  // 上游 HTTP 数据源

pub use forwarder::StockDataForwarder;
pub use upstream::HttpDataSource;
