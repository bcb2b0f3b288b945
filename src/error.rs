//! 工具调用错误类型
//!
//! 每次工具调用独立失败，错误不会影响服务进程本身

use thiserror::Error;

/// 工具调用错误
#[derive(Debug, Error)]
pub enum ToolError {
    /// 调用方参数未通过校验，不会转发到上游
    #[error("参数无效: {0}")]
    InvalidArgument(String),

    /// 上游数据源不可达、超时或返回非成功状态码
    #[error("上游数据源不可用: {0}")]
    UpstreamUnavailable(String),

    /// 上游返回的数据结构与预期不符
    #[error("上游数据格式异常: {0}")]
    UpstreamDataError(String),

    /// 未注册的工具名称
    #[error("未知工具: {0}")]
    UnknownTool(String),
}

/// 工具调用结果类型
pub type Result<T> = std::result::Result<T, ToolError>;

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::UpstreamDataError(message.into())
    }

    /// 错误类别名称，用于响应体和日志
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::UpstreamUnavailable(_) => "UpstreamUnavailable",
            Self::UpstreamDataError(_) => "UpstreamDataError",
            Self::UnknownTool(_) => "UnknownTool",
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::UpstreamDataError(err.to_string())
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::UpstreamDataError(format!("解析JSON失败: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ToolError::invalid("股票代码不能为空");
        assert_eq!(err.to_string(), "参数无效: 股票代码不能为空");
        assert_eq!(err.kind(), "InvalidArgument");

        let err = ToolError::unavailable("503 Service Unavailable");
        assert_eq!(err.kind(), "UpstreamUnavailable");
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ToolError = json_err.into();
        assert!(matches!(err, ToolError::UpstreamDataError(_)));
    }
}
