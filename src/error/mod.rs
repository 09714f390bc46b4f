//! 错误处理模块

use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 初始化错误
    #[error("初始化失败: {0}")]
    Initialization(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 参数错误（在任何缓存或网络访问之前同步返回）
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 上游限流（PhishTank 返回 HTTP 509）
    #[error("上游请求频率超限: {0}")]
    RateLimited(String),

    /// 上游返回非成功状态码
    #[error("上游请求失败 (HTTP {status}): {message}")]
    Upstream {
        /// HTTP 状态码
        status: u16,
        /// 响应体或错误消息
        message: String,
    },

    /// HTTP 请求错误（传输层失败）
    #[error("HTTP 请求失败: {0}")]
    HttpRequest(String),

    /// 解析错误
    #[error("解析失败: {0}")]
    Parse(String),

    /// MCP 协议错误
    #[error("MCP 协议错误: {0}")]
    Mcp(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// URL 解析错误
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),

    /// Reqwest 错误
    #[error("HTTP 客户端错误: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
