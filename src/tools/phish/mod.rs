//! PhishTank 查询工具模块

pub mod cache;
pub mod check;
pub mod database;
pub mod model;
pub mod query;
pub mod stats;

use crate::cache::{Cache, CacheConfig};
use crate::config::PhishTankConfig;
use crate::error::{Error, Result};
use crate::throttle::RequestThrottle;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use std::sync::Arc;

/// PhishTank 服务
///
/// 持有 HTTP 客户端、缓存和节流器，是所有工具共享的数据访问层。
pub struct PhishTankService {
    client: reqwest::Client,
    cache: cache::PhishCache,
    throttle: RequestThrottle,
    config: PhishTankConfig,
}

impl PhishTankService {
    /// 创建新的 PhishTank 服务
    ///
    /// # Errors
    ///
    /// HTTP 客户端构建失败时返回错误
    pub fn new(config: PhishTankConfig, cache_config: &CacheConfig) -> Result<Self> {
        let store: Arc<dyn Cache<cache::CachedValue>> =
            Arc::new(crate::cache::memory::MemoryCache::new());
        Self::with_cache(config, cache_config, store)
    }

    /// 使用注入的缓存存储创建服务（便于测试替身）
    ///
    /// # Errors
    ///
    /// HTTP 客户端构建失败时返回错误
    pub fn with_cache(
        config: PhishTankConfig,
        cache_config: &CacheConfig,
        store: Arc<dyn Cache<cache::CachedValue>>,
    ) -> Result<Self> {
        let user_agent = config
            .app_name
            .clone()
            .unwrap_or_else(|| format!("phishtank-mcp/{}", crate::VERSION));

        let client = crate::utils::HttpClientBuilder::new()
            .user_agent(user_agent)
            .build()?;

        let throttle = RequestThrottle::for_api_key(config.api_key.as_deref());
        let cache = cache::PhishCache::new(store, cache_config);

        Ok(Self {
            client,
            cache,
            throttle,
            config,
        })
    }

    /// 获取 HTTP 客户端
    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// 获取缓存
    #[must_use]
    pub fn cache(&self) -> &cache::PhishCache {
        &self.cache
    }

    /// 获取节流器
    #[must_use]
    pub fn throttle(&self) -> &RequestThrottle {
        &self.throttle
    }

    /// 获取上游配置
    #[must_use]
    pub fn config(&self) -> &PhishTankConfig {
        &self.config
    }
}

/// 把操作结果转换为 MCP 工具响应
///
/// 参数错误属于协议级错误；上游失败（限流、非成功状态、传输失败）
/// 包装为非致命的工具结果返回给调用方，不会中断会话。
pub(crate) fn into_tool_response(
    tool: &str,
    result: Result<serde_json::Value>,
) -> std::result::Result<CallToolResult, CallToolError> {
    match result {
        Ok(envelope) => Ok(envelope_result(&envelope)),
        Err(Error::InvalidArgument(message)) => {
            Err(CallToolError::invalid_arguments(tool, Some(message)))
        }
        Err(err) => Ok(error_result(&err)),
    }
}

/// 把 JSON 响应封装为文本工具结果
pub(crate) fn envelope_result(envelope: &serde_json::Value) -> CallToolResult {
    let text = serde_json::to_string_pretty(envelope).unwrap_or_else(|_| envelope.to_string());
    CallToolResult::text_content(vec![text.into()])
}

/// 把上游错误包装为非致命的工具结果
pub(crate) fn error_result(err: &Error) -> CallToolResult {
    let (kind, summary) = match err {
        Error::RateLimited(_) => (
            "rate_limited",
            "PhishTank rate limit exceeded. Configure a PhishTank API key to raise the request quota.".to_string(),
        ),
        Error::Upstream { status, .. } => (
            "upstream_error",
            format!("PhishTank request failed with HTTP {status}"),
        ),
        _ => ("upstream_error", "PhishTank request failed".to_string()),
    };

    let envelope = serde_json::json!({
        "error": {
            "kind": kind,
            "message": err.to_string(),
        },
        "summary": summary,
    });
    envelope_result(&envelope)
}
