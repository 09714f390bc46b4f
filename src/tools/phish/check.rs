//! 单条与批量 URL 查询工具
#![allow(missing_docs)]

use super::model::{RateLimitInfo, UrlCheckResult};
use super::PhishTankService;
use crate::error::{Error, Result};
use crate::tools::Tool;
use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// 上游支持的响应格式
const VALID_FORMATS: [&str; 3] = ["json", "xml", "php"];

/// 批量查询的最大 URL 数
const MAX_BATCH_URLS: usize = 50;

/// 批量查询条目间隔的取值范围与默认值（毫秒）
const MIN_BATCH_DELAY_MS: u64 = 500;
const MAX_BATCH_DELAY_MS: u64 = 10_000;
const DEFAULT_BATCH_DELAY_MS: u64 = 1_000;

impl PhishTankService {
    /// 查询单个 URL 是否在钓鱼数据库中
    ///
    /// URL 校验先于任何缓存和网络访问。缓存键按原样 URL 拼接，
    /// 命中时直接返回且不消耗节流预算；未命中时先过节流器，
    /// 再向上游发一次表单 POST，结果缓存五分钟。
    pub async fn check_url(&self, url: &str, format: &str) -> Result<UrlCheckResult> {
        url::Url::parse(url)
            .map_err(|e| Error::InvalidArgument(format!("无效的 URL '{url}': {e}")))?;

        if !VALID_FORMATS.contains(&format) {
            return Err(Error::InvalidArgument(format!(
                "无效的响应格式: {format}，有效值: {VALID_FORMATS:?}"
            )));
        }

        if let Some(mut cached) = self.cache().get_url_check(url).await {
            tracing::debug!("URL 查询缓存命中: {}", url);
            cached.cached = true;
            return Ok(cached);
        }

        self.throttle().await_turn().await;

        let mut form = vec![("url", url.to_string()), ("format", format.to_string())];
        if let Some(key) = &self.config().api_key {
            form.push(("app_key", key.clone()));
        }

        let response = self
            .client()
            .post(&self.config().check_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == super::database::RATE_LIMIT_STATUS {
            return Err(Error::RateLimited(
                "URL 查询被限流，配置 API key 可提升请求配额".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let rate_limit = RateLimitInfo::from_headers(response.headers());

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("查询响应不是合法 JSON: {e}")))?;

        let mut result = parse_check_response(url, &body);
        result.rate_limit = rate_limit;

        self.cache().set_url_check(url, result.clone()).await;
        Ok(result)
    }

    /// 批量查询多个 URL
    ///
    /// 严格串行处理，单条失败只记录为该条的结果，不中断批次。
    /// 除最后一条外每条之后固定睡 `delay_ms`（与节流器的自适应
    /// 延迟相互独立，两者可能叠加），缓存命中也不例外。
    pub async fn check_multiple_urls(
        &self,
        urls: &[String],
        delay_ms: Option<u64>,
    ) -> Result<BatchCheckReport> {
        if urls.is_empty() {
            return Err(Error::InvalidArgument("urls 不能为空".to_string()));
        }
        if urls.len() > MAX_BATCH_URLS {
            return Err(Error::InvalidArgument(format!(
                "一次最多查询 {MAX_BATCH_URLS} 个 URL，实际 {} 个",
                urls.len()
            )));
        }

        let delay_ms = delay_ms
            .unwrap_or(DEFAULT_BATCH_DELAY_MS)
            .clamp(MIN_BATCH_DELAY_MS, MAX_BATCH_DELAY_MS);

        let mut results = Vec::with_capacity(urls.len());
        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for (index, url) in urls.iter().enumerate() {
            match self.check_url(url, "json").await {
                Ok(result) => {
                    succeeded += 1;
                    results.push(BatchCheckItem {
                        url: url.clone(),
                        success: true,
                        result: Some(result),
                        error: None,
                    });
                }
                Err(err) => {
                    failed += 1;
                    results.push(BatchCheckItem {
                        url: url.clone(),
                        success: false,
                        result: None,
                        error: Some(err.to_string()),
                    });
                }
            }

            if index + 1 < urls.len() {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }

        Ok(BatchCheckReport {
            results,
            succeeded,
            failed,
            delay_ms,
        })
    }
}

/// 批量查询中单个 URL 的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckItem {
    /// 被查询的 URL
    pub url: String,
    /// 该条是否成功
    pub success: bool,
    /// 成功时的查询结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<UrlCheckResult>,
    /// 失败时的错误消息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 批量查询报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCheckReport {
    /// 按输入顺序排列的逐条结果
    pub results: Vec<BatchCheckItem>,
    /// 成功条数
    pub succeeded: usize,
    /// 失败条数
    pub failed: usize,
    /// 实际使用的条目间隔（毫秒）
    pub delay_ms: u64,
}

/// 解析上游查询响应
///
/// 响应形如 `{"results": {"in_database": true, "phish_id": ...}}`，
/// 字段按宽松方式提取，布尔值兼容 "y"/"yes"/"true" 等字符串写法。
fn parse_check_response(url: &str, body: &serde_json::Value) -> UrlCheckResult {
    let results = body.get("results").unwrap_or(&serde_json::Value::Null);

    let in_database = value_as_bool(results.get("in_database")).unwrap_or(false);

    UrlCheckResult {
        url: url.to_string(),
        in_database,
        phish_id: results.get("phish_id").and_then(value_as_u64),
        phish_detail_page: results
            .get("phish_detail_page")
            .and_then(|v| v.as_str())
            .map(std::string::ToString::to_string),
        verified: results.get("verified").and_then(|v| value_as_bool(Some(v))),
        valid: results.get("valid").and_then(|v| value_as_bool(Some(v))),
        submitted_at: results
            .get("submitted_at")
            .and_then(|v| v.as_str())
            .map(std::string::ToString::to_string),
        rate_limit: None,
        cached: false,
    }
}

fn value_as_bool(value: Option<&serde_json::Value>) -> Option<bool> {
    let value = value?;
    if let Some(b) = value.as_bool() {
        return Some(b);
    }
    match value.as_str()?.to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn value_as_u64(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// 查询单个 URL 的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "check_url",
    title = "查询 URL 是否为钓鱼网站",
    description = "通过 PhishTank 检查单个 URL 是否在钓鱼数据库中。返回收录状态、核实标志和判定结论。结果缓存五分钟，缓存命中不消耗请求配额。",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional"),
    icons = [
        (src = "https://phishtank.org/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "light"),
        (src = "https://phishtank.org/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "dark")
    ]
)]
#[derive(Debug, Clone, Deserialize, Serialize, rust_mcp_sdk::macros::JsonSchema)]
pub struct CheckUrlTool {
    /// 要检查的 URL
    #[json_schema(title = "URL", description = "要检查的完整 URL（必须带协议，例如 https://example.com/login）")]
    pub url: String,

    /// 上游响应格式
    #[json_schema(title = "响应格式", description = "上游响应格式：json（默认）、xml、php", default = "json")]
    pub format: Option<String>,
}

/// 查询单个 URL 的工具实现
pub struct CheckUrlToolImpl {
    service: Arc<PhishTankService>,
}

impl CheckUrlToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CheckUrlToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        CheckUrlTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: CheckUrlTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments("check_url", Some(format!("参数解析失败: {e}")))
        })?;

        let format = params.format.unwrap_or_else(|| "json".to_string());
        let outcome = self.service.check_url(&params.url, &format).await;

        super::into_tool_response(
            "check_url",
            outcome.map(|result| {
                let summary = result.classification();
                let mut envelope = serde_json::to_value(&result).unwrap_or_default();
                envelope["summary"] = serde_json::Value::String(summary);
                envelope
            }),
        )
    }
}

/// 批量查询 URL 的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "check_multiple_urls",
    title = "批量查询 URL",
    description = "通过 PhishTank 依次检查多个 URL（最多 50 个）。严格串行处理，单条失败不会中断批次，返回逐条结果和成功/失败计数。",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional"),
    icons = [
        (src = "https://phishtank.org/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "light"),
        (src = "https://phishtank.org/favicon.ico", mime_type = "image/x-icon", sizes = ["32x32"], theme = "dark")
    ]
)]
#[derive(Debug, Clone, Deserialize, Serialize, rust_mcp_sdk::macros::JsonSchema)]
pub struct CheckMultipleUrlsTool {
    /// 要检查的 URL 列表
    #[json_schema(title = "URL 列表", description = "要检查的 URL 列表，最多 50 个")]
    pub urls: Vec<String>,

    /// 条目间隔（毫秒）
    #[json_schema(
        title = "条目间隔",
        description = "相邻两条查询之间的固定延迟（毫秒），范围 500-10000",
        minimum = 500,
        maximum = 10000,
        default = 1000
    )]
    pub delay: Option<u64>,
}

/// 批量查询 URL 的工具实现
pub struct CheckMultipleUrlsToolImpl {
    service: Arc<PhishTankService>,
}

impl CheckMultipleUrlsToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for CheckMultipleUrlsToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        CheckMultipleUrlsTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: CheckMultipleUrlsTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments(
                "check_multiple_urls",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        let outcome = self
            .service
            .check_multiple_urls(&params.urls, params.delay)
            .await;

        super::into_tool_response(
            "check_multiple_urls",
            outcome.map(|report| {
                let summary = format!(
                    "Checked {} URLs: {} succeeded, {} failed",
                    report.results.len(),
                    report.succeeded,
                    report.failed
                );
                let mut envelope = serde_json::to_value(&report).unwrap_or_default();
                envelope["summary"] = serde_json::Value::String(summary);
                envelope
            }),
        )
    }
}
