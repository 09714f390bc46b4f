//! 数据库快照下载与缓存
//!
//! 所有检索和统计工具都经由 [`PhishTankService::get_database`]
//! 读取同一份快照，这里是它们唯一的数据来源。

use super::model::{DatabaseSnapshot, PhishEntry};
use super::PhishTankService;
use crate::error::{Error, Result};
use std::sync::Arc;

/// PhishTank 限流时的状态码（Bandwidth Limit Exceeded）
pub(crate) const RATE_LIMIT_STATUS: u16 = 509;

impl PhishTankService {
    /// 获取完整钓鱼数据库快照
    ///
    /// 先查缓存（固定键，一小时 TTL），未命中时从上游整体下载一次。
    /// 批量下载不经过节流器，不与单条 URL 查询共享频率预算。
    /// 下载失败直接向调用方传播，没有旧数据兜底。
    pub async fn get_database(&self) -> Result<Arc<DatabaseSnapshot>> {
        if let Some(snapshot) = self.cache().get_snapshot().await {
            tracing::debug!("数据库快照缓存命中，共 {} 条记录", snapshot.total_count);
            return Ok(snapshot);
        }

        let url = self.database_url();
        tracing::info!("下载 PhishTank 数据库: {}", redact_key(&url, self.config().api_key.as_deref()));

        let response = self
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::HttpRequest(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == RATE_LIMIT_STATUS {
            return Err(Error::RateLimited(
                "数据库下载被限流，请稍后重试或配置 API key".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("数据库响应不是合法 JSON: {e}")))?;

        // 非数组响应视为空列表，而不是错误
        let entries: Vec<PhishEntry> = match body {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };

        let snapshot = Arc::new(DatabaseSnapshot::new(entries));
        tracing::info!("数据库下载完成，共 {} 条记录", snapshot.total_count);

        self.cache().set_snapshot(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// 构建数据库下载地址，配置 API key 时嵌入路径段
    fn database_url(&self) -> String {
        let base = self.config().database_endpoint.trim_end_matches('/');
        match &self.config().api_key {
            Some(key) => format!("{base}/data/{key}/online-valid.json"),
            None => format!("{base}/data/online-valid.json"),
        }
    }
}

/// 日志中隐去 URL 里的 API key
fn redact_key(url: &str, api_key: Option<&str>) -> String {
    match api_key {
        Some(key) if !key.is_empty() => url.replace(key, "***"),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::config::PhishTankConfig;

    fn service(api_key: Option<&str>) -> PhishTankService {
        let config = PhishTankConfig {
            api_key: api_key.map(str::to_string),
            ..PhishTankConfig::default()
        };
        PhishTankService::new(config, &CacheConfig::default()).expect("service should build")
    }

    #[test]
    fn test_database_url_without_key() {
        let service = service(None);
        assert_eq!(
            service.database_url(),
            "https://data.phishtank.com/data/online-valid.json"
        );
    }

    #[test]
    fn test_database_url_embeds_key() {
        let service = service(Some("secret"));
        assert_eq!(
            service.database_url(),
            "https://data.phishtank.com/data/secret/online-valid.json"
        );
    }

    #[test]
    fn test_redact_key() {
        let url = "https://data.phishtank.com/data/secret/online-valid.json";
        assert_eq!(
            redact_key(url, Some("secret")),
            "https://data.phishtank.com/data/***/online-valid.json"
        );
        assert_eq!(redact_key(url, None), url);
    }
}
