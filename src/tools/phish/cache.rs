//! PhishTank 缓存封装
//!
//! 约定缓存键：单条 URL 查询使用 `url_check:` 前缀加原样 URL
//! （区分大小写、不做任何规范化），数据库快照使用固定键。
//! 两类条目的 TTL 相互独立。

use super::model::{DatabaseSnapshot, UrlCheckResult};
use crate::cache::{Cache, CacheConfig};
use std::sync::Arc;
use std::time::Duration;

/// 数据库快照的固定缓存键
pub const DATABASE_CACHE_KEY: &str = "phishtank_database";

/// URL 查询缓存键前缀
pub const URL_CHECK_KEY_PREFIX: &str = "url_check:";

/// 缓存值
#[derive(Clone)]
pub enum CachedValue {
    /// 单条 URL 查询结果
    UrlCheck(UrlCheckResult),
    /// 完整数据库快照
    Snapshot(Arc<DatabaseSnapshot>),
}

/// PhishTank 缓存服务
#[derive(Clone)]
pub struct PhishCache {
    cache: Arc<dyn Cache<CachedValue>>,
    url_check_ttl: Duration,
    database_ttl: Duration,
}

impl PhishCache {
    /// 创建新的缓存服务
    pub fn new(cache: Arc<dyn Cache<CachedValue>>, config: &CacheConfig) -> Self {
        Self {
            cache,
            url_check_ttl: Duration::from_secs(config.url_check_ttl_secs),
            database_ttl: Duration::from_secs(config.database_ttl_secs),
        }
    }

    /// 获取缓存的 URL 查询结果
    pub async fn get_url_check(&self, url: &str) -> Option<UrlCheckResult> {
        match self.cache.get(&Self::url_check_key(url)).await {
            Some(CachedValue::UrlCheck(result)) => Some(result),
            _ => None,
        }
    }

    /// 缓存 URL 查询结果
    pub async fn set_url_check(&self, url: &str, result: UrlCheckResult) {
        self.cache
            .set(
                Self::url_check_key(url),
                CachedValue::UrlCheck(result),
                Some(self.url_check_ttl),
            )
            .await;
    }

    /// 获取缓存的数据库快照
    pub async fn get_snapshot(&self) -> Option<Arc<DatabaseSnapshot>> {
        match self.cache.get(DATABASE_CACHE_KEY).await {
            Some(CachedValue::Snapshot(snapshot)) => Some(snapshot),
            _ => None,
        }
    }

    /// 缓存数据库快照（整体替换）
    pub async fn set_snapshot(&self, snapshot: Arc<DatabaseSnapshot>) {
        self.cache
            .set(
                DATABASE_CACHE_KEY.to_string(),
                CachedValue::Snapshot(snapshot),
                Some(self.database_ttl),
            )
            .await;
    }

    /// 清空缓存
    pub async fn clear(&self) {
        self.cache.clear().await;
    }

    /// 构建 URL 查询缓存键（URL 原样拼接，不规范化）
    #[must_use]
    pub fn url_check_key(url: &str) -> String {
        format!("{URL_CHECK_KEY_PREFIX}{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryCache;

    fn phish_cache() -> PhishCache {
        let cache: Arc<dyn Cache<CachedValue>> = Arc::new(MemoryCache::new());
        PhishCache::new(cache, &CacheConfig::default())
    }

    fn check_result(url: &str) -> UrlCheckResult {
        UrlCheckResult {
            url: url.to_string(),
            in_database: false,
            phish_id: None,
            phish_detail_page: None,
            verified: None,
            valid: None,
            submitted_at: None,
            rate_limit: None,
            cached: false,
        }
    }

    #[test]
    fn test_cache_key_generation() {
        assert_eq!(
            PhishCache::url_check_key("https://example.com/login"),
            "url_check:https://example.com/login"
        );
        // 不做大小写或斜杠规范化
        assert_ne!(
            PhishCache::url_check_key("https://A.com"),
            PhishCache::url_check_key("https://a.com")
        );
        assert_ne!(
            PhishCache::url_check_key("https://a.com"),
            PhishCache::url_check_key("https://a.com/")
        );
    }

    #[tokio::test]
    async fn test_url_check_roundtrip() {
        let cache = phish_cache();

        assert!(cache.get_url_check("https://example.com/").await.is_none());

        cache
            .set_url_check("https://example.com/", check_result("https://example.com/"))
            .await;
        let cached = cache.get_url_check("https://example.com/").await;
        assert_eq!(cached, Some(check_result("https://example.com/")));

        // 大小写不同的 URL 是相互独立的条目
        assert!(cache.get_url_check("https://EXAMPLE.com/").await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let cache = phish_cache();

        assert!(cache.get_snapshot().await.is_none());

        let snapshot = Arc::new(DatabaseSnapshot::new(Vec::new()));
        cache.set_snapshot(snapshot.clone()).await;

        let cached = cache.get_snapshot().await.expect("should hit");
        assert_eq!(cached.total_count, 0);

        cache.clear().await;
        assert!(cache.get_snapshot().await.is_none());
    }
}
