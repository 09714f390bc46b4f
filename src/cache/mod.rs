//! 缓存模块
//!
//! 提供带 TTL 的内存缓存。每个键的 TTL 相互独立，
//! 过期后的读取视同未命中（读取时惰性淘汰）。

pub mod memory;

use std::time::Duration;

/// 缓存 trait
///
/// 缓存操作永远不会失败：未命中是正常分支，不是错误。
#[async_trait::async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// 获取缓存值，过期视同不存在
    async fn get(&self, key: &str) -> Option<V>;

    /// 设置缓存值，`ttl` 为 `None` 时永不过期
    async fn set(&self, key: String, value: V, ttl: Option<Duration>);

    /// 删除缓存值
    async fn delete(&self, key: &str);

    /// 清空缓存
    async fn clear(&self);

    /// 检查键是否存在且未过期
    async fn exists(&self, key: &str) -> bool;
}

/// 缓存配置
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct CacheConfig {
    /// 单条 URL 查询结果的 TTL（秒）
    pub url_check_ttl_secs: u64,

    /// 数据库快照的 TTL（秒）
    pub database_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url_check_ttl_secs: 300,    // 5分钟
            database_ttl_secs: 3600,    // 1小时
        }
    }
}
