//! 单元测试

use phishtank_mcp::cache::memory::MemoryCache;
use phishtank_mcp::cache::{Cache, CacheConfig};
use phishtank_mcp::tools::phish::cache::{CachedValue, PhishCache, DATABASE_CACHE_KEY};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// 内存缓存测试
// ============================================================================

/// 测试内存缓存的 TTL 过期（暂停时钟，确定性推进时间）
#[tokio::test(start_paused = true)]
async fn test_memory_cache_ttl_expiry() {
    let cache: MemoryCache<String> = MemoryCache::new();

    cache
        .set(
            "key".to_string(),
            "value".to_string(),
            Some(Duration::from_secs(300)),
        )
        .await;

    tokio::time::advance(Duration::from_secs(299)).await;
    assert_eq!(cache.get("key").await, Some("value".to_string()));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get("key").await, None);
}

/// 测试无 TTL 条目永不过期
#[tokio::test(start_paused = true)]
async fn test_memory_cache_no_ttl_never_expires() {
    let cache: MemoryCache<String> = MemoryCache::new();

    cache.set("key".to_string(), "value".to_string(), None).await;

    tokio::time::advance(Duration::from_secs(86_400)).await;
    assert_eq!(cache.get("key").await, Some("value".to_string()));
}

/// 测试每个键的 TTL 相互独立
#[tokio::test(start_paused = true)]
async fn test_memory_cache_independent_ttls() {
    let cache: MemoryCache<String> = MemoryCache::new();

    cache
        .set(
            "short".to_string(),
            "a".to_string(),
            Some(Duration::from_secs(10)),
        )
        .await;
    cache
        .set(
            "long".to_string(),
            "b".to_string(),
            Some(Duration::from_secs(100)),
        )
        .await;

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(cache.get("short").await, None);
    assert_eq!(cache.get("long").await, Some("b".to_string()));
}

// ============================================================================
// PhishTank 缓存键测试
// ============================================================================

/// 测试缓存键不做任何 URL 规范化
#[test]
fn test_phish_cache_key_no_normalization() {
    assert_eq!(
        PhishCache::url_check_key("https://Example.com/Login"),
        "url_check:https://Example.com/Login"
    );
    assert_ne!(
        PhishCache::url_check_key("https://example.com"),
        PhishCache::url_check_key("https://example.com/")
    );
    assert_eq!(DATABASE_CACHE_KEY, "phishtank_database");
}

/// 测试两类缓存条目互不干扰
#[tokio::test]
async fn test_phish_cache_entry_kinds_are_separate() {
    use phishtank_mcp::tools::phish::model::DatabaseSnapshot;

    let store: Arc<dyn Cache<CachedValue>> = Arc::new(MemoryCache::new());
    let cache = PhishCache::new(store, &CacheConfig::default());

    cache
        .set_snapshot(Arc::new(DatabaseSnapshot::new(Vec::new())))
        .await;

    // 快照的存在不影响 URL 查询键
    assert!(cache.get_url_check("https://example.com/").await.is_none());
    assert!(cache.get_snapshot().await.is_some());
}

// ============================================================================
// 配置边界测试
// ============================================================================

/// 测试配置验证 - 空主机名
#[test]
fn test_config_validation_empty_host() {
    let mut config = phishtank_mcp::config::AppConfig::default();
    config.server.host = String::new();
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 端口为 0
#[test]
fn test_config_validation_zero_port() {
    let mut config = phishtank_mcp::config::AppConfig::default();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 无效日志级别
#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = phishtank_mcp::config::AppConfig::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

/// 测试配置验证 - 缓存 TTL 为 0
#[test]
fn test_config_validation_zero_ttl() {
    let mut config = phishtank_mcp::config::AppConfig::default();
    config.cache.url_check_ttl_secs = 0;
    assert!(config.validate().is_err());

    let mut config = phishtank_mcp::config::AppConfig::default();
    config.cache.database_ttl_secs = 0;
    assert!(config.validate().is_err());
}

/// 测试配置保存和加载
#[test]
fn test_config_save_and_load() {
    use phishtank_mcp::config::AppConfig;

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("config.toml");

    let mut config = AppConfig::default();
    config.phishtank.app_name = Some("phishtank-mcp-test/1.0".to_string());
    config.save_to_file(&path).expect("保存配置失败");

    let loaded = AppConfig::from_file(&path).expect("加载配置失败");
    assert_eq!(loaded.server.host, config.server.host);
    assert_eq!(
        loaded.phishtank.app_name.as_deref(),
        Some("phishtank-mcp-test/1.0")
    );
    assert_eq!(loaded.cache.database_ttl_secs, 3600);
}

// ============================================================================
// 错误处理测试
// ============================================================================

/// 测试错误类型转换
#[test]
fn test_error_conversions() {
    use phishtank_mcp::error::Error;

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    assert!(matches!(error, Error::Io(_)));

    let json_error = serde_json::from_str::<i32>("not a number").unwrap_err();
    let error: Error = json_error.into();
    assert!(matches!(error, Error::Json(_)));

    let url_error = url::Url::parse("not a valid url: bad").unwrap_err();
    let error: Error = url_error.into();
    assert!(matches!(error, Error::Url(_)));

    let anyhow_error = anyhow::anyhow!("something went wrong");
    let error: Error = anyhow_error.into();
    assert!(matches!(error, Error::Other(_)));
}

/// 测试错误显示
#[test]
fn test_error_display() {
    use phishtank_mcp::error::Error;

    let error = Error::Config("测试配置错误".to_string());
    assert!(error.to_string().contains("配置错误"));

    let error = Error::InvalidArgument("urls 不能为空".to_string());
    assert!(error.to_string().contains("无效参数"));

    let error = Error::Upstream {
        status: 502,
        message: "bad gateway".to_string(),
    };
    assert!(error.to_string().contains("502"));

    let error = Error::RateLimited("限流".to_string());
    assert!(error.to_string().contains("频率超限"));
}

// ============================================================================
// 工具参数测试
// ============================================================================

/// 测试 CheckUrlTool 参数反序列化
#[test]
fn test_check_url_tool_params() {
    use phishtank_mcp::tools::phish::check::CheckUrlTool;

    let params: CheckUrlTool = serde_json::from_value(serde_json::json!({
        "url": "https://example.com/login"
    }))
    .expect("参数解析失败");

    assert_eq!(params.url, "https://example.com/login");
    assert!(params.format.is_none());
}

/// 测试 CheckMultipleUrlsTool 参数反序列化
#[test]
fn test_check_multiple_urls_tool_params() {
    use phishtank_mcp::tools::phish::check::CheckMultipleUrlsTool;

    let params: CheckMultipleUrlsTool = serde_json::from_value(serde_json::json!({
        "urls": ["https://a.example/", "https://b.example/"],
        "delay": 2000
    }))
    .expect("参数解析失败");

    assert_eq!(params.urls.len(), 2);
    assert_eq!(params.delay, Some(2000));
}

/// 测试 SearchPhishByDateTool 参数反序列化
#[test]
fn test_search_phish_by_date_tool_params() {
    use phishtank_mcp::tools::phish::query::SearchPhishByDateTool;

    let params: SearchPhishByDateTool = serde_json::from_value(serde_json::json!({
        "start_date": "2024-01-01",
        "end_date": "2024-01-31"
    }))
    .expect("参数解析失败");

    assert_eq!(params.start_date, "2024-01-01");
    assert_eq!(params.end_date, "2024-01-31");
    assert!(params.limit.is_none());
}

// ============================================================================
// 传输模式测试
// ============================================================================

/// 测试传输模式解析
#[test]
fn test_transport_mode_from_str() {
    use phishtank_mcp::server::transport::TransportMode;
    use std::str::FromStr;

    let modes = [
        ("stdio", TransportMode::Stdio),
        ("http", TransportMode::Http),
        ("sse", TransportMode::Sse),
        ("hybrid", TransportMode::Hybrid),
        ("STDIO", TransportMode::Stdio),
        ("Hybrid", TransportMode::Hybrid),
    ];

    for (input, expected) in modes {
        assert_eq!(TransportMode::from_str(input), Ok(expected));
    }

    assert!(TransportMode::from_str("invalid").is_err());
}

// ============================================================================
// 常量测试
// ============================================================================

/// 测试版本常量
#[test]
fn test_version_constant() {
    let version = phishtank_mcp::VERSION;
    assert!(!version.is_empty());
    assert!(version.contains('.'));
}

/// 测试名称常量
#[test]
fn test_name_constant() {
    assert_eq!(phishtank_mcp::NAME, "phishtank-mcp");
}
