//! 配置模块

use crate::cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 应用程序配置
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,

    /// PhishTank 上游配置
    pub phishtank: PhishTankConfig,

    /// 缓存配置
    pub cache: CacheConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务器名称
    pub name: String,

    /// 服务器版本
    pub version: String,

    /// 服务器描述
    pub description: Option<String>,

    /// 主机地址
    pub host: String,

    /// 端口
    pub port: u16,

    /// 传输模式
    pub transport_mode: String,

    /// 最大并发连接数
    pub max_connections: usize,

    /// 请求超时时间（秒）
    pub request_timeout_secs: u64,
}

/// PhishTank 上游配置
///
/// API key 和应用标识都是可选的，启动时读取一次。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhishTankConfig {
    /// API key（可选；配置后请求配额从 10 次/分钟提升到 100 次/分钟，
    /// 并作为表单字段 / URL 路径段转发给上游）
    pub api_key: Option<String>,

    /// 应用标识（可选；作为 User-Agent 头发送）
    pub app_name: Option<String>,

    /// 单条 URL 查询端点
    pub check_endpoint: String,

    /// 数据库批量下载端点（基础地址，路径在运行时拼接）
    pub database_endpoint: String,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,

    /// 日志文件路径
    pub file_path: Option<String>,

    /// 是否启用控制台日志
    pub enable_console: bool,

    /// 是否启用文件日志
    pub enable_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: Some("PhishTank 钓鱼网站情报查询 MCP 服务器".to_string()),
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport_mode: "stdio".to_string(),
            max_connections: 100,
            request_timeout_secs: 30,
        }
    }
}

impl Default for PhishTankConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            app_name: None,
            check_endpoint: "https://checkurl.phishtank.com/checkurl/".to_string(),
            database_endpoint: "https://data.phishtank.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: Some("./logs/phishtank-mcp.log".to_string()),
            enable_console: true,
            enable_file: false,
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    ///
    /// # Errors
    ///
    /// 如果文件不存在、无法读取或格式无效，返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::error::Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| crate::error::Error::Config(format!("读取配置文件失败: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::Error::Config(format!("解析配置文件失败: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # Errors
    ///
    /// 如果无法序列化配置、创建目录或写入文件，返回错误
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), crate::error::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(format!("序列化配置失败: {e}")))?;

        // 确保目录存在
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .map_err(|e| crate::error::Error::Config(format!("创建目录失败: {e}")))?;
        }

        fs::write(path, content)
            .map_err(|e| crate::error::Error::Config(format!("写入配置文件失败: {e}")))?;

        Ok(())
    }

    /// 应用环境变量覆盖（环境变量优先于文件配置）
    pub fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("PHISHTANK_API_KEY") {
            if !api_key.is_empty() {
                self.phishtank.api_key = Some(api_key);
            }
        }

        if let Ok(app_name) = std::env::var("PHISHTANK_APP_NAME") {
            if !app_name.is_empty() {
                self.phishtank.app_name = Some(app_name);
            }
        }

        if let Ok(host) = std::env::var("PHISHTANK_MCP_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("PHISHTANK_MCP_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(mode) = std::env::var("PHISHTANK_MCP_TRANSPORT_MODE") {
            self.server.transport_mode = mode;
        }

        if let Ok(level) = std::env::var("PHISHTANK_MCP_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// 验证配置
    ///
    /// # Errors
    ///
    /// 如果配置无效（如空主机名、无效端口等），返回错误
    pub fn validate(&self) -> Result<(), crate::error::Error> {
        // 验证服务器配置
        if self.server.host.is_empty() {
            return Err(crate::error::Error::Config("服务器主机不能为空".to_string()));
        }

        if self.server.port == 0 {
            return Err(crate::error::Error::Config("服务器端口不能为0".to_string()));
        }

        if self.server.max_connections == 0 {
            return Err(crate::error::Error::Config("最大连接数不能为0".to_string()));
        }

        // 验证传输模式
        let valid_modes = ["stdio", "http", "sse", "hybrid"];
        if !valid_modes.contains(&self.server.transport_mode.as_str()) {
            return Err(crate::error::Error::Config(format!(
                "无效的传输模式: {}，有效值: {:?}",
                self.server.transport_mode, valid_modes
            )));
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(crate::error::Error::Config(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        // 验证上游端点
        url::Url::parse(&self.phishtank.check_endpoint)
            .map_err(|e| crate::error::Error::Config(format!("无效的查询端点: {e}")))?;
        url::Url::parse(&self.phishtank.database_endpoint)
            .map_err(|e| crate::error::Error::Config(format!("无效的数据库端点: {e}")))?;

        // 验证缓存配置
        if self.cache.url_check_ttl_secs == 0 {
            return Err(crate::error::Error::Config("URL 查询缓存 TTL 不能为0".to_string()));
        }

        if self.cache.database_ttl_secs == 0 {
            return Err(crate::error::Error::Config("数据库快照缓存 TTL 不能为0".to_string()));
        }

        Ok(())
    }
}
