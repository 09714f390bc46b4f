//! 服务器模块
//!
//! 提供 MCP 服务器的实现，支持多种传输协议。

pub mod handler;
pub mod transport;

use crate::error::Result;
use crate::tools::phish::PhishTankService;
use crate::tools::ToolRegistry;
use rust_mcp_sdk::schema::{
    Icon, IconTheme, Implementation, InitializeResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesTools,
};
use std::sync::Arc;

/// 服务器配置
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ServerConfig {
    /// 服务器名称
    pub name: String,

    /// 服务器版本
    pub version: String,

    /// 服务器描述
    pub description: Option<String>,

    /// 服务器图标
    pub icons: Vec<Icon>,

    /// 网站 URL
    pub website_url: Option<String>,

    /// 主机地址
    pub host: String,

    /// 端口
    pub port: u16,

    /// 传输模式
    pub transport_mode: String,

    /// PhishTank 上游配置
    pub phishtank: crate::config::PhishTankConfig,

    /// 缓存配置
    pub cache: crate::cache::CacheConfig,

    /// 日志配置
    pub logging: crate::config::LoggingConfig,
}

/// PhishTank 官方站点图标
#[must_use]
pub fn default_icons() -> Vec<Icon> {
    vec![
        Icon {
            src: "https://phishtank.org/favicon.ico".to_string(),
            mime_type: Some("image/x-icon".to_string()),
            sizes: vec!["32x32".to_string()],
            theme: Some(IconTheme::Light),
        },
        Icon {
            src: "https://phishtank.org/favicon.ico".to_string(),
            mime_type: Some("image/x-icon".to_string()),
            sizes: vec!["32x32".to_string()],
            theme: Some(IconTheme::Dark),
        },
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: Some("PhishTank 钓鱼网站情报查询 MCP 服务器".to_string()),
            icons: default_icons(),
            website_url: Some("https://phishtank.org".to_string()),
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport_mode: "stdio".to_string(),
            phishtank: crate::config::PhishTankConfig::default(),
            cache: crate::cache::CacheConfig::default(),
            logging: crate::config::LoggingConfig::default(),
        }
    }
}

impl From<crate::config::AppConfig> for ServerConfig {
    fn from(config: crate::config::AppConfig) -> Self {
        Self {
            name: config.server.name,
            version: config.server.version,
            description: config.server.description,
            icons: default_icons(),
            website_url: Some("https://phishtank.org".to_string()),
            host: config.server.host,
            port: config.server.port,
            transport_mode: config.server.transport_mode,
            phishtank: config.phishtank,
            cache: config.cache,
            logging: config.logging,
        }
    }
}

/// MCP 服务器
#[derive(Clone)]
pub struct PhishTankServer {
    config: ServerConfig,
    tool_registry: Arc<ToolRegistry>,
    service: Arc<PhishTankService>,
}

impl PhishTankServer {
    /// 创建新的服务器实例
    pub fn new(config: ServerConfig) -> Result<Self> {
        // 创建数据访问服务
        let service = Arc::new(PhishTankService::new(
            config.phishtank.clone(),
            &config.cache,
        )?);

        // 创建工具注册器
        let tool_registry = Arc::new(crate::tools::create_default_registry(&service));

        Ok(Self {
            config,
            tool_registry,
            service,
        })
    }

    /// 获取服务器配置
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 获取工具注册器
    #[must_use]
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// 获取数据访问服务
    #[must_use]
    pub fn service(&self) -> &Arc<PhishTankService> {
        &self.service
    }

    /// 获取服务器信息
    #[must_use]
    pub fn server_info(&self) -> InitializeResult {
        InitializeResult {
            server_info: Implementation {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
                title: Some("PhishTank MCP Server".to_string()),
                description: self.config.description.clone(),
                icons: self.config.icons.clone(),
                website_url: self.config.website_url.clone(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                resources: None,
                prompts: None,
                experimental: None,
                completions: None,
                logging: None,
                tasks: None,
            },
            protocol_version: ProtocolVersion::V2025_11_25.into(),
            instructions: Some(
                "使用此服务器查询 PhishTank 钓鱼网站情报。支持单条/批量 URL 查询、\
                 最近提交、品牌与日期检索、条目详情和统计聚合。"
                    .to_string(),
            ),
            meta: None,
        }
    }

    /// 运行 Stdio 服务器
    pub async fn run_stdio(&self) -> Result<()> {
        transport::run_stdio_server(self).await
    }

    /// 运行 HTTP 服务器
    pub async fn run_http(&self) -> Result<()> {
        transport::run_http_server(self).await
    }

    /// 运行 SSE 服务器
    pub async fn run_sse(&self) -> Result<()> {
        transport::run_sse_server(self).await
    }
}
