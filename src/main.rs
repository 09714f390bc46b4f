//! PhishTank MCP 服务器主程序

use clap::{Parser, Subcommand};
use phishtank_mcp::server::transport;
use phishtank_mcp::PhishTankServer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phishtank-mcp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PhishTank 钓鱼网站情报查询 MCP 服务器", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// 启用调试日志
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动服务器
    Serve {
        /// 传输模式 [stdio, http, sse, hybrid]
        #[arg(short, long)]
        mode: Option<String>,

        /// 监听主机
        #[arg(long)]
        host: Option<String>,

        /// 监听端口
        #[arg(short, long)]
        port: Option<u16>,

        /// PhishTank API key（提升请求配额）
        #[arg(long)]
        api_key: Option<String>,
    },

    /// 生成配置文件
    Config {
        /// 输出文件路径
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 测试工具
    Test {
        /// 要测试的工具 [check_url, get_recent_phish, search_phish_by_target,
        /// get_phish_details, get_phish_stats, search_phish_by_date]
        #[arg(short, long, default_value = "check_url")]
        tool: String,

        /// 要查询的 URL（用于 check_url）
        #[arg(long)]
        url: Option<String>,

        /// 品牌名（用于 search_phish_by_target）
        #[arg(long)]
        target: Option<String>,

        /// 条目 ID（用于 get_phish_details）
        #[arg(long)]
        phish_id: Option<u64>,

        /// 起始日期 YYYY-MM-DD（用于 search_phish_by_date）
        #[arg(long)]
        start_date: Option<String>,

        /// 结束日期 YYYY-MM-DD（用于 search_phish_by_date）
        #[arg(long)]
        end_date: Option<String>,

        /// 结果限制
        #[arg(long)]
        limit: Option<u32>,

        /// 统计窗口天数（用于 get_phish_stats）
        #[arg(long)]
        days: Option<u32>,
    },

    /// 显示版本信息
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 注意：日志系统在 serve_command 中初始化（使用配置文件中的日志设置）

    match cli.command {
        Commands::Serve {
            mode,
            host,
            port,
            api_key,
        } => {
            serve_command(&cli.config, cli.debug, mode, host, port, api_key).await?;
        }
        Commands::Config { output, force } => {
            config_command(&output, force)?;
        }
        Commands::Test {
            tool,
            url,
            target,
            phish_id,
            start_date,
            end_date,
            limit,
            days,
        } => {
            test_command(
                &cli.config,
                &tool,
                url.as_deref(),
                target.as_deref(),
                phish_id,
                start_date.as_deref(),
                end_date.as_deref(),
                limit,
                days,
            )
            .await?;
        }
        Commands::Version => {
            version_command();
        }
    }

    Ok(())
}

/// 启动服务器命令
async fn serve_command(
    config_path: &PathBuf,
    debug: bool,
    mode: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    // 加载配置
    let config = load_config(config_path, host, port, mode, api_key)?;

    // 获取实际使用的传输模式（用于日志和启动）
    let transport_mode: transport::TransportMode = config.server.transport_mode.parse()?;

    // 初始化日志系统（debug 模式覆盖配置文件中的日志级别）
    if debug {
        let mut debug_config = config.logging.clone();
        debug_config.level = "debug".to_string();
        phishtank_mcp::init_logging_with_config(&debug_config)
            .map_err(|e| format!("初始化日志系统失败: {e}"))?;
    } else {
        phishtank_mcp::init_logging_with_config(&config.logging)
            .map_err(|e| format!("初始化日志系统失败: {e}"))?;
    }

    tracing::info!("启动 PhishTank MCP 服务器 v{}", env!("CARGO_PKG_VERSION"));
    if config.phishtank.api_key.is_some() {
        tracing::info!("已配置 PhishTank API key，请求配额 100 次/分钟");
    } else {
        tracing::info!("未配置 PhishTank API key，请求配额 10 次/分钟");
    }

    // 创建服务器
    let server = PhishTankServer::new(config.into()).map_err(|e| format!("创建服务器失败: {e}"))?;

    tracing::info!(
        "使用 {} 传输模式，监听 {}:{}",
        transport_mode,
        server.config().host,
        server.config().port
    );
    transport::run_server_with_mode(&server, transport_mode)
        .await
        .map_err(|e| format!("服务器启动失败: {e}"))?;

    Ok(())
}

/// 加载配置
fn load_config(
    config_path: &PathBuf,
    host: Option<String>,
    port: Option<u16>,
    mode: Option<String>,
    api_key: Option<String>,
) -> Result<phishtank_mcp::config::AppConfig, Box<dyn std::error::Error>> {
    let mut config = if config_path.exists() {
        phishtank_mcp::config::AppConfig::from_file(config_path)
            .map_err(|e| format!("加载配置文件失败: {e}"))?
    } else {
        phishtank_mcp::config::AppConfig::default()
    };

    // 环境变量优先于文件配置
    config.apply_env();

    // 仅当命令行参数显式提供时，才覆盖配置
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }
    if let Some(m) = mode {
        config.server.transport_mode = m;
    }
    if let Some(key) = api_key {
        config.phishtank.api_key = Some(key);
    }

    // 验证配置
    config.validate().map_err(|e| format!("配置验证失败: {e}"))?;

    Ok(config)
}

/// 生成配置文件命令
fn config_command(output: &PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if output.exists() && !force {
        return Err(format!("配置文件已存在: {}，使用 --force 覆盖", output.display()).into());
    }

    let config = phishtank_mcp::config::AppConfig::default();
    config
        .save_to_file(output)
        .map_err(|e| format!("保存配置文件失败: {e}"))?;

    println!("配置文件已生成: {}", output.display());
    println!("请根据需要编辑配置文件。");

    Ok(())
}

/// 测试工具命令
#[allow(clippy::too_many_arguments)]
async fn test_command(
    config_path: &PathBuf,
    tool: &str,
    url: Option<&str>,
    target: Option<&str>,
    phish_id: Option<u64>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    limit: Option<u32>,
    days: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path, None, None, None, None)?;

    // 创建数据访问服务与工具注册表
    let service = std::sync::Arc::new(phishtank_mcp::tools::phish::PhishTankService::new(
        config.phishtank,
        &config.cache,
    )?);
    let registry = phishtank_mcp::tools::create_default_registry(&service);

    let arguments = match tool {
        "check_url" => {
            let Some(url) = url else {
                return Err("check_url 需要 --url 参数".into());
            };
            serde_json::json!({ "url": url })
        }
        "get_recent_phish" => serde_json::json!({ "limit": limit }),
        "search_phish_by_target" => {
            let Some(target) = target else {
                return Err("search_phish_by_target 需要 --target 参数".into());
            };
            serde_json::json!({ "target": target, "limit": limit })
        }
        "get_phish_details" => {
            let Some(phish_id) = phish_id else {
                return Err("get_phish_details 需要 --phish-id 参数".into());
            };
            serde_json::json!({ "phish_id": phish_id })
        }
        "get_phish_stats" => serde_json::json!({ "days": days }),
        "search_phish_by_date" => {
            let (Some(start), Some(end)) = (start_date, end_date) else {
                return Err("search_phish_by_date 需要 --start-date 和 --end-date 参数".into());
            };
            serde_json::json!({ "start_date": start, "end_date": end, "limit": limit })
        }
        _ => {
            return Err(format!("未知的工具: {tool}").into());
        }
    };

    println!("测试工具: {tool}");
    match registry.execute_tool(tool, arguments).await {
        Ok(result) => {
            println!("工具执行成功:");
            if let Some(content) = result.content.first() {
                match content {
                    rust_mcp_sdk::schema::ContentBlock::TextContent(text_content) => {
                        println!("{}", text_content.text);
                    }
                    other => {
                        println!("非文本内容: {other:?}");
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("工具执行失败: {e}");
        }
    }

    println!("工具测试完成");
    Ok(())
}

/// 版本命令
fn version_command() {
    println!("PhishTank MCP 服务器 v{}", env!("CARGO_PKG_VERSION"));
    println!("构建时间: {}", env!("BUILD_TIMESTAMP"));
    println!("Git 提交: {}", env!("GIT_COMMIT"));
    println!("Rust 版本: {}", env!("RUST_VERSION"));
}
