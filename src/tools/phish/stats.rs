//! 数据库快照上的统计聚合
#![allow(missing_docs)]

use super::model::PhishEntry;
use super::PhishTankService;
use crate::tools::Tool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 统计窗口天数的取值范围与默认值
const MIN_DAYS: u32 = 1;
const MAX_DAYS: u32 = 30;
const DEFAULT_DAYS: u32 = 7;

/// 品牌榜条数的取值范围与默认值
const MIN_TOP_TARGETS: u32 = 1;
const MAX_TOP_TARGETS: u32 = 50;
const DEFAULT_TOP_TARGETS: u32 = 10;

/// 一个品牌的计数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCount {
    /// 品牌名
    pub target: String,
    /// 窗口内出现次数
    pub count: usize,
}

/// 统计结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhishStats {
    /// 实际使用的窗口天数
    pub days: u32,
    /// 窗口起始日期（含）
    pub from_date: String,
    /// 窗口结束日期（含，即今天）
    pub to_date: String,
    /// 窗口内提交总数
    pub total_submissions: usize,
    /// 窗口内已核实条数
    pub verified: usize,
    /// 窗口内仍在线条数
    pub online: usize,
    /// 被仿冒最多的品牌，按次数降序
    pub top_targets: Vec<TargetCount>,
}

/// 计算统计窗口内的聚合指标
///
/// `now` 由调用方传入，测试可以固定时钟。没有 target 的条目
/// 不参与品牌分组；次数相同的品牌按名称排序保证结果稳定。
pub fn compute_stats(
    entries: &[PhishEntry],
    now: DateTime<Utc>,
    days: Option<u32>,
    top_targets_limit: Option<u32>,
) -> PhishStats {
    let days = days.unwrap_or(DEFAULT_DAYS).clamp(MIN_DAYS, MAX_DAYS);
    let top_limit = top_targets_limit
        .unwrap_or(DEFAULT_TOP_TARGETS)
        .clamp(MIN_TOP_TARGETS, MAX_TOP_TARGETS) as usize;

    let cutoff = now - chrono::Duration::days(i64::from(days));

    let window: Vec<&PhishEntry> = entries
        .iter()
        .filter(|e| e.submitted_at().is_some_and(|ts| ts >= cutoff))
        .collect();

    let verified = window.iter().filter(|e| e.is_verified()).count();
    let online = window.iter().filter(|e| e.is_online()).count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in &window {
        if let Some(target) = &entry.target {
            *counts.entry(target.as_str()).or_default() += 1;
        }
    }

    let mut top_targets: Vec<TargetCount> = counts
        .into_iter()
        .map(|(target, count)| TargetCount {
            target: target.to_string(),
            count,
        })
        .collect();
    top_targets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.target.cmp(&b.target)));
    top_targets.truncate(top_limit);

    PhishStats {
        days,
        from_date: cutoff.format("%Y-%m-%d").to_string(),
        to_date: now.format("%Y-%m-%d").to_string(),
        total_submissions: window.len(),
        verified,
        online,
        top_targets,
    }
}

/// 统计工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "get_phish_stats",
    title = "获取钓鱼统计",
    description = "统计最近若干天内的钓鱼提交：总数、已核实数、在线数，以及被仿冒最多的品牌排行。",
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
pub struct GetPhishStatsTool {
    /// 统计窗口（天）
    #[json_schema(
        title = "统计窗口",
        description = "统计最近多少天的提交，范围 1-30",
        minimum = 1,
        maximum = 30,
        default = 7
    )]
    pub days: Option<u32>,

    /// 品牌榜条数
    #[json_schema(
        title = "品牌榜条数",
        description = "返回被仿冒最多的前多少个品牌，范围 1-50",
        minimum = 1,
        maximum = 50,
        default = 10
    )]
    pub top_targets_limit: Option<u32>,
}

pub struct GetPhishStatsToolImpl {
    service: Arc<PhishTankService>,
}

impl GetPhishStatsToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetPhishStatsToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        GetPhishStatsTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: GetPhishStatsTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments("get_phish_stats", Some(format!("参数解析失败: {e}")))
        })?;

        let outcome = self.service.get_database().await.map(|snapshot| {
            let stats = compute_stats(
                &snapshot.entries,
                Utc::now(),
                params.days,
                params.top_targets_limit,
            );
            let summary = format!(
                "{} submissions in the last {} days ({} verified, {} online)",
                stats.total_submissions, stats.days, stats.verified, stats.online
            );
            let mut envelope = serde_json::to_value(&stats).unwrap_or_default();
            envelope["total_in_database"] = serde_json::json!(snapshot.total_count);
            envelope["summary"] = serde_json::Value::String(summary);
            envelope
        });

        super::into_tool_response("get_phish_stats", outcome)
    }
}
