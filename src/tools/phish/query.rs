//! 数据库快照上的检索操作
//!
//! 过滤、排序、截断都是无副作用的纯变换，获取快照后在内存中完成。
#![allow(missing_docs)]

use super::model::PhishEntry;
use super::PhishTankService;
use crate::error::{Error, Result};
use crate::tools::Tool;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::OnceLock;

/// get_recent_phish 的条数上限与默认值
const RECENT_MAX_LIMIT: u32 = 1000;
const RECENT_DEFAULT_LIMIT: u32 = 100;

/// search_phish_by_target 的条数上限与默认值
const TARGET_MAX_LIMIT: u32 = 500;
const TARGET_DEFAULT_LIMIT: u32 = 50;

/// search_phish_by_date 的条数上限与默认值
const DATE_MAX_LIMIT: u32 = 500;
const DATE_DEFAULT_LIMIT: u32 = 100;

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"))
}

/// 按提交时间降序排序（无法解析时间的条目排在最后）
fn sort_by_submission_desc(entries: &mut [&PhishEntry]) {
    entries.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at()));
}

/// 最近提交的记录
///
/// 默认只保留在线条目，按提交时间降序，截断到 `limit`。
pub fn recent_entries(
    entries: &[PhishEntry],
    limit: Option<u32>,
    include_offline: bool,
) -> Vec<PhishEntry> {
    let limit = limit.unwrap_or(RECENT_DEFAULT_LIMIT).clamp(1, RECENT_MAX_LIMIT);

    let mut matched: Vec<&PhishEntry> = entries
        .iter()
        .filter(|e| include_offline || e.is_online())
        .collect();
    sort_by_submission_desc(&mut matched);

    matched.into_iter().take(limit as usize).cloned().collect()
}

/// 按仿冒品牌检索
///
/// 对 target 字段做不区分大小写的子串匹配，没有 target 的条目永不匹配。
pub fn search_by_target(
    entries: &[PhishEntry],
    target: &str,
    limit: Option<u32>,
    verified_only: bool,
) -> Vec<PhishEntry> {
    let limit = limit.unwrap_or(TARGET_DEFAULT_LIMIT).clamp(1, TARGET_MAX_LIMIT);
    let needle = target.to_lowercase();

    let mut matched: Vec<&PhishEntry> = entries
        .iter()
        .filter(|e| {
            e.target
                .as_ref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .filter(|e| !verified_only || e.is_verified())
        .collect();
    sort_by_submission_desc(&mut matched);

    matched.into_iter().take(limit as usize).cloned().collect()
}

/// 按编号精确查找
pub fn find_by_id(entries: &[PhishEntry], phish_id: u64) -> Option<PhishEntry> {
    entries.iter().find(|e| e.phish_id == phish_id).cloned()
}

/// 解析并校验日期区间
///
/// 两个日期都必须严格符合 `YYYY-MM-DD`；结束日期的时间部分
/// 固定为 23:59:59.999，使区间包含结束日的整天。
pub fn parse_date_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    for value in [start, end] {
        if !date_regex().is_match(value) {
            return Err(Error::InvalidArgument(format!(
                "日期格式无效: '{value}'，应为 YYYY-MM-DD"
            )));
        }
    }

    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .map_err(|e| Error::InvalidArgument(format!("无效的开始日期 '{start}': {e}")))?;
    let end_date = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .map_err(|e| Error::InvalidArgument(format!("无效的结束日期 '{end}': {e}")))?;

    let start_dt = Utc.from_utc_datetime(
        &start_date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time"),
    );
    let end_dt = Utc.from_utc_datetime(
        &end_date
            .and_hms_milli_opt(23, 59, 59, 999)
            .expect("end of day is a valid time"),
    );

    if start_dt > end_dt {
        return Err(Error::InvalidArgument(format!(
            "开始日期 {start} 晚于结束日期 {end}"
        )));
    }

    Ok((start_dt, end_dt))
}

/// 按提交时间区间检索（两端包含）
pub fn search_by_date(
    entries: &[PhishEntry],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: Option<u32>,
) -> Vec<PhishEntry> {
    let limit = limit.unwrap_or(DATE_DEFAULT_LIMIT).clamp(1, DATE_MAX_LIMIT);

    let mut matched: Vec<&PhishEntry> = entries
        .iter()
        .filter(|e| {
            e.submitted_at()
                .is_some_and(|ts| ts >= start && ts <= end)
        })
        .collect();
    sort_by_submission_desc(&mut matched);

    matched.into_iter().take(limit as usize).cloned().collect()
}

/// 获取最近钓鱼记录的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "get_recent_phish",
    title = "获取最近的钓鱼记录",
    description = "从 PhishTank 数据库快照中按提交时间降序返回最近的钓鱼记录。默认只包含仍在线的条目。",
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
pub struct GetRecentPhishTool {
    /// 返回条数
    #[json_schema(
        title = "条数",
        description = "返回的最大条数，范围 1-1000",
        minimum = 1,
        maximum = 1000,
        default = 100
    )]
    pub limit: Option<u32>,

    /// 是否包含已下线条目
    #[json_schema(
        title = "包含离线条目",
        description = "是否包含已下线的条目，默认 false",
        default = false
    )]
    pub include_offline: Option<bool>,
}

pub struct GetRecentPhishToolImpl {
    service: Arc<PhishTankService>,
}

impl GetRecentPhishToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetRecentPhishToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        GetRecentPhishTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: GetRecentPhishTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments("get_recent_phish", Some(format!("参数解析失败: {e}")))
        })?;

        let include_offline = params.include_offline.unwrap_or(false);
        let outcome = self.service.get_database().await.map(|snapshot| {
            let entries = recent_entries(&snapshot.entries, params.limit, include_offline);
            let summary = if include_offline {
                format!("Found {} recent phishing entries", entries.len())
            } else {
                format!("Found {} recent online phishing entries", entries.len())
            };
            serde_json::json!({
                "count": entries.len(),
                "total_in_database": snapshot.total_count,
                "entries": entries,
                "summary": summary,
            })
        });

        super::into_tool_response("get_recent_phish", outcome)
    }
}

/// 按品牌检索的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "search_phish_by_target",
    title = "按仿冒品牌检索",
    description = "在 PhishTank 数据库快照中按被仿冒的品牌名检索（不区分大小写的子串匹配）。默认只返回已核实的条目。",
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
pub struct SearchPhishByTargetTool {
    /// 品牌名
    #[json_schema(title = "品牌名", description = "被仿冒的品牌名，例如 PayPal、Apple")]
    pub target: String,

    /// 返回条数
    #[json_schema(
        title = "条数",
        description = "返回的最大条数，范围 1-500",
        minimum = 1,
        maximum = 500,
        default = 50
    )]
    pub limit: Option<u32>,

    /// 是否只返回已核实条目
    #[json_schema(
        title = "仅已核实",
        description = "是否只返回已核实的条目，默认 true",
        default = true
    )]
    pub verified_only: Option<bool>,
}

pub struct SearchPhishByTargetToolImpl {
    service: Arc<PhishTankService>,
}

impl SearchPhishByTargetToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchPhishByTargetToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        SearchPhishByTargetTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: SearchPhishByTargetTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments(
                "search_phish_by_target",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        if params.target.trim().is_empty() {
            return Err(CallToolError::invalid_arguments(
                "search_phish_by_target",
                Some("target 不能为空".to_string()),
            ));
        }

        let verified_only = params.verified_only.unwrap_or(true);
        let outcome = self.service.get_database().await.map(|snapshot| {
            let entries =
                search_by_target(&snapshot.entries, &params.target, params.limit, verified_only);
            let summary = format!(
                "Found {} phishing entries targeting '{}'",
                entries.len(),
                params.target
            );
            serde_json::json!({
                "target": params.target,
                "verified_only": verified_only,
                "count": entries.len(),
                "entries": entries,
                "summary": summary,
            })
        });

        super::into_tool_response("search_phish_by_target", outcome)
    }
}

/// 按编号查询详情的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "get_phish_details",
    title = "查询钓鱼记录详情",
    description = "按 PhishTank 编号精确查询一条钓鱼记录的完整信息。编号不存在时返回 found=false，不算错误。",
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
pub struct GetPhishDetailsTool {
    /// PhishTank 编号
    #[json_schema(title = "编号", description = "要查询的 PhishTank 记录编号（正整数）", minimum = 1)]
    pub phish_id: u64,
}

pub struct GetPhishDetailsToolImpl {
    service: Arc<PhishTankService>,
}

impl GetPhishDetailsToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for GetPhishDetailsToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        GetPhishDetailsTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: GetPhishDetailsTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments("get_phish_details", Some(format!("参数解析失败: {e}")))
        })?;

        if params.phish_id == 0 {
            return Err(CallToolError::invalid_arguments(
                "get_phish_details",
                Some("phish_id 必须大于 0".to_string()),
            ));
        }

        let outcome = self.service.get_database().await.map(|snapshot| {
            match find_by_id(&snapshot.entries, params.phish_id) {
                Some(entry) => {
                    let summary = format!(
                        "Found phish #{} targeting {}",
                        params.phish_id,
                        entry.target.as_deref().unwrap_or("unknown")
                    );
                    serde_json::json!({
                        "found": true,
                        "entry": entry,
                        "summary": summary,
                    })
                }
                None => serde_json::json!({
                    "found": false,
                    "phish_id": params.phish_id,
                    "summary": format!("Phish #{} not found in the current database snapshot", params.phish_id),
                }),
            }
        });

        super::into_tool_response("get_phish_details", outcome)
    }
}

/// 按日期区间检索的工具参数
#[rust_mcp_sdk::macros::mcp_tool(
    name = "search_phish_by_date",
    title = "按提交日期检索",
    description = "按提交日期区间检索钓鱼记录。日期格式必须是 YYYY-MM-DD，区间两端的整天都包含在内。",
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
pub struct SearchPhishByDateTool {
    /// 开始日期
    #[json_schema(title = "开始日期", description = "开始日期，格式 YYYY-MM-DD")]
    pub start_date: String,

    /// 结束日期
    #[json_schema(title = "结束日期", description = "结束日期，格式 YYYY-MM-DD（整天包含在内）")]
    pub end_date: String,

    /// 返回条数
    #[json_schema(
        title = "条数",
        description = "返回的最大条数，范围 1-500",
        minimum = 1,
        maximum = 500,
        default = 100
    )]
    pub limit: Option<u32>,
}

pub struct SearchPhishByDateToolImpl {
    service: Arc<PhishTankService>,
}

impl SearchPhishByDateToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<PhishTankService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchPhishByDateToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        SearchPhishByDateTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: SearchPhishByDateTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments(
                "search_phish_by_date",
                Some(format!("参数解析失败: {e}")),
            )
        })?;

        // 日期校验先于任何网络访问
        let (start, end) = match parse_date_range(&params.start_date, &params.end_date) {
            Ok(range) => range,
            Err(Error::InvalidArgument(message)) => {
                return Err(CallToolError::invalid_arguments(
                    "search_phish_by_date",
                    Some(message),
                ));
            }
            Err(err) => return Ok(super::error_result(&err)),
        };

        let outcome = self.service.get_database().await.map(|snapshot| {
            let entries = search_by_date(&snapshot.entries, start, end, params.limit);
            let summary = format!(
                "Found {} entries submitted between {} and {}",
                entries.len(),
                params.start_date,
                params.end_date
            );
            serde_json::json!({
                "start_date": params.start_date,
                "end_date": params.end_date,
                "count": entries.len(),
                "entries": entries,
                "summary": summary,
            })
        });

        super::into_tool_response("search_phish_by_date", outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, submitted: &str, online: &str, verified: &str, target: Option<&str>) -> PhishEntry {
        PhishEntry {
            phish_id: id,
            url: format!("http://phish{id}.example/"),
            phish_detail_url: String::new(),
            submission_time: submitted.to_string(),
            verified: verified.to_string(),
            verification_time: None,
            online: online.to_string(),
            target: target.map(str::to_string),
            details: None,
        }
    }

    fn sample_entries() -> Vec<PhishEntry> {
        vec![
            entry(1, "2024-01-01T08:00:00+00:00", "yes", "yes", Some("PayPal")),
            entry(2, "2024-01-03T08:00:00+00:00", "no", "yes", Some("Apple")),
            entry(3, "2024-01-02T08:00:00+00:00", "yes", "no", Some("PayPal Holdings")),
            entry(4, "2024-01-04T08:00:00+00:00", "yes", "yes", None),
        ]
    }

    #[test]
    fn test_recent_excludes_offline_by_default() {
        let entries = sample_entries();
        let recent = recent_entries(&entries, None, false);
        assert_eq!(
            recent.iter().map(|e| e.phish_id).collect::<Vec<_>>(),
            vec![4, 3, 1]
        );

        let with_offline = recent_entries(&entries, None, true);
        assert_eq!(
            with_offline.iter().map(|e| e.phish_id).collect::<Vec<_>>(),
            vec![4, 2, 3, 1]
        );
    }

    #[test]
    fn test_recent_limit_clamped() {
        let entries = sample_entries();
        // 0 被钳制到 1，而不是拒绝
        assert_eq!(recent_entries(&entries, Some(0), true).len(), 1);
        assert_eq!(recent_entries(&entries, Some(2), true).len(), 2);
        // 超出上限按上限处理
        assert_eq!(recent_entries(&entries, Some(100_000), true).len(), 4);
    }

    #[test]
    fn test_search_by_target_case_insensitive_substring() {
        let entries = sample_entries();

        let matched = search_by_target(&entries, "paypal", None, false);
        assert_eq!(
            matched.iter().map(|e| e.phish_id).collect::<Vec<_>>(),
            vec![3, 1]
        );

        // verified_only 默认行为：只保留已核实条目
        let verified = search_by_target(&entries, "paypal", None, true);
        assert_eq!(verified.iter().map(|e| e.phish_id).collect::<Vec<_>>(), vec![1]);

        // 没有 target 的条目永不匹配
        let none = search_by_target(&entries, "unknown", None, false);
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_by_id() {
        let entries = sample_entries();
        assert_eq!(find_by_id(&entries, 3).map(|e| e.phish_id), Some(3));
        assert!(find_by_id(&entries, 999).is_none());
    }

    #[test]
    fn test_parse_date_range_strict_format() {
        // 缺零填充的日期不符合格式，直接拒绝
        assert!(matches!(
            parse_date_range("2024-1-1", "2024-01-02"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            parse_date_range("2024-01-01", "02-01-2024"),
            Err(Error::InvalidArgument(_))
        ));
        // 非法历法日期同样拒绝
        assert!(matches!(
            parse_date_range("2024-02-30", "2024-03-01"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_date_range_start_after_end() {
        assert!(matches!(
            parse_date_range("2024-02-01", "2024-01-01"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_single_day_range_covers_whole_day() {
        let (start, end) = parse_date_range("2024-01-03", "2024-01-03").expect("valid range");
        let entries = sample_entries();
        let matched = search_by_date(&entries, start, end, None);
        assert_eq!(matched.iter().map(|e| e.phish_id).collect::<Vec<_>>(), vec![2]);

        // 23:59:59.999 之前的提交都在区间内
        let late = entry(9, "2024-01-03T23:59:59+00:00", "yes", "yes", None);
        let matched = search_by_date(&[late], start, end, None);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_search_by_date_inclusive_bounds() {
        let (start, end) = parse_date_range("2024-01-01", "2024-01-03").expect("valid range");
        let entries = sample_entries();
        let matched = search_by_date(&entries, start, end, None);
        assert_eq!(
            matched.iter().map(|e| e.phish_id).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
    }
}
