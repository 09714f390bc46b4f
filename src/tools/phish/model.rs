//! PhishTank 数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_verified() -> String {
    "unknown".to_string()
}

fn default_online() -> String {
    "no".to_string()
}

/// 一条钓鱼网站提交记录
///
/// 记录由上游整体下发、整体换代，本服务只读不改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhishEntry {
    /// 上游分配的唯一编号
    pub phish_id: u64,

    /// 被举报的 URL
    pub url: String,

    /// 上游详情页 URL
    #[serde(default)]
    pub phish_detail_url: String,

    /// 提交时间（上游下发的 RFC 3339 字符串）
    pub submission_time: String,

    /// 核实状态：yes / no / unknown
    #[serde(default = "default_verified")]
    pub verified: String,

    /// 核实时间
    #[serde(default)]
    pub verification_time: Option<String>,

    /// 在线状态：yes / no
    #[serde(default = "default_online")]
    pub online: String,

    /// 被仿冒的品牌（可能缺失）
    #[serde(default)]
    pub target: Option<String>,

    /// 网络信息（可能缺失）
    #[serde(default)]
    pub details: Option<Vec<NetworkDetail>>,
}

impl PhishEntry {
    /// 解析提交时间，无法解析时返回 `None`
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.submission_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// 是否已核实为钓鱼网站
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.verified == "yes"
    }

    /// 是否仍然在线
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online == "yes"
    }
}

/// 网络信息记录
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkDetail {
    /// IP 地址
    #[serde(default)]
    pub ip_address: Option<String>,

    /// CIDR 网段
    #[serde(default)]
    pub cidr_block: Option<String>,

    /// 通告网络
    #[serde(default)]
    pub announcing_network: Option<String>,

    /// 区域注册机构
    #[serde(default)]
    pub rir: Option<String>,

    /// 信息采集时间
    #[serde(default)]
    pub detail_time: Option<String>,
}

/// 数据库快照
///
/// 完整的钓鱼记录列表加一个总数字段。快照一旦存入缓存就不再修改，
/// 过期后整体替换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    /// 记录总数（等于列表长度）
    pub total_count: usize,

    /// 全部记录
    pub entries: Vec<PhishEntry>,
}

impl DatabaseSnapshot {
    /// 由记录列表构建快照
    #[must_use]
    pub fn new(entries: Vec<PhishEntry>) -> Self {
        Self {
            total_count: entries.len(),
            entries,
        }
    }
}

/// 单条 URL 查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCheckResult {
    /// 被查询的 URL（原样保留）
    pub url: String,

    /// 是否收录在钓鱼数据库中
    pub in_database: bool,

    /// 记录编号（收录时存在）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phish_id: Option<u64>,

    /// 上游详情页
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phish_detail_page: Option<String>,

    /// 是否已核实
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,

    /// 核实后是否判定有效（确为钓鱼）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,

    /// 提交时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,

    /// 上游限流信息（响应头缺失时整体省略）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,

    /// 是否来自缓存
    #[serde(default)]
    pub cached: bool,
}

impl UrlCheckResult {
    /// 一行人类可读的判定结论
    #[must_use]
    pub fn classification(&self) -> String {
        if !self.in_database {
            return format!("URL not found in PhishTank database: {}", self.url);
        }
        if self.verified == Some(true) && self.valid == Some(true) {
            return format!(
                "⚠️ WARNING: {} is a verified and valid phishing site!",
                self.url
            );
        }
        format!(
            "{} is in the PhishTank database but not verified as valid phishing",
            self.url
        )
    }
}

/// 上游限流遥测
///
/// 从响应头解析：`X-Request-Limit-Interval`、`X-Request-Limit`、
/// `X-Request-Count`。`remaining = limit - count`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// 配额窗口长度（秒）
    pub interval_seconds: i64,

    /// 窗口内配额上限
    pub limit: i64,

    /// 窗口内已用次数
    pub count: i64,

    /// 窗口内剩余次数
    pub remaining: i64,
}

impl RateLimitInfo {
    /// 从响应头解析限流信息，任一字段缺失或不可解析时返回 `None`
    #[must_use]
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        let interval_seconds = header_int(headers, "X-Request-Limit-Interval")?;
        let limit = header_int(headers, "X-Request-Limit")?;
        let count = header_int(headers, "X-Request-Count")?;

        Some(Self {
            interval_seconds,
            limit,
            count,
            remaining: limit - count,
        })
    }
}

/// 解析整数响应头，容忍 "300 Seconds" 这类带单位的取值
fn header_int(headers: &reqwest::header::HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn entry(verified: &str, valid_online: &str) -> PhishEntry {
        PhishEntry {
            phish_id: 1,
            url: "http://phish.example/login".to_string(),
            phish_detail_url: String::new(),
            submission_time: "2024-01-15T10:30:00+00:00".to_string(),
            verified: verified.to_string(),
            verification_time: None,
            online: valid_online.to_string(),
            target: None,
            details: None,
        }
    }

    #[test]
    fn test_submitted_at_parses_rfc3339() {
        let e = entry("yes", "yes");
        let ts = e.submitted_at().expect("should parse");
        assert_eq!(ts.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_submitted_at_invalid_is_none() {
        let mut e = entry("yes", "yes");
        e.submission_time = "yesterday".to_string();
        assert!(e.submitted_at().is_none());
    }

    #[test]
    fn test_snapshot_total_count_matches_len() {
        let snapshot = DatabaseSnapshot::new(vec![entry("yes", "yes"), entry("no", "no")]);
        assert_eq!(snapshot.total_count, 2);
        assert_eq!(snapshot.entries.len(), 2);
    }

    #[test]
    fn test_classification_lines() {
        let mut result = UrlCheckResult {
            url: "http://a.example/".to_string(),
            in_database: false,
            phish_id: None,
            phish_detail_page: None,
            verified: None,
            valid: None,
            submitted_at: None,
            rate_limit: None,
            cached: false,
        };
        assert!(result.classification().contains("not found"));

        result.in_database = true;
        result.verified = Some(true);
        result.valid = Some(true);
        assert!(result.classification().contains("WARNING"));

        result.valid = Some(false);
        assert!(result.classification().contains("not verified as valid"));
    }

    #[test]
    fn test_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Request-Limit-Interval",
            HeaderValue::from_static("300 Seconds"),
        );
        headers.insert("X-Request-Limit", HeaderValue::from_static("10"));
        headers.insert("X-Request-Count", HeaderValue::from_static("3"));

        let info = RateLimitInfo::from_headers(&headers).expect("should parse");
        assert_eq!(info.interval_seconds, 300);
        assert_eq!(info.limit, 10);
        assert_eq!(info.count, 3);
        assert_eq!(info.remaining, 7);
    }

    #[test]
    fn test_rate_limit_missing_headers_is_none() {
        let headers = HeaderMap::new();
        assert!(RateLimitInfo::from_headers(&headers).is_none());

        let mut partial = HeaderMap::new();
        partial.insert("X-Request-Limit", HeaderValue::from_static("10"));
        assert!(RateLimitInfo::from_headers(&partial).is_none());
    }

    #[test]
    fn test_entry_deserializes_with_missing_optionals() {
        let json = serde_json::json!({
            "phish_id": 42,
            "url": "http://phish.example/",
            "submission_time": "2024-01-01T00:00:00+00:00"
        });
        let e: PhishEntry = serde_json::from_value(json).expect("should deserialize");
        assert_eq!(e.verified, "unknown");
        assert_eq!(e.online, "no");
        assert!(e.target.is_none());
        assert!(e.details.is_none());
    }
}
