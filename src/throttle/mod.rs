//! 请求节流模块
//!
//! PhishTank 对请求频率有上限（无 API key 时 10 次/分钟，
//! 有 key 时 100 次/分钟），超出会返回 HTTP 509。
//! 这里按固定最小间隔主动排队等待，而不是事后处理限流错误。

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// 无 API key 时的请求配额（次/分钟）
pub const ANONYMOUS_REQUESTS_PER_MINUTE: u32 = 10;

/// 配置 API key 后的请求配额（次/分钟）
pub const KEYED_REQUESTS_PER_MINUTE: u32 = 100;

/// 固定间隔请求节流器
///
/// 容量为 1 的漏桶：相邻两次放行的时间差始终不小于
/// `60000 / requests_per_minute` 毫秒。长时间空闲也不积累突发额度。
pub struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// 按每分钟请求数创建节流器
    #[must_use]
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            min_interval: Duration::from_millis(60_000 / u64::from(rpm)),
            last_request: Mutex::new(None),
        }
    }

    /// 根据是否配置 API key 选择限速档位
    #[must_use]
    pub fn for_api_key(api_key: Option<&str>) -> Self {
        if api_key.is_some() {
            Self::new(KEYED_REQUESTS_PER_MINUTE)
        } else {
            Self::new(ANONYMOUS_REQUESTS_PER_MINUTE)
        }
    }

    /// 最小请求间隔
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 等待轮到自己发起请求
    ///
    /// 距上次放行不足最小间隔时先睡够差值，然后记录当前时刻。
    /// 锁在等待期间一直持有，并发调用方按先来先到依次放行。
    pub async fn await_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
