// ==========================================
// 样品生产跟踪系统 - 配置层
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 运行参数
// ==========================================
// 职责: 核心运行参数,支持环境变量覆写与 JSON 快照
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

// ==========================================
// 环境变量键常量
// ==========================================
pub mod env_keys {
    pub const DEBOUNCE_MS: &str = "SAMPLE_TRACKING_DEBOUNCE_MS";
    pub const MONITOR_INTERVAL_SECS: &str = "SAMPLE_TRACKING_MONITOR_INTERVAL_SECS";
    pub const FETCH_MONTHS_BACK: &str = "SAMPLE_TRACKING_FETCH_MONTHS_BACK";
    pub const SAMPLE_ONLY: &str = "SAMPLE_TRACKING_SAMPLE_ONLY";
    pub const EVENT_CAPACITY: &str = "SAMPLE_TRACKING_EVENT_CAPACITY";
}

// ==========================================
// CoreConfig - 核心运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// 筛选去抖窗口（毫秒）
    pub debounce_ms: u64,
    /// 连接探测周期（秒）
    pub monitor_interval_secs: u64,
    /// 订单取数窗口（月）
    pub fetch_months_back: u32,
    /// 仅取样品单
    pub sample_only: bool,
    /// 事件通道容量
    pub event_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            monitor_interval_secs: 300,
            fetch_months_back: 6,
            sample_only: true,
            event_capacity: 100,
        }
    }
}

impl CoreConfig {
    /// 以环境变量覆写默认值
    ///
    /// # 说明
    /// 变量缺失或不可解析时保留默认值并告警
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debounce_ms: read_env(env_keys::DEBOUNCE_MS, defaults.debounce_ms),
            monitor_interval_secs: read_env(
                env_keys::MONITOR_INTERVAL_SECS,
                defaults.monitor_interval_secs,
            ),
            fetch_months_back: read_env(env_keys::FETCH_MONTHS_BACK, defaults.fetch_months_back),
            sample_only: read_env(env_keys::SAMPLE_ONLY, defaults.sample_only),
            event_capacity: read_env(env_keys::EVENT_CAPACITY, defaults.event_capacity),
        }
    }

    /// 导出 JSON 快照
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 快照恢复
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// 去抖窗口时长
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// 连接探测周期时长
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs)
    }
}

/// 读取并解析单个环境变量,失败保留默认值
fn read_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = key, raw = %raw, "环境变量不可解析,保留默认值");
                default
            }
        },
        Err(_) => default,
    }
}
