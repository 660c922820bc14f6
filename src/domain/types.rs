// ==========================================
// 样品生产跟踪系统 - 领域类型定义
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 状态码体系
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 状态码 (Status Codes)
// ==========================================
// 红线: 状态码是开放集合,种子映射固定,运行期可扩展
// 种子映射见 engine::status_resolver
pub mod status_codes {
    /// 已完成
    pub const COMPLETED: i32 = 0;
    /// 生产中
    pub const IN_PROGRESS: i32 = 1;
    /// 已计划
    pub const PLANNED: i32 = 2;
    /// 已暂停
    pub const PAUSED: i32 = 3;
    /// 已取消
    pub const CANCELLED: i32 = 4;
    /// 待审核
    pub const PENDING_REVIEW: i32 = 5;
}

// ==========================================
// 手工标志种类 (Flag Kind)
// ==========================================
// 红线: 仅 send/tested 可由用户设置, produce 为派生缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagKind {
    Send,   // 已寄送
    Tested, // 已测试
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKind::Send => write!(f, "SEND"),
            FlagKind::Tested => write!(f, "TESTED"),
        }
    }
}

// ==========================================
// 标志筛选条件 (Flag Criterion)
// ==========================================
// 三态条件: 不限 / 是 / 否
// 说明: 标志本身是三态的 (未设置/false/true);
//       Yes 仅匹配 true, No 匹配 "尚未完成" (false 或未设置)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagCriterion {
    #[default]
    Any, // 不限
    Yes, // 已完成
    No,  // 尚未完成
}

impl FlagCriterion {
    /// 判定标志值是否满足条件
    pub fn matches(&self, flag: Option<bool>) -> bool {
        match self {
            FlagCriterion::Any => true,
            FlagCriterion::Yes => flag == Some(true),
            FlagCriterion::No => flag != Some(true),
        }
    }

    /// 是否为非限制条件
    pub fn is_any(&self) -> bool {
        matches!(self, FlagCriterion::Any)
    }
}

impl fmt::Display for FlagCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagCriterion::Any => write!(f, "ANY"),
            FlagCriterion::Yes => write!(f, "YES"),
            FlagCriterion::No => write!(f, "NO"),
        }
    }
}

// ==========================================
// 连接状态 (Connection State)
// ==========================================
// 由 ConnectionMonitor 周期探测并整体替换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Unknown, // 尚未探测
    Online,  // 连接正常
    Offline, // 连接失败
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Unknown => write!(f, "UNKNOWN"),
            ConnectionState::Online => write!(f, "ONLINE"),
            ConnectionState::Offline => write!(f, "OFFLINE"),
        }
    }
}

// ==========================================
// 加载阶段 (Load Phase)
// ==========================================
// 展示层通过 Observable 订阅加载进度与错误消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "phase")]
pub enum LoadPhase {
    /// 空闲（尚未加载）
    Idle,
    /// 加载中
    Loading,
    /// 加载完成
    Loaded { count: usize },
    /// 加载失败（消息在下次显式刷新时清除）
    Failed { message: String },
}

impl LoadPhase {
    /// 是否处于加载中
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadPhase::Loading)
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPhase::Idle => write!(f, "IDLE"),
            LoadPhase::Loading => write!(f, "LOADING"),
            LoadPhase::Loaded { count } => write!(f, "LOADED({})", count),
            LoadPhase::Failed { message } => write!(f, "FAILED({})", message),
        }
    }
}
