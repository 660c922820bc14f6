// ==========================================
// 样品生产跟踪系统 - 跟踪事件流
// ==========================================
// 职责: 定义核心层对外广播的事件类型与事件总线
// 说明: 展示层订阅事件流获知加载/变更/连接转换,
//       核心层不感知订阅方的存在
// ==========================================

use crate::domain::types::ConnectionState;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

// ==========================================
// 跟踪事件类型
// ==========================================

/// 核心层广播事件
///
/// 覆盖加载生命周期、乐观变更失败与连接状态转换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "event")]
pub enum TrackerEvent {
    /// 加载周期开始
    LoadStarted,
    /// 加载周期完成
    LoadCompleted { count: usize },
    /// 加载周期失败
    LoadFailed { message: String },
    /// 乐观变更持久化失败（已回滚）
    MutationFailed { numer: i64, message: String },
    /// 连接状态转换
    ConnectionChanged { state: ConnectionState },
}

impl TrackerEvent {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            TrackerEvent::LoadStarted => "LoadStarted",
            TrackerEvent::LoadCompleted { .. } => "LoadCompleted",
            TrackerEvent::LoadFailed { .. } => "LoadFailed",
            TrackerEvent::MutationFailed { .. } => "MutationFailed",
            TrackerEvent::ConnectionChanged { .. } => "ConnectionChanged",
        }
    }
}

// ==========================================
// EventBus - 广播事件总线
// ==========================================

/// 多订阅者事件总线
///
/// 基于 tokio broadcast 通道;无订阅者时发布为空操作,
/// 慢订阅者滞后只影响自身（收到 Lagged 后继续）
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    /// 创建指定容量的事件总线
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }

    /// 发布事件
    ///
    /// # 说明
    /// 无订阅者时 send 返回 Err,按空操作处理
    pub fn publish(&self, event: TrackerEvent) {
        debug!(event = event.as_str(), "发布跟踪事件");
        let _ = self.sender.send(event);
    }

    /// 当前订阅者数量
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
