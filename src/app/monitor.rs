// ==========================================
// 样品生产跟踪系统 - 连接监视器
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 连接探测
// 红线: 状态整体替换,单次原子赋值;停机协作式,不等满周期
// ==========================================

use crate::domain::types::ConnectionState;
use crate::engine::events::{EventBus, TrackerEvent};
use crate::repository::SampleRepository;
use crate::store::Observable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

// ==========================================
// ConnectionMonitor - 周期连通性探测
// ==========================================
// 启动即探测一次,之后按周期循环;探测在阻塞线程池执行
pub struct ConnectionMonitor {
    repo: Arc<dyn SampleRepository>,
    connection: Arc<Observable<ConnectionState>>,
    events: EventBus,
    interval: Duration,
}

impl ConnectionMonitor {
    /// 创建连接监视器
    ///
    /// # 参数
    /// - repo: 数据访问边界（probe 为探测入口）
    /// - connection: 连接状态观察值
    /// - events: 广播事件总线（仅状态转换时发事件）
    /// - interval: 探测周期
    pub fn new(
        repo: Arc<dyn SampleRepository>,
        connection: Arc<Observable<ConnectionState>>,
        events: EventBus,
        interval: Duration,
    ) -> Self {
        Self {
            repo,
            connection,
            events,
            interval,
        }
    }

    /// 启动探测循环
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "连接监视器启动");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.probe_once().await,
                _ = shutdown.changed() => break,
            }
        }
        info!("连接监视器退出");
    }

    /// 单次探测并整体替换连接状态
    async fn probe_once(&self) {
        let repo = Arc::clone(&self.repo);
        let result = tokio::task::spawn_blocking(move || repo.probe()).await;

        let new_state = match result {
            Ok(Ok(())) => ConnectionState::Online,
            Ok(Err(e)) => {
                warn!(error = %e, "连通性探测失败");
                ConnectionState::Offline
            }
            Err(e) => {
                warn!(error = %e, "探测任务异常终止");
                ConnectionState::Offline
            }
        };

        let old_state = self.connection.get();
        self.connection.set(new_state);

        if old_state != new_state {
            info!(from = %old_state, to = %new_state, "连接状态转换");
            self.events
                .publish(TrackerEvent::ConnectionChanged { state: new_state });
        } else {
            debug!(state = %new_state, "连接状态不变");
        }
    }
}
