// ==========================================
// 样品生产跟踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级共享状态和 API 实例
// 红线: 构造注入,无单例,无全局可变状态
// ==========================================

use std::sync::Arc;

use crate::api::SampleTrackerApi;
use crate::app::monitor::ConnectionMonitor;
use crate::config::CoreConfig;
use crate::domain::types::{ConnectionState, LoadPhase};
use crate::domain::{Counterparty, FilterState, Sample};
use crate::engine::{EventBus, FilterEngine, FlagEngine, SampleAggregator, StatusResolver};
use crate::repository::SampleRepository;
use crate::store::{Observable, SampleStore};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 应用状态
///
/// 持有门面 API、共享组件与后台任务句柄
/// 后台任务经 watch 停机信号协作式退出
pub struct AppState {
    /// 跟踪门面 API
    pub tracker_api: Arc<SampleTrackerApi>,

    /// 状态解析注册表（运行期可扩展）
    pub resolver: Arc<StatusResolver>,

    /// 样品清单存储
    pub store: SampleStore,

    /// 广播事件总线
    pub events: EventBus,

    shutdown_tx: watch::Sender<bool>,
    filter_task: JoinHandle<()>,
    monitor_task: JoinHandle<()>,
}

impl AppState {
    /// 以默认配置装配全部组件
    ///
    /// # 参数
    /// - repo: 数据访问边界实现
    ///
    /// # 说明
    /// 须在 tokio 运行时内调用（装配即启动后台任务）
    pub fn new(repo: Arc<dyn SampleRepository>) -> Self {
        Self::with_config(repo, CoreConfig::default())
    }

    /// 以指定配置装配全部组件
    pub fn with_config(repo: Arc<dyn SampleRepository>, config: CoreConfig) -> Self {
        tracing::info!(
            debounce_ms = config.debounce_ms,
            monitor_interval_secs = config.monitor_interval_secs,
            fetch_months_back = config.fetch_months_back,
            "初始化 AppState"
        );

        // ==========================================
        // 初始化共享基础设施
        // ==========================================
        let events = EventBus::new(config.event_capacity);
        let resolver = Arc::new(StatusResolver::new());
        let store = SampleStore::new(Arc::clone(&repo), events.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // ==========================================
        // 初始化观察面
        // ==========================================
        let filter = Arc::new(Observable::new(FilterState::default()));
        let filtered: Arc<Observable<Arc<Vec<Sample>>>> =
            Arc::new(Observable::new(Arc::new(Vec::new())));
        let load_phase = Arc::new(Observable::new(LoadPhase::Idle));
        let connection = Arc::new(Observable::new(ConnectionState::Unknown));
        let counterparties: Arc<Observable<Arc<Vec<Counterparty>>>> =
            Arc::new(Observable::new(Arc::new(Vec::new())));

        // ==========================================
        // 初始化引擎层
        // ==========================================
        let aggregator = Arc::new(SampleAggregator::new(Arc::clone(&resolver)));
        let flag_engine = Arc::new(FlagEngine::new(Arc::clone(&repo)));

        // 筛选调度器（后台任务）
        let filter_engine = FilterEngine::new(
            store.clone(),
            Arc::clone(&filter),
            Arc::clone(&filtered),
            config.debounce(),
        );
        let filter_task = filter_engine.spawn(shutdown_rx.clone());

        // 连接监视器（后台任务）
        let monitor = ConnectionMonitor::new(
            Arc::clone(&repo),
            Arc::clone(&connection),
            events.clone(),
            config.monitor_interval(),
        );
        let monitor_task = monitor.spawn(shutdown_rx);

        // ==========================================
        // 初始化API层
        // ==========================================
        let tracker_api = Arc::new(SampleTrackerApi::new(
            repo,
            aggregator,
            flag_engine,
            store.clone(),
            filter,
            filtered,
            load_phase,
            connection,
            counterparties,
            events.clone(),
            config,
        ));

        tracing::info!("AppState 初始化完成");

        Self {
            tracker_api,
            resolver,
            store,
            events,
            shutdown_tx,
            filter_task,
            monitor_task,
        }
    }

    /// 发出停机信号（不等待任务退出）
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// 发出停机信号并等待后台任务退出
    pub async fn shutdown_and_wait(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = futures::future::join_all([self.filter_task, self.monitor_task]).await;
        tracing::info!("后台任务全部退出");
    }
}
