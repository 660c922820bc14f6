// ==========================================
// 样品生产跟踪系统 - 跟踪门面 API
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 入口与观察面
// 红线: 加载失败以消息呈现,不 panic;
//       三路加载作业并发取数,汇合后才更新任何对外状态
// ==========================================
// 职责: 展示层唯一入口（刷新/筛选/批注/标志 + 观察面）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::CoreConfig;
use crate::domain::types::{ConnectionState, FlagKind, LoadPhase};
use crate::domain::{Counterparty, FilterState, Sample};
use crate::engine::events::{EventBus, TrackerEvent};
use crate::engine::flag_engine::{FlagEngine, ReconcileSummary};
use crate::engine::SampleAggregator;
use crate::repository::{RepositoryResult, SampleRepository};
use crate::store::{Observable, SampleStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinError;
use tracing::{info, instrument, warn};

// ==========================================
// SampleTrackerApi - 展示层门面
// ==========================================
pub struct SampleTrackerApi {
    repo: Arc<dyn SampleRepository>,
    aggregator: Arc<SampleAggregator>,
    flag_engine: Arc<FlagEngine>,
    store: SampleStore,
    config: CoreConfig,

    // ===== 观察面 =====
    filter: Arc<Observable<FilterState>>,
    filtered: Arc<Observable<Arc<Vec<Sample>>>>,
    load_phase: Arc<Observable<LoadPhase>>,
    connection: Arc<Observable<ConnectionState>>,
    counterparties: Arc<Observable<Arc<Vec<Counterparty>>>>,
    events: EventBus,
}

impl SampleTrackerApi {
    /// 创建跟踪门面
    ///
    /// # 参数
    /// - repo: 数据访问边界
    /// - aggregator/flag_engine: 聚合与标志引擎
    /// - store: 样品清单存储
    /// - filter/filtered/load_phase/connection/counterparties: 共享观察值
    /// - events: 广播事件总线
    /// - config: 核心配置
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn SampleRepository>,
        aggregator: Arc<SampleAggregator>,
        flag_engine: Arc<FlagEngine>,
        store: SampleStore,
        filter: Arc<Observable<FilterState>>,
        filtered: Arc<Observable<Arc<Vec<Sample>>>>,
        load_phase: Arc<Observable<LoadPhase>>,
        connection: Arc<Observable<ConnectionState>>,
        counterparties: Arc<Observable<Arc<Vec<Counterparty>>>>,
        events: EventBus,
        config: CoreConfig,
    ) -> Self {
        Self {
            repo,
            aggregator,
            flag_engine,
            store,
            config,
            filter,
            filtered,
            load_phase,
            connection,
            counterparties,
            events,
        }
    }

    // ==========================================
    // 加载周期
    // ==========================================

    /// 执行一轮加载周期
    ///
    /// # 说明
    /// - 发布 Loading 后并发派发三路阻塞作业:
    ///   批注调和 / 样品聚合 / 客户清单
    /// - 三路全部汇合后才更新对外状态（汇合栅栏,非流水线）
    /// - 作业独立成败: 失败方的消息并入 Failed 相位,
    ///   成功方的结果照常生效;仅当聚合成功才替换清单
    /// - 新一轮刷新清除上一轮失败消息
    #[instrument(skip(self))]
    pub async fn refresh(&self) {
        self.load_phase.set(LoadPhase::Loading);
        self.events.publish(TrackerEvent::LoadStarted);

        let months_back = self.config.fetch_months_back;
        let sample_only = self.config.sample_only;

        // ===== 作业 1: 批注调和 =====
        let repo = Arc::clone(&self.repo);
        let flag_engine = Arc::clone(&self.flag_engine);
        let reconcile_job = tokio::task::spawn_blocking(move || -> RepositoryResult<ReconcileSummary> {
            let orders = repo.fetch_orders(months_back, sample_only)?;
            flag_engine.reconcile_all(&orders)
        });

        // ===== 作业 2: 样品聚合 =====
        let repo = Arc::clone(&self.repo);
        let aggregator = Arc::clone(&self.aggregator);
        let aggregate_job = tokio::task::spawn_blocking(move || -> RepositoryResult<Vec<Sample>> {
            let orders = repo.fetch_orders(months_back, sample_only)?;
            let mut samples = Vec::with_capacity(orders.len());
            for order in &orders {
                let print_jobs = repo.fetch_print_jobs(order.numer)?;
                let cutter_jobs = repo.fetch_cutter_jobs(order.numer)?;
                let lamination_jobs = repo.fetch_lamination_jobs(order.numer)?;
                let annotation = repo.fetch_annotation(order.numer)?;
                samples.push(aggregator.build_sample(
                    order,
                    &print_jobs,
                    &cutter_jobs,
                    &lamination_jobs,
                    annotation.as_ref(),
                ));
            }
            Ok(samples)
        });

        // ===== 作业 3: 客户清单 =====
        let repo = Arc::clone(&self.repo);
        let counterparty_job = tokio::task::spawn_blocking(move || -> RepositoryResult<Vec<Counterparty>> {
            let orders = repo.fetch_orders(months_back, sample_only)?;
            let mut ids: Vec<i64> = orders.iter().filter_map(|o| o.kontrahent_id).collect();
            ids.sort_unstable();
            ids.dedup();
            repo.fetch_counterparties(&ids)
        });

        // ===== 汇合栅栏 =====
        let (reconcile_result, aggregate_result, counterparty_result) =
            tokio::join!(reconcile_job, aggregate_job, counterparty_job);

        let mut failures: Vec<String> = Vec::new();

        match Self::flatten_job(reconcile_result, "批注调和") {
            Ok(summary) => {
                info!(
                    created = summary.created,
                    updated = summary.updated,
                    unchanged = summary.unchanged,
                    "调和作业完成"
                );
            }
            Err(message) => failures.push(message),
        }

        let counterparties = match Self::flatten_job(counterparty_result, "客户清单") {
            Ok(list) => {
                self.counterparties.set(Arc::new(list.clone()));
                Some(list)
            }
            Err(message) => {
                failures.push(message);
                None
            }
        };

        match Self::flatten_job(aggregate_result, "样品聚合") {
            Ok(mut samples) => {
                // 以客户名富化后整体替换清单（触发筛选重算）
                if let Some(list) = &counterparties {
                    let names: HashMap<i64, String> =
                        list.iter().map(|c| (c.id, c.name.clone())).collect();
                    for sample in &mut samples {
                        sample.kontrahent_name =
                            sample.kontrahent_id.and_then(|id| names.get(&id).cloned());
                    }
                }
                let count = samples.len();
                self.store.replace_all(samples);
                if failures.is_empty() {
                    self.load_phase.set(LoadPhase::Loaded { count });
                    self.events.publish(TrackerEvent::LoadCompleted { count });
                }
            }
            Err(message) => failures.push(message),
        }

        if !failures.is_empty() {
            let message = failures.join("; ");
            warn!(message = %message, "加载周期部分失败");
            self.load_phase.set(LoadPhase::Failed {
                message: message.clone(),
            });
            self.events.publish(TrackerEvent::LoadFailed { message });
        }
    }

    /// 作业结果展平: 仓储失败与任务异常统一为消息
    fn flatten_job<T>(
        result: Result<RepositoryResult<T>, JoinError>,
        job: &str,
    ) -> Result<T, String> {
        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("{}失败: {}", job, e)),
            Err(e) => Err(format!("{}任务异常终止: {}", job, e)),
        }
    }

    // ==========================================
    // 筛选
    // ==========================================

    /// 更新筛选条件（喂入去抖调度器）
    ///
    /// # 参数
    /// - filter: 新的筛选条件
    ///
    /// # 返回
    /// - Err(ApiError::InvalidInput): 日期区间颠倒
    pub fn update_filter(&self, filter: FilterState) -> ApiResult<()> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(ApiError::InvalidInput(format!(
                    "日期区间颠倒: {} > {}",
                    from, to
                )));
            }
        }
        self.filter.set(filter);
        Ok(())
    }

    // ==========================================
    // 乐观变更入口
    // ==========================================

    /// 保存指定订单的四段备注（乐观变更）
    ///
    /// # 参数
    /// - numer: 订单号
    /// - uwagi_*: 四段备注的新值（None 即清空该段）
    ///
    /// # 说明
    /// 本地立即生效,落库在后台;失败自动回滚并广播 MutationFailed
    pub fn save_annotation_notes(
        &self,
        numer: i64,
        uwagi_zamowienie: Option<String>,
        uwagi_druk: Option<String>,
        uwagi_laminacja: Option<String>,
        uwagi_przecinarka: Option<String>,
    ) -> ApiResult<()> {
        if numer <= 0 {
            return Err(ApiError::InvalidInput(format!("订单号无效: {}", numer)));
        }
        self.store.mutate(numer, move |sample| {
            sample.uwagi_zamowienie = uwagi_zamowienie;
            sample.uwagi_druk = uwagi_druk;
            sample.uwagi_laminacja = uwagi_laminacja;
            sample.uwagi_przecinarka = uwagi_przecinarka;
        });
        Ok(())
    }

    /// 设置指定订单的人工标志（乐观变更）
    ///
    /// # 参数
    /// - numer: 订单号
    /// - kind: Send / Tested（produce 无公开入口）
    /// - value: 新值
    pub fn set_manual_flag(&self, numer: i64, kind: FlagKind, value: bool) -> ApiResult<()> {
        if numer <= 0 {
            return Err(ApiError::InvalidInput(format!("订单号无效: {}", numer)));
        }
        self.store.mutate(numer, move |sample| match kind {
            FlagKind::Send => sample.send = Some(value),
            FlagKind::Tested => sample.tested = Some(value),
        });
        Ok(())
    }

    // ==========================================
    // 观察面
    // ==========================================

    /// 当前筛选视图快照
    pub fn filtered_samples(&self) -> Arc<Vec<Sample>> {
        self.filtered.get()
    }

    /// 订阅筛选视图
    pub fn subscribe_filtered(&self) -> watch::Receiver<Arc<Vec<Sample>>> {
        self.filtered.subscribe()
    }

    /// 当前加载相位
    pub fn load_phase(&self) -> LoadPhase {
        self.load_phase.get()
    }

    /// 订阅加载相位
    pub fn subscribe_load_phase(&self) -> watch::Receiver<LoadPhase> {
        self.load_phase.subscribe()
    }

    /// 当前连接状态
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.get()
    }

    /// 订阅连接状态
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// 当前客户清单
    pub fn counterparties(&self) -> Arc<Vec<Counterparty>> {
        self.counterparties.get()
    }

    /// 订阅客户清单
    pub fn subscribe_counterparties(&self) -> watch::Receiver<Arc<Vec<Counterparty>>> {
        self.counterparties.subscribe()
    }

    /// 订阅广播事件流
    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// 当前筛选条件快照
    pub fn current_filter(&self) -> FilterState {
        self.filter.get()
    }
}
