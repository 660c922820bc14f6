// ==========================================
// 样品生产跟踪系统 - 筛选调度器
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 去抖与取消语义
// 红线: 求值不持锁;迟到的过期结果静默丢弃（后提交者胜）
// ==========================================
// 触发源: 筛选条件变更（去抖,窗口内合并,以最终态求值）
//         清单修订变更（不去抖,立即重算）
// 取消: 每次触发递增代号,求值完成时代号不相符则不发布
// ==========================================

use crate::domain::{FilterState, Sample};
use crate::engine::filter_core::FilterCore;
use crate::store::{Observable, SampleStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

// ==========================================
// FilterEngine - 去抖调度 + 后台求值
// ==========================================
pub struct FilterEngine {
    store: SampleStore,
    filter: Arc<Observable<FilterState>>,
    filtered: Arc<Observable<Arc<Vec<Sample>>>>,
    generation: Arc<AtomicU64>,
    debounce: Duration,
}

impl FilterEngine {
    /// 创建筛选调度器
    ///
    /// # 参数
    /// - store: 样品清单存储
    /// - filter: 筛选条件观察值（入口层写入）
    /// - filtered: 筛选视图观察值（本调度器独占写入）
    /// - debounce: 去抖窗口
    pub fn new(
        store: SampleStore,
        filter: Arc<Observable<FilterState>>,
        filtered: Arc<Observable<Arc<Vec<Sample>>>>,
        debounce: Duration,
    ) -> Self {
        Self {
            store,
            filter,
            filtered,
            generation: Arc::new(AtomicU64::new(0)),
            debounce,
        }
    }

    /// 启动调度循环
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut filter_rx = self.filter.subscribe();
        let mut revision_rx = self.store.subscribe_revision();
        info!(debounce_ms = self.debounce.as_millis() as u64, "筛选调度器启动");

        // 启动即求值一轮,保证视图与清单一致
        self.trigger_recompute();

        loop {
            tokio::select! {
                changed = filter_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if !self.debounce_window(&mut filter_rx, &mut revision_rx, &mut shutdown).await {
                        break;
                    }
                    self.trigger_recompute();
                }
                changed = revision_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // 清单替换不去抖
                    self.trigger_recompute();
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("筛选调度器退出");
    }

    /// 去抖窗口: 窗口内的条件变更重置窗口,合并为一次求值
    ///
    /// # 返回
    /// - true: 窗口期满,应以最终条件求值
    /// - false: 收到停机信号
    async fn debounce_window(
        &self,
        filter_rx: &mut watch::Receiver<FilterState>,
        revision_rx: &mut watch::Receiver<u64>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.debounce) => return true,
                changed = filter_rx.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                    // 新变更重置窗口
                }
                changed = revision_rx.changed() => {
                    if changed.is_ok() {
                        // 窗口内清单替换照常立即重算,窗口继续
                        self.trigger_recompute();
                    }
                }
                _ = shutdown.changed() => return false,
            }
        }
    }

    /// 递增代号并派发一次后台求值
    fn trigger_recompute(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.store.snapshot();
        let filter = self.filter.get();
        let filtered = Arc::clone(&self.filtered);
        let counter = Arc::clone(&self.generation);

        tokio::spawn(async move {
            let result = FilterCore::apply(&snapshot, &filter);
            let count = result.len();
            // 代号核对与发布在视图通道锁内一体执行,过期结果不落地不通知
            let published = filtered.set_if(Arc::new(result), || {
                counter.load(Ordering::SeqCst) == generation
            });
            if published {
                debug!(generation = generation, count = count, "筛选视图发布");
            } else {
                debug!(generation = generation, "筛选结果已过期,丢弃");
            }
        });
    }
}
