// ==========================================
// 样品生产跟踪系统 - 样品清单存储
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 乐观变更协议
// 红线: 清单快照不可变,任何变更整体替换;
//       本地先行生效,落库失败回滚到变更前条目并广播失败事件
// ==========================================
// 并发策略: 同键变更串行排队（每订单一把异步锁,
//           前一笔落库了结后下一笔才生效）,异键完全并行
// 键锁回收: 随清单整体替换回收闲置条目,在途持有者不回收
// ==========================================

use crate::domain::{Annotation, Sample};
use crate::engine::events::{EventBus, TrackerEvent};
use crate::repository::SampleRepository;
use crate::store::observable::Observable;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

// ==========================================
// SampleStore - 写时复制清单 + 乐观变更
// ==========================================
#[derive(Clone)]
pub struct SampleStore {
    samples: Arc<RwLock<Arc<Vec<Sample>>>>,
    revision: Arc<Observable<u64>>,
    key_locks: Arc<StdMutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
    repo: Arc<dyn SampleRepository>,
    events: EventBus,
}

impl SampleStore {
    pub fn new(repo: Arc<dyn SampleRepository>, events: EventBus) -> Self {
        Self {
            samples: Arc::new(RwLock::new(Arc::new(Vec::new()))),
            revision: Arc::new(Observable::new(0)),
            key_locks: Arc::new(StdMutex::new(HashMap::new())),
            repo,
            events,
        }
    }

    /// 当前清单快照（零拷贝共享）
    pub fn snapshot(&self) -> Arc<Vec<Sample>> {
        let guard = self
            .samples
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// 按订单号查找当前条目
    pub fn find(&self, numer: i64) -> Option<Sample> {
        self.snapshot().iter().find(|s| s.numer == numer).cloned()
    }

    /// 当前清单修订号
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// 订阅清单修订变更（筛选调度器据此重算）
    pub fn subscribe_revision(&self) -> tokio::sync::watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// 整体替换清单（加载管线专用）
    ///
    /// # 说明
    /// 替换同时回收闲置键锁,锁表规模由此有界
    pub fn replace_all(&self, samples: Vec<Sample>) {
        let count = samples.len();
        let keys: HashSet<i64> = samples.iter().map(|s| s.numer).collect();
        {
            let mut guard = self
                .samples
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::new(samples);
        }
        self.prune_key_locks(&keys);
        self.revision.update(|v| *v += 1);
        info!(count = count, "样品清单整体替换");
    }

    /// 乐观变更指定订单的条目
    ///
    /// # 参数
    /// - numer: 订单号
    /// - update_fn: 本地变更函数（在条目副本上执行）
    ///
    /// # 说明
    /// - 本地变更对后续读者立即可见,落库在后台进行,调用方不被阻塞
    /// - 落库失败时条目回滚到变更前快照,并广播 MutationFailed
    /// - 订单号不存在时不改任何状态,仅广播 MutationFailed
    /// - 同键前一笔尚未了结时,本笔排队,待其了结后再生效
    /// - 须在 tokio 运行时内调用
    pub fn mutate<F>(&self, numer: i64, update_fn: F)
    where
        F: FnOnce(&mut Sample) + Send + 'static,
    {
        let key_lock = self.key_lock(numer);

        match Arc::clone(&key_lock).try_lock_owned() {
            Ok(guard) => {
                // 无竞争: 本地变更同步生效
                match self.apply_local(numer, update_fn) {
                    Some((before, annotation)) => {
                        self.spawn_persist(numer, before, annotation, guard);
                    }
                    None => self.report_missing(numer),
                }
            }
            Err(_) => {
                // 同键前笔在途: 排队等其了结
                let store = self.clone();
                tokio::spawn(async move {
                    let guard = key_lock.lock_owned().await;
                    match store.apply_local(numer, update_fn) {
                        Some((before, annotation)) => {
                            store.persist(numer, before, annotation, guard).await;
                        }
                        None => store.report_missing(numer),
                    }
                });
            }
        }
    }

    /// 取指定订单的变更锁
    fn key_lock(&self, numer: i64) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(numer).or_default())
    }

    /// 回收闲置键锁
    ///
    /// # 说明
    /// 仅回收强引用计数为 1（仅锁表自身持有）且键已不在清单中的条目;
    /// 在途或排队中的变更持有克隆,其条目保留,排队语义不受影响
    fn prune_key_locks(&self, keys: &HashSet<i64>) {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = locks.len();
        locks.retain(|numer, lock| keys.contains(numer) || Arc::strong_count(lock) > 1);
        let pruned = before - locks.len();
        if pruned > 0 {
            debug!(pruned = pruned, "回收闲置键锁");
        }
    }

    /// 本地变更: 写时复制替换整个清单
    ///
    /// # 返回
    /// - Some((变更前条目, 变更后批注投影)): 已生效
    /// - None: 订单号不存在
    fn apply_local<F>(&self, numer: i64, update_fn: F) -> Option<(Sample, Annotation)>
    where
        F: FnOnce(&mut Sample),
    {
        let result = {
            let mut guard = self
                .samples
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let position = guard.iter().position(|s| s.numer == numer)?;
            let mut new_list: Vec<Sample> = guard.as_ref().clone();
            let before = new_list[position].clone();
            update_fn(&mut new_list[position]);
            let annotation = new_list[position].annotation();
            *guard = Arc::new(new_list);
            Some((before, annotation))
        };
        if result.is_some() {
            self.revision.update(|v| *v += 1);
            debug!(numer = numer, "本地变更已生效");
        }
        result
    }

    /// 后台落库（无竞争路径）
    fn spawn_persist(
        &self,
        numer: i64,
        before: Sample,
        annotation: Annotation,
        guard: OwnedMutexGuard<()>,
    ) {
        let store = self.clone();
        tokio::spawn(async move {
            store.persist(numer, before, annotation, guard).await;
        });
    }

    /// 落库并了结: 成功即完成,失败回滚并广播
    async fn persist(
        &self,
        numer: i64,
        before: Sample,
        annotation: Annotation,
        guard: OwnedMutexGuard<()>,
    ) {
        let repo = Arc::clone(&self.repo);
        let result =
            tokio::task::spawn_blocking(move || repo.save_annotation(&annotation)).await;

        match result {
            Ok(Ok(())) => {
                debug!(numer = numer, "批注落库成功");
            }
            Ok(Err(e)) => {
                warn!(numer = numer, error = %e, "批注落库失败,回滚本地变更");
                self.rollback(numer, before);
                self.events.publish(TrackerEvent::MutationFailed {
                    numer,
                    message: e.to_string(),
                });
            }
            Err(e) => {
                warn!(numer = numer, error = %e, "落库任务异常终止,回滚本地变更");
                self.rollback(numer, before);
                self.events.publish(TrackerEvent::MutationFailed {
                    numer,
                    message: format!("落库任务异常终止: {}", e),
                });
            }
        }
        // guard 在此释放,同键下一笔解锁
        drop(guard);
    }

    /// 回滚: 条目复位为变更前快照
    ///
    /// # 说明
    /// 期间清单被整体替换（条目已不在）时回滚为空操作,
    /// 以下一轮加载为准
    fn rollback(&self, numer: i64, before: Sample) {
        let rolled_back = {
            let mut guard = self
                .samples
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            match guard.iter().position(|s| s.numer == numer) {
                Some(position) => {
                    let mut new_list: Vec<Sample> = guard.as_ref().clone();
                    new_list[position] = before;
                    *guard = Arc::new(new_list);
                    true
                }
                None => false,
            }
        };
        if rolled_back {
            self.revision.update(|v| *v += 1);
        }
    }

    fn report_missing(&self, numer: i64) {
        warn!(numer = numer, "变更目标不存在,清单未改动");
        self.events.publish(TrackerEvent::MutationFailed {
            numer,
            message: format!("订单 {} 不在当前清单中", numer),
        });
    }
}

// ==========================================
// 单元测试
// ==========================================
// 测试范围: 键锁随清单替换回收,在途持有者不回收
// （乐观变更/回滚/排队语义见集成测试 sample_store_test.rs）
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Counterparty, Order, StageRecord, StatusInfo};
    use crate::repository::RepositoryResult;

    struct NoopRepository;

    impl SampleRepository for NoopRepository {
        fn fetch_orders(&self, _: u32, _: bool) -> RepositoryResult<Vec<Order>> {
            Ok(Vec::new())
        }
        fn fetch_print_jobs(&self, _: i64) -> RepositoryResult<Vec<StageRecord>> {
            Ok(Vec::new())
        }
        fn fetch_cutter_jobs(&self, _: i64) -> RepositoryResult<Vec<StageRecord>> {
            Ok(Vec::new())
        }
        fn fetch_lamination_jobs(&self, _: i64) -> RepositoryResult<Vec<StageRecord>> {
            Ok(Vec::new())
        }
        fn fetch_annotation(&self, _: i64) -> RepositoryResult<Option<Annotation>> {
            Ok(None)
        }
        fn save_annotation(&self, _: &Annotation) -> RepositoryResult<()> {
            Ok(())
        }
        fn fetch_counterparties(&self, _: &[i64]) -> RepositoryResult<Vec<Counterparty>> {
            Ok(Vec::new())
        }
        fn probe(&self) -> RepositoryResult<()> {
            Ok(())
        }
    }

    fn create_test_sample(numer: i64) -> Sample {
        Sample {
            numer,
            oddzial: Some("W1".to_string()),
            rok: Some(2025),
            artykul: Some(format!("ART-{}", numer)),
            receptura: Some("RC-7".to_string()),
            folia_grubosc: None,
            plyta_grubosc: None,
            szerokosc: None,
            ilosc: Some(500.0),
            jednostka: Some("szt".to_string()),
            data_zamowienia: None,
            kontrahent_id: Some(42),
            kontrahent_name: None,
            order_status: StatusInfo {
                code: 1,
                label: "生产中".to_string(),
                ilosc: None,
                ilosc_wykonana: None,
                termin: None,
                data_wykonania: None,
            },
            print_status: None,
            cutter_status: None,
            lamination_statuses: Vec::new(),
            uwagi_zamowienie: None,
            uwagi_druk: None,
            uwagi_laminacja: None,
            uwagi_przecinarka: None,
            produce: Some(false),
            send: None,
            tested: None,
        }
    }

    fn create_test_store() -> SampleStore {
        SampleStore::new(Arc::new(NoopRepository), EventBus::new(16))
    }

    /// 轮询等待指定键的在途变更了结
    async fn wait_lock_idle(store: &SampleStore, numer: i64) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            let idle = {
                let locks = store.key_locks.lock().unwrap();
                locks.get(&numer).map_or(true, |l| Arc::strong_count(l) == 1)
            };
            if idle {
                return;
            }
            assert!(
                std::time::Instant::now() < deadline,
                "订单 {} 的落库未在期限内了结",
                numer
            );
            tokio::task::yield_now().await;
        }
    }

    fn lock_table_keys(store: &SampleStore) -> Vec<i64> {
        let locks = store.key_locks.lock().unwrap();
        let mut keys: Vec<i64> = locks.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    #[tokio::test]
    async fn test_replace_all_prunes_idle_key_locks() {
        let store = create_test_store();
        store.replace_all(vec![create_test_sample(1001), create_test_sample(2002)]);

        store.mutate(1001, |s| s.uwagi_druk = Some("重印一次".to_string()));
        wait_lock_idle(&store, 1001).await;
        assert_eq!(lock_table_keys(&store), vec![1001]);

        // 1001 离开清单且无在途持有者,其锁随替换回收
        store.replace_all(vec![create_test_sample(2002)]);
        assert!(lock_table_keys(&store).is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_keeps_lock_of_key_still_listed() {
        let store = create_test_store();
        store.replace_all(vec![create_test_sample(1001)]);

        store.mutate(1001, |s| s.tested = Some(true));
        wait_lock_idle(&store, 1001).await;

        // 键仍在清单中,锁保留备用
        store.replace_all(vec![create_test_sample(1001)]);
        assert_eq!(lock_table_keys(&store), vec![1001]);
    }

    #[tokio::test]
    async fn test_inflight_key_lock_survives_replacement() {
        let store = create_test_store();
        store.replace_all(vec![create_test_sample(1001)]);

        // 不让出执行权,落库任务尚未运行,锁仍被其持有
        store.mutate(1001, |s| s.send = Some(true));
        store.replace_all(Vec::new());
        assert_eq!(lock_table_keys(&store), vec![1001]);

        // 了结后的下一轮替换才回收
        wait_lock_idle(&store, 1001).await;
        store.replace_all(Vec::new());
        assert!(lock_table_keys(&store).is_empty());
    }
}
