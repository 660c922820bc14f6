// ==========================================
// 样品缓存存储 - 集成测试
// ==========================================
// 测试范围:
// 1. 整表替换更新快照与版本号
// 2. 乐观变更先行生效,持久化在后台完成
// 3. 持久化失败回滚本地快照并广播变更失败事件
// 4. 目标订单不存在时仅广播失败,不触发写入
// 5. 同单变更按序排队,不丢失不覆盖
// 6. 不同订单的变更互不阻塞
// ==========================================


use sample_tracking_core::engine::{EventBus, TrackerEvent};
use sample_tracking_core::store::SampleStore;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{create_test_sample, MockSampleRepository};
use tokio::time::timeout;

fn setup_store(repo: Arc<MockSampleRepository>) -> (SampleStore, EventBus) {
    let events = EventBus::new(16);
    let store = SampleStore::new(repo, events.clone());
    (store, events)
}

/// 轮询等待条件成立,超时即 panic
async fn wait_until<F>(what: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = Duration::from_secs(2);
    let result = timeout(deadline, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "等待超时: {}", what);
}

#[tokio::test]
async fn test_replace_all_updates_snapshot_and_revision() {
    let repo = Arc::new(MockSampleRepository::new());
    let (store, _events) = setup_store(repo);

    let initial_revision = store.revision();
    let mut revision_rx = store.subscribe_revision();

    store.replace_all(vec![create_test_sample(1001, 1), create_test_sample(1002, 0)]);

    assert_eq!(store.snapshot().len(), 2);
    assert!(store.revision() > initial_revision);
    assert!(revision_rx.has_changed().unwrap());
    assert!(store.find(1001).is_some());
    assert!(store.find(9999).is_none());
}

#[tokio::test]
async fn test_mutate_is_optimistic_then_persists() {
    let repo = Arc::new(MockSampleRepository::new());
    repo.set_save_delay_ms(80);
    let (store, _events) = setup_store(repo.clone());
    store.replace_all(vec![create_test_sample(1001, 1)]);

    store.mutate(1001, |sample| sample.send = Some(true));

    // 本地立即可见,落库尚未完成
    assert_eq!(store.find(1001).unwrap().send, Some(true));
    assert_eq!(repo.save_calls(), 0);

    wait_until("批注落库", || repo.save_calls() == 1).await;
    let persisted = repo.annotation(1001).unwrap();
    assert_eq!(persisted.send, Some(true));
    // 成功路径不回滚
    assert_eq!(store.find(1001).unwrap().send, Some(true));
}

#[tokio::test]
async fn test_mutate_rolls_back_on_persistence_failure() {
    let repo = Arc::new(MockSampleRepository::new());
    repo.set_fail_save(true);
    let (store, events) = setup_store(repo.clone());
    store.replace_all(vec![create_test_sample(1001, 1)]);
    let revision_before = store.revision();
    let mut event_rx = events.subscribe();

    store.mutate(1001, |sample| sample.tested = Some(true));
    assert_eq!(store.find(1001).unwrap().tested, Some(true));

    // 失败后本地快照回到变更前
    wait_until("回滚生效", || {
        store.find(1001).map(|s| s.tested) == Some(None)
    })
    .await;

    let event = timeout(Duration::from_secs(2), event_rx.recv())
        .await
        .expect("等待事件超时")
        .unwrap();
    match event {
        TrackerEvent::MutationFailed { numer, .. } => assert_eq!(numer, 1001),
        other => panic!("收到意外事件: {:?}", other),
    }
    // 变更与回滚各计一次版本号
    assert!(store.revision() >= revision_before + 2);
}

#[tokio::test]
async fn test_mutate_unknown_numer_reports_failure_without_write() {
    let repo = Arc::new(MockSampleRepository::new());
    let (store, events) = setup_store(repo.clone());
    store.replace_all(vec![create_test_sample(1001, 1)]);
    let mut event_rx = events.subscribe();

    store.mutate(4040, |sample| sample.send = Some(true));

    let event = timeout(Duration::from_secs(2), event_rx.recv())
        .await
        .expect("等待事件超时")
        .unwrap();
    assert!(matches!(
        event,
        TrackerEvent::MutationFailed { numer: 4040, .. }
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(repo.save_calls(), 0);
    assert_eq!(store.snapshot().len(), 1);
}

#[tokio::test]
async fn test_same_key_mutations_queue_in_order() {
    let repo = Arc::new(MockSampleRepository::new());
    repo.set_save_delay_ms(80);
    let (store, _events) = setup_store(repo.clone());
    store.replace_all(vec![create_test_sample(1001, 1)]);

    // 第一笔慢速落库期间提交第二笔同单变更
    store.mutate(1001, |sample| {
        sample.uwagi_druk = Some("重印一次".to_string())
    });
    store.mutate(1001, |sample| sample.tested = Some(true));

    // 第二笔排队等待首笔落库,本地尚不可见
    assert_eq!(store.find(1001).unwrap().tested, None);
    assert_eq!(
        store.find(1001).unwrap().uwagi_druk.as_deref(),
        Some("重印一次")
    );

    wait_until("两笔变更均落库", || repo.save_calls() == 2).await;

    // 两笔都生效,后者叠加在前者之上而非覆盖
    let current = store.find(1001).unwrap();
    assert_eq!(current.uwagi_druk.as_deref(), Some("重印一次"));
    assert_eq!(current.tested, Some(true));

    let history = repo.save_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].uwagi_druk.as_deref(), Some("重印一次"));
    assert_eq!(history[0].tested, None);
    assert_eq!(history[1].uwagi_druk.as_deref(), Some("重印一次"));
    assert_eq!(history[1].tested, Some(true));
}

#[tokio::test]
async fn test_cross_key_mutations_do_not_block_each_other() {
    let repo = Arc::new(MockSampleRepository::new());
    repo.set_save_delay_ms(300);
    let (store, _events) = setup_store(repo.clone());
    store.replace_all(vec![create_test_sample(1001, 1), create_test_sample(1002, 1)]);

    store.mutate(1001, |sample| sample.send = Some(true));
    store.mutate(1002, |sample| sample.send = Some(true));

    // 两单并行落库: 串行需要 600ms 以上,限时 500ms 内须全部完成
    let result = timeout(Duration::from_millis(500), async {
        while repo.save_calls() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "跨单变更被串行化");
    assert_eq!(store.find(1001).unwrap().send, Some(true));
    assert_eq!(store.find(1002).unwrap().send, Some(true));
}
