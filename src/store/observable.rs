// ==========================================
// 样品生产跟踪系统 - 可观察值
// ==========================================
// 职责: 以 watch 通道承载可订阅的共享状态
// 说明: 写入是整体赋值;订阅方只看到完整值,不存在半更新
// ==========================================

use tokio::sync::watch;

// ==========================================
// Observable - 单值可观察状态
// ==========================================
// get/set 即取即设;subscribe 返回 watch 接收端,
// 订阅方经 changed().await 感知变更
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// 以初始值建立可观察状态
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// 读取当前值
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// 整体替换当前值
    ///
    /// # 说明
    /// 无订阅者时照常保存,后续订阅方可取到最新值
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// 按条件整体替换当前值
    ///
    /// # 说明
    /// 条件判定与替换在通道内部锁中一体执行,与其它写入方串行;
    /// 判定不通过时不替换亦不通知
    ///
    /// # 返回
    /// 是否已替换
    pub fn set_if(&self, value: T, gate: impl FnOnce() -> bool) -> bool {
        self.sender.send_if_modified(|slot| {
            if gate() {
                *slot = value;
                true
            } else {
                false
            }
        })
    }

    /// 原子修改当前值并通知订阅方
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.sender.send_modify(modify);
    }

    /// 订阅变更
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let value = Observable::new(7_u64);
        assert_eq!(value.get(), 7);
        value.set(11);
        assert_eq!(value.get(), 11);
    }

    #[tokio::test]
    async fn test_subscriber_sees_change() {
        let value = Observable::new(0_u64);
        let mut rx = value.subscribe();

        value.set(5);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 5);
    }

    #[tokio::test]
    async fn test_set_if_rejected_gate_keeps_value_and_stays_silent() {
        let value = Observable::new(1_u64);
        let mut rx = value.subscribe();

        // 判定不通过: 不替换,订阅方无感知
        assert!(!value.set_if(9, || false));
        assert_eq!(value.get(), 1);
        assert!(!rx.has_changed().unwrap());

        // 判定通过: 替换并通知
        assert!(value.set_if(9, || true));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 9);
    }

    #[tokio::test]
    async fn test_update_is_cumulative() {
        let value = Observable::new(0_u64);
        for _ in 0..10 {
            value.update(|v| *v += 1);
        }
        assert_eq!(value.get(), 10);
    }

    #[test]
    fn test_set_without_subscribers_keeps_value() {
        let value = Observable::new("初始".to_string());
        value.set("更新".to_string());
        assert_eq!(value.get(), "更新");
    }
}
