// ==========================================
// 样品生产跟踪系统 - 状态解析器
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 状态码体系
// 红线: 共享注册表必须并发安全,禁止可变别名改写
// ==========================================

use crate::domain::status_codes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

// ==========================================
// StatusResolver - 状态码 → 画面标签注册表
// ==========================================
// 读多写少: 运行期仅在扩展状态域时写入
// 解析是全函数: 未登记的码返回带码回退文案,永不失败
pub struct StatusResolver {
    registry: RwLock<HashMap<i32, String>>,
}

impl StatusResolver {
    /// 建立带种子映射的解析器
    pub fn new() -> Self {
        let mut seed = HashMap::new();
        seed.insert(status_codes::COMPLETED, "已完成".to_string());
        seed.insert(status_codes::IN_PROGRESS, "生产中".to_string());
        seed.insert(status_codes::PLANNED, "已计划".to_string());
        seed.insert(status_codes::PAUSED, "已暂停".to_string());
        seed.insert(status_codes::CANCELLED, "已取消".to_string());
        seed.insert(status_codes::PENDING_REVIEW, "待审核".to_string());
        StatusResolver {
            registry: RwLock::new(seed),
        }
    }

    /// 解析状态码为画面标签
    ///
    /// # 说明
    /// - 同一状态码在无新登记的前提下恒得同一标签
    /// - 未登记的码返回 "未知状态 (码)" 回退文案
    pub fn resolve(&self, code: i32) -> String {
        let registry = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match registry.get(&code) {
            Some(label) => label.clone(),
            None => format!("未知状态 ({})", code),
        }
    }

    /// 登记或覆盖一条状态码映射
    pub fn register(&self, code: i32, label: impl Into<String>) {
        let label = label.into();
        debug!(code = code, label = %label, "登记状态码映射");
        let mut registry = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        registry.insert(code, label);
    }

    /// 状态码是否已登记
    pub fn is_known(&self, code: i32) -> bool {
        let registry = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        registry.contains_key(&code)
    }

    /// 导出当前映射快照（按码升序,供筛选下拉展示）
    pub fn snapshot(&self) -> Vec<(i32, String)> {
        let registry = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<(i32, String)> = registry
            .iter()
            .map(|(code, label)| (*code, label.clone()))
            .collect();
        entries.sort_by_key(|(code, _)| *code);
        entries
    }
}

impl Default for StatusResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_mapping() {
        let resolver = StatusResolver::new();
        assert_eq!(resolver.resolve(0), "已完成");
        assert_eq!(resolver.resolve(1), "生产中");
        assert_eq!(resolver.resolve(2), "已计划");
        assert_eq!(resolver.resolve(3), "已暂停");
        assert_eq!(resolver.resolve(4), "已取消");
        assert_eq!(resolver.resolve(5), "待审核");
    }

    #[test]
    fn test_unknown_code_fallback_embeds_code() {
        let resolver = StatusResolver::new();
        let label = resolver.resolve(99);
        assert!(label.contains("99"), "回退文案必须含状态码: {}", label);
        assert!(!resolver.is_known(99));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let resolver = StatusResolver::new();
        assert_eq!(resolver.resolve(3), resolver.resolve(3));
        assert_eq!(resolver.resolve(42), resolver.resolve(42));
    }

    #[test]
    fn test_register_extends_and_overrides() {
        let resolver = StatusResolver::new();
        resolver.register(6, "已发货");
        assert!(resolver.is_known(6));
        assert_eq!(resolver.resolve(6), "已发货");

        // 覆盖已有映射
        resolver.register(6, "已出库");
        assert_eq!(resolver.resolve(6), "已出库");
    }

    #[test]
    fn test_snapshot_sorted_by_code() {
        let resolver = StatusResolver::new();
        resolver.register(10, "自定义");
        let snapshot = resolver.snapshot();
        assert_eq!(snapshot.len(), 7);
        let codes: Vec<i32> = snapshot.iter().map(|(c, _)| *c).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, 10]);
    }

    #[test]
    fn test_concurrent_register_and_resolve() {
        use std::sync::Arc;

        let resolver = Arc::new(StatusResolver::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let r = Arc::clone(&resolver);
            handles.push(std::thread::spawn(move || {
                for j in 0..100 {
                    r.register(100 + i, format!("标签-{}", j));
                    let _ = r.resolve(100 + i);
                    let _ = r.resolve(0);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        // 种子映射不受并发扩展影响
        assert_eq!(resolver.resolve(0), "已完成");
        for i in 0..8 {
            assert!(resolver.is_known(100 + i));
        }
    }
}
