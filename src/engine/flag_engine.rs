// ==========================================
// 样品生产跟踪系统 - 投产标志引擎
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 标志派生与调和
// 红线: produce 只由本引擎写入;send/tested 为人工标志,
//       仅在 produce 升为 true 的那一次迁移中把未设置者补为 false
// ==========================================
// 职责: 按订单状态派生 produce,调和批注缓存
// 输入: 当期订单列表 + 批注表
// 输出: 批注写入（惰性创建 / 更新）+ 调和汇总
// ==========================================

use crate::domain::{status_codes, Annotation, Order};
use crate::repository::{RepositoryResult, SampleRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// ReconcileSummary - 调和汇总
// ==========================================
// 可观测幂等性: 上游状态不变时,第二遍 created=updated=0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub created: usize,   // 本遍新建批注数
    pub updated: usize,   // 本遍更新批注数
    pub unchanged: usize, // 无需写入的订单数
}

// ==========================================
// FlagEngine - 标志派生与调和引擎
// ==========================================
pub struct FlagEngine {
    repo: Arc<dyn SampleRepository>,
}

impl FlagEngine {
    /// 创建新的 FlagEngine 实例
    ///
    /// # 参数
    /// - repo: 数据访问边界
    pub fn new(repo: Arc<dyn SampleRepository>) -> Self {
        Self { repo }
    }

    /// 派生规则: 订单状态 → produce 标志
    ///
    /// # 说明
    /// - 已完成(0) → Some(true)
    /// - 生产中(1)/已计划(2) → Some(false)
    /// - 其余状态 → None（不定）
    pub fn derive(order_status: i32) -> Option<bool> {
        match order_status {
            status_codes::COMPLETED => Some(true),
            status_codes::IN_PROGRESS | status_codes::PLANNED => Some(false),
            _ => None,
        }
    }

    /// 无批注时的建档决策（纯函数）
    ///
    /// # 返回
    /// - Some(annotation): 需要新建（仅当派生值为 Some(false)）
    /// - None: 不建档
    pub fn plan_create(numer: i64, derived: Option<bool>) -> Option<Annotation> {
        if derived == Some(false) {
            let mut annotation = Annotation::empty(numer);
            annotation.produce = Some(false);
            Some(annotation)
        } else {
            None
        }
    }

    /// 已有批注时的更新决策（纯函数）
    ///
    /// # 返回
    /// - Some(annotation): 需要写回的新批注
    /// - None: 缓存已一致,零写入
    ///
    /// # 说明
    /// produce 升为 Some(true) 的那一次迁移,顺带把未设置的
    /// send/tested 补为 Some(false);已设置者一律不碰
    pub fn plan_update(annotation: &Annotation, derived: Option<bool>) -> Option<Annotation> {
        if annotation.produce == derived {
            return None;
        }
        let mut updated = annotation.clone();
        updated.produce = derived;
        if derived == Some(true) {
            if updated.send.is_none() {
                updated.send = Some(false);
            }
            if updated.tested.is_none() {
                updated.tested = Some(false);
            }
        }
        Some(updated)
    }

    /// 对当期订单全量调和批注缓存
    ///
    /// # 参数
    /// - orders: 当期订单列表（调用方取数）
    ///
    /// # 返回
    /// - Ok(ReconcileSummary): 调和汇总
    /// - Err(RepositoryError): 仓储失败,中止剩余订单;已写入的单子保留
    ///
    /// # 说明
    /// 阻塞调用,须经 spawn_blocking 派发;逐单原子,可重入
    #[instrument(skip(self, orders), fields(order_count = orders.len()))]
    pub fn reconcile_all(&self, orders: &[Order]) -> RepositoryResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        for order in orders {
            let derived = Self::derive(order.status);

            match self.repo.fetch_annotation(order.numer)? {
                None => match Self::plan_create(order.numer, derived) {
                    Some(annotation) => {
                        self.repo.save_annotation(&annotation)?;
                        debug!(numer = order.numer, "新建批注, produce=false");
                        summary.created += 1;
                    }
                    None => summary.unchanged += 1,
                },
                Some(existing) => match Self::plan_update(&existing, derived) {
                    Some(updated) => {
                        self.repo.save_annotation(&updated)?;
                        debug!(
                            numer = order.numer,
                            produce = ?updated.produce,
                            "更新批注投产标志"
                        );
                        summary.updated += 1;
                    }
                    None => summary.unchanged += 1,
                },
            }
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "批注调和完成"
        );
        Ok(summary)
    }
}
