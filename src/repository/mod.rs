// ==========================================
// 样品生产跟踪系统 - 数据访问边界
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 外部接口
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 定义数据访问契约,屏蔽存储细节
// 约束: 方法为阻塞调用,调用方必须经 spawn_blocking 派发,
//       不得占用交互线程
// ==========================================

pub mod error;

pub use error::{RepositoryError, RepositoryResult};

use crate::domain::{Annotation, Counterparty, Order, StageRecord};

// ==========================================
// SampleRepository - 样品数据访问契约
// ==========================================
// 实现方在本 crate 之外（生产为数据库适配层,测试为内存桩）
// 复合工序记录必须按创建序（行 ID 升序）返回
pub trait SampleRepository: Send + Sync {
    /// 读取近 months_back 个月内创建的订单
    ///
    /// # 参数
    /// - months_back: 取数窗口（月）
    /// - sample_only: 仅取样品单
    fn fetch_orders(&self, months_back: u32, sample_only: bool) -> RepositoryResult<Vec<Order>>;

    /// 读取指定订单的印刷工序记录（0..1 条）
    fn fetch_print_jobs(&self, numer: i64) -> RepositoryResult<Vec<StageRecord>>;

    /// 读取指定订单的分切工序记录（0..1 条）
    fn fetch_cutter_jobs(&self, numer: i64) -> RepositoryResult<Vec<StageRecord>>;

    /// 读取指定订单的复合工序记录（0..N 条,创建序）
    fn fetch_lamination_jobs(&self, numer: i64) -> RepositoryResult<Vec<StageRecord>>;

    /// 读取指定订单的批注（无则 None）
    fn fetch_annotation(&self, numer: i64) -> RepositoryResult<Option<Annotation>>;

    /// 写入批注（upsert 语义,按 numer 定位）
    fn save_annotation(&self, annotation: &Annotation) -> RepositoryResult<()>;

    /// 按 ID 集合读取客户摘要
    fn fetch_counterparties(&self, ids: &[i64]) -> RepositoryResult<Vec<Counterparty>>;

    /// 连通性探测（Err = 离线）
    fn probe(&self) -> RepositoryResult<()>;
}
