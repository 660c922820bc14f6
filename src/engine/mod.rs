// ==========================================
// 样品生产跟踪系统 - 引擎层
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 组件分解
// ==========================================
// 职责: 实现聚合/派生/筛选业务规则
// 红线: Engine 不拼 SQL,只经 SampleRepository 取数
// ==========================================

pub mod aggregator;
pub mod events;
pub mod filter_core;
pub mod filter_engine;
pub mod flag_engine;
pub mod status_resolver;

// 重导出核心引擎
pub use aggregator::SampleAggregator;
pub use events::{EventBus, TrackerEvent};
pub use filter_core::FilterCore;
pub use filter_engine::FilterEngine;
pub use flag_engine::{FlagEngine, ReconcileSummary};
pub use status_resolver::StatusResolver;
