// ==========================================
// 样品生产跟踪系统 - 领域模型层
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 数据与状态体系
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod annotation;
pub mod filter;
pub mod order;
pub mod sample;
pub mod stage;
pub mod types;

// 重导出核心类型
pub use annotation::Annotation;
pub use filter::FilterState;
pub use order::{Counterparty, Order};
pub use sample::{Sample, StatusInfo};
pub use stage::{StageKind, StageRecord};
pub use types::{status_codes, ConnectionState, FlagCriterion, FlagKind, LoadPhase};
