// ==========================================
// 样品生产跟踪系统 - 内存状态层
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 样品清单与乐观变更
// 红线: 样品清单只整体替换,不原地修补
// ==========================================

pub mod observable;
pub mod sample_store;

pub use observable::Observable;
pub use sample_store::SampleStore;
