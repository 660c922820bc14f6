// ==========================================
// 样品生产跟踪系统 - API 层
// ==========================================
// 职责: 提供展示层入口门面与统一错误转换
// ==========================================

pub mod error;
pub mod tracker_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use tracker_api::SampleTrackerApi;
