// ==========================================
// 样品生产跟踪系统 - 应用层
// ==========================================
// 职责: 组件装配与后台任务生命周期
// ==========================================

pub mod monitor;
pub mod state;

// 重导出
pub use monitor::ConnectionMonitor;
pub use state::AppState;
