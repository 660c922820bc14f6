// ==========================================
// 样品生产跟踪系统 - 聚合与同步核心库
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 系统宪法
// 技术栈: Rust + Tokio
// 系统定位: 数据仓储与展示层之间的单进程聚合/对账引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问边界 (trait)
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 存储层 - 内存样品列表与乐观更新
pub mod store;

// 配置层 - 核心配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 展示层接口
pub mod api;

// 应用层 - 组件装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{status_codes, ConnectionState, FlagCriterion, FlagKind, LoadPhase};

// 领域实体
pub use domain::{
    Annotation, Counterparty, FilterState, Order, Sample, StageKind, StageRecord, StatusInfo,
};

// 仓储边界
pub use repository::{RepositoryError, RepositoryResult, SampleRepository};

// 引擎
pub use engine::{
    EventBus, FilterCore, FilterEngine, FlagEngine, ReconcileSummary, SampleAggregator,
    StatusResolver, TrackerEvent,
};

// 存储
pub use store::{Observable, SampleStore};

// API
pub use api::{ApiError, ApiResult, SampleTrackerApi};

// 应用装配
pub use app::{AppState, ConnectionMonitor};

// 配置
pub use config::CoreConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "样品生产跟踪系统";

// ==========================================
// 预编译检查
// ==========================================
