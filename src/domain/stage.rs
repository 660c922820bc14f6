// ==========================================
// 样品生产跟踪系统 - 工序记录领域模型
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 数据模型
// 依据: sample_schema_v0.2.md - druk/przecinarka/laminacja 表
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// StageKind - 工序种类
// ==========================================
// 三张工序表结构同形,仅在日志与状态取值处区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    Print,      // 印刷
    Cutter,     // 分切
    Lamination, // 复合
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Print => "PRINT",
            StageKind::Cutter => "CUTTER",
            StageKind::Lamination => "LAMINATION",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// StageRecord - 工序执行记录
// ==========================================
// 红线: 复合工序一单多行,创建序(id 升序)有业务含义,仓库层与聚合层都必须保持
// 用途: 仓库层按 numer 读取,聚合层转为 StatusInfo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    // ===== 主键与关联 =====
    pub id: i64,    // 行 ID（创建序标识）
    pub numer: i64, // 关联订单号（FK）

    // ===== 状态 =====
    pub status: i32, // 工序状态码（与订单状态码同域）

    // ===== 数量 =====
    pub ilosc: Option<f64>,          // 计划数量
    pub ilosc_wykonana: Option<f64>, // 已完成数量

    // ===== 时间信息 =====
    pub termin: Option<NaiveDate>,         // 要求完成日期
    pub data_wykonania: Option<NaiveDate>, // 实际完成日期
}
