// ==========================================
// 样品生产跟踪系统 - 批注领域模型
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 数据模型 / 标志派生
// 依据: sample_schema_v0.2.md - adnotacje 表
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Annotation - 订单批注（每单 0..1 条,惰性创建）
// ==========================================
// 红线: produce 是派生缓存,只由 FlagEngine 写入;
//       send/tested 为人工标志,引擎只在 produce 升为 true 的
//       那一次迁移中把未设置者补为 false
// 三态语义: None=未设置, Some(false)=未完成, Some(true)=已完成
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Annotation {
    // ===== 关联 =====
    pub numer: i64, // 关联订单号（业务键,每单至多一条）

    // ===== 分阶段备注（自由文本）=====
    pub uwagi_zamowienie: Option<String>, // 订单备注
    pub uwagi_druk: Option<String>,       // 印刷备注
    pub uwagi_laminacja: Option<String>,  // 复合备注
    pub uwagi_przecinarka: Option<String>, // 分切备注

    // ===== 标志 =====
    pub produce: Option<bool>, // 投产标志（派生缓存）
    pub send: Option<bool>,    // 寄送标志（人工）
    pub tested: Option<bool>,  // 测试标志（人工）
}

impl Annotation {
    /// 建立指定订单的空批注
    pub fn empty(numer: i64) -> Self {
        Annotation {
            numer,
            ..Default::default()
        }
    }
}
