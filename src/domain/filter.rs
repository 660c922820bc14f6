// ==========================================
// 样品生产跟踪系统 - 筛选条件模型
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 多维筛选
// ==========================================

use crate::domain::types::FlagCriterion;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// FilterState - 多维筛选条件
// ==========================================
// 语义: 各激活维度按 AND 组合;空选集维度放行全部;
//       默认值为全放行（空筛选 ≡ 原列表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    // ===== 自由文本 =====
    pub query: String, // 检索词（订单号文本/品号/配方号,不区分大小写）

    // ===== 状态码选集（每工序一套,空=不限）=====
    pub order_codes: HashSet<i32>,      // 订单状态选集
    pub print_codes: HashSet<i32>,      // 印刷状态选集
    pub cutter_codes: HashSet<i32>,     // 分切状态选集
    pub lamination_codes: HashSet<i32>, // 复合状态选集（任一命中即过）

    // ===== 客户 =====
    pub kontrahent_ids: HashSet<i64>, // 客户选集（空=不限）

    // ===== 人工标志三态条件 =====
    pub send: FlagCriterion,   // 寄送条件
    pub tested: FlagCriterion, // 测试条件

    // ===== 下单日期区间（闭区间,两端独立可缺省）=====
    pub date_from: Option<NaiveDate>, // 起始（含）
    pub date_to: Option<NaiveDate>,   // 截止（含）
}

impl FilterState {
    /// 是否为全放行条件（等价于默认值）
    pub fn is_permissive(&self) -> bool {
        self.query.trim().is_empty()
            && self.order_codes.is_empty()
            && self.print_codes.is_empty()
            && self.cutter_codes.is_empty()
            && self.lamination_codes.is_empty()
            && self.kontrahent_ids.is_empty()
            && self.send.is_any()
            && self.tested.is_any()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_permissive() {
        assert!(FilterState::default().is_permissive());
    }

    #[test]
    fn test_any_dimension_breaks_permissive() {
        let mut f = FilterState::default();
        f.query = "abc".to_string();
        assert!(!f.is_permissive());

        let mut f = FilterState::default();
        f.order_codes.insert(1);
        assert!(!f.is_permissive());

        let mut f = FilterState::default();
        f.send = FlagCriterion::No;
        assert!(!f.is_permissive());

        let mut f = FilterState::default();
        f.date_to = NaiveDate::from_ymd_opt(2025, 12, 31);
        assert!(!f.is_permissive());
    }

    #[test]
    fn test_whitespace_query_stays_permissive() {
        let mut f = FilterState::default();
        f.query = "   ".to_string();
        assert!(f.is_permissive());
    }
}
