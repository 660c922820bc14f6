// ==========================================
// 样品生产跟踪系统 - 筛选核心（纯函数层）
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 多维筛选
// 红线: 纯函数,无状态,零 I/O;调度与去抖在 FilterEngine
// ==========================================

use crate::domain::{FilterState, Sample, StatusInfo};
use std::collections::HashSet;

// ==========================================
// FilterCore - 多维谓词求值
// ==========================================
// 语义: 各维度 AND 组合;空选集维度放行;空筛选 ≡ 原列表
pub struct FilterCore;

impl FilterCore {
    /// 判定单条样品是否命中筛选条件
    pub fn matches(sample: &Sample, filter: &FilterState) -> bool {
        Self::matches_query(sample, &filter.query)
            && Self::matches_codes(Some(&sample.order_status), &filter.order_codes)
            && Self::matches_codes(sample.print_status.as_ref(), &filter.print_codes)
            && Self::matches_codes(sample.cutter_status.as_ref(), &filter.cutter_codes)
            && Self::matches_lamination(&sample.lamination_statuses, &filter.lamination_codes)
            && Self::matches_counterparty(sample, &filter.kontrahent_ids)
            && filter.send.matches(sample.send)
            && filter.tested.matches(sample.tested)
            && Self::matches_date_range(sample, filter)
    }

    /// 全量求值,保持输入顺序
    pub fn apply(samples: &[Sample], filter: &FilterState) -> Vec<Sample> {
        samples
            .iter()
            .filter(|s| Self::matches(s, filter))
            .cloned()
            .collect()
    }

    /// 自由文本维度: 订单号文本/品号/配方号,不区分大小写
    fn matches_query(sample: &Sample, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if sample.numer.to_string().contains(&needle) {
            return true;
        }
        let field_hit = |field: &Option<String>| {
            field
                .as_deref()
                .map(|v| v.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        field_hit(&sample.artykul) || field_hit(&sample.receptura)
    }

    /// 单工序状态码维度: 空选集放行;非空时记录必须存在且码命中
    fn matches_codes(status: Option<&StatusInfo>, codes: &HashSet<i32>) -> bool {
        if codes.is_empty() {
            return true;
        }
        status.map(|s| codes.contains(&s.code)).unwrap_or(false)
    }

    /// 复合工序维度: 任一行命中即过
    fn matches_lamination(statuses: &[StatusInfo], codes: &HashSet<i32>) -> bool {
        if codes.is_empty() {
            return true;
        }
        statuses.iter().any(|s| codes.contains(&s.code))
    }

    /// 客户维度
    fn matches_counterparty(sample: &Sample, ids: &HashSet<i64>) -> bool {
        if ids.is_empty() {
            return true;
        }
        sample
            .kontrahent_id
            .map(|id| ids.contains(&id))
            .unwrap_or(false)
    }

    /// 下单日期闭区间: 无日期的订单不过任何有界区间
    fn matches_date_range(sample: &Sample, filter: &FilterState) -> bool {
        if filter.date_from.is_none() && filter.date_to.is_none() {
            return true;
        }
        let date = match sample.data_zamowienia {
            Some(d) => d,
            None => return false,
        };
        if let Some(from) = filter.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = filter.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}
