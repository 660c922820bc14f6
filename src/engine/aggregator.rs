// ==========================================
// 样品生产跟踪系统 - 样品聚合器
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 聚合视图
// 红线: 纯函数,无 I/O,不改写输入;缺失关联降级为缺省,永不失败
// ==========================================

use crate::domain::{Annotation, Order, Sample, StageRecord, StatusInfo};
use crate::engine::status_resolver::StatusResolver;
use std::sync::Arc;

// ==========================================
// SampleAggregator - 订单 + 工序 + 批注 → 样品视图
// ==========================================
// 印刷/分切取首条（仓库返回序稳定）,复合保持创建序全量映射
// 批注按库中值照抄,produce 的派生一致性由 FlagEngine 负责
pub struct SampleAggregator {
    resolver: Arc<StatusResolver>,
}

impl SampleAggregator {
    pub fn new(resolver: Arc<StatusResolver>) -> Self {
        SampleAggregator { resolver }
    }

    /// 组装一条样品视图
    ///
    /// # 参数
    /// - order: 订单主数据
    /// - print_jobs/cutter_jobs: 0..1 条,取首条为准
    /// - lamination_jobs: 0..N 条,创建序
    /// - annotation: 批注（可缺省）
    ///
    /// # 说明
    /// 对同一输入与同一解析注册表,输出恒同
    pub fn build_sample(
        &self,
        order: &Order,
        print_jobs: &[StageRecord],
        cutter_jobs: &[StageRecord],
        lamination_jobs: &[StageRecord],
        annotation: Option<&Annotation>,
    ) -> Sample {
        let order_status = StatusInfo {
            code: order.status,
            label: self.resolver.resolve(order.status),
            ilosc: order.ilosc,
            ilosc_wykonana: None,
            termin: None,
            data_wykonania: None,
        };

        let print_status = print_jobs.first().map(|r| self.stage_status(r));
        let cutter_status = cutter_jobs.first().map(|r| self.stage_status(r));
        let lamination_statuses: Vec<StatusInfo> = lamination_jobs
            .iter()
            .map(|r| self.stage_status(r))
            .collect();

        Sample {
            numer: order.numer,
            oddzial: order.oddzial.clone(),
            rok: order.rok,
            artykul: order.artykul.clone(),
            receptura: order.receptura.clone(),
            folia_grubosc: order.folia_grubosc.clone(),
            plyta_grubosc: order.plyta_grubosc.clone(),
            szerokosc: order.szerokosc.clone(),
            ilosc: order.ilosc,
            jednostka: order.jednostka.clone(),
            data_zamowienia: order.data_zamowienia,
            kontrahent_id: order.kontrahent_id,
            kontrahent_name: None,
            order_status,
            print_status,
            cutter_status,
            lamination_statuses,
            uwagi_zamowienie: annotation.and_then(|a| a.uwagi_zamowienie.clone()),
            uwagi_druk: annotation.and_then(|a| a.uwagi_druk.clone()),
            uwagi_laminacja: annotation.and_then(|a| a.uwagi_laminacja.clone()),
            uwagi_przecinarka: annotation.and_then(|a| a.uwagi_przecinarka.clone()),
            produce: annotation.and_then(|a| a.produce),
            send: annotation.and_then(|a| a.send),
            tested: annotation.and_then(|a| a.tested),
        }
    }

    /// 工序记录 → 状态信息
    fn stage_status(&self, record: &StageRecord) -> StatusInfo {
        StatusInfo {
            code: record.status,
            label: self.resolver.resolve(record.status),
            ilosc: record.ilosc,
            ilosc_wykonana: record.ilosc_wykonana,
            termin: record.termin,
            data_wykonania: record.data_wykonania,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_test_order(numer: i64, status: i32) -> Order {
        Order {
            numer,
            oddzial: Some("W1".to_string()),
            rok: Some(2025),
            artykul: Some("ART-100".to_string()),
            receptura: Some("RC-7".to_string()),
            folia_grubosc: None,
            plyta_grubosc: None,
            szerokosc: Some("1200".to_string()),
            ilosc: Some(500.0),
            jednostka: Some("szt".to_string()),
            kontrahent_id: Some(42),
            data_zamowienia: NaiveDate::from_ymd_opt(2025, 3, 10),
            status,
        }
    }

    fn create_test_stage(id: i64, numer: i64, status: i32) -> StageRecord {
        StageRecord {
            id,
            numer,
            status,
            ilosc: Some(500.0),
            ilosc_wykonana: None,
            termin: NaiveDate::from_ymd_opt(2025, 4, 1),
            data_wykonania: None,
        }
    }

    fn create_aggregator() -> SampleAggregator {
        SampleAggregator::new(Arc::new(StatusResolver::new()))
    }

    #[test]
    fn test_no_relations_degrades_to_absent() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 1);
        let sample = agg.build_sample(&order, &[], &[], &[], None);

        assert_eq!(sample.numer, 1001);
        assert_eq!(sample.order_status.code, 1);
        assert_eq!(sample.order_status.label, "生产中");
        assert!(sample.print_status.is_none());
        assert!(sample.cutter_status.is_none());
        assert!(sample.lamination_statuses.is_empty());
        assert_eq!(sample.produce, None);
        assert_eq!(sample.send, None);
        assert!(sample.uwagi_druk.is_none());
    }

    #[test]
    fn test_absent_stage_differs_from_unknown_code() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 1);

        // 印刷记录缺失 → 无 StatusInfo
        let without = agg.build_sample(&order, &[], &[], &[], None);
        assert!(without.print_status.is_none());

        // 印刷记录存在但状态码未登记 → 有 StatusInfo,标签为带码回退
        let print = create_test_stage(1, 1001, 77);
        let with = agg.build_sample(&order, &[print], &[], &[], None);
        let status = with.print_status.unwrap();
        assert_eq!(status.code, 77);
        assert!(status.label.contains("77"));
    }

    #[test]
    fn test_first_record_wins_for_print_and_cutter() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 0);
        let print = vec![
            create_test_stage(3, 1001, 0),
            create_test_stage(9, 1001, 1),
        ];
        let sample = agg.build_sample(&order, &print, &[], &[], None);
        assert_eq!(sample.print_status.unwrap().code, 0);
    }

    #[test]
    fn test_lamination_preserves_creation_order() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 1);
        let laminations = vec![
            create_test_stage(1, 1001, 0),
            create_test_stage(2, 1001, 1),
            create_test_stage(5, 1001, 2),
        ];
        let sample = agg.build_sample(&order, &[], &[], &laminations, None);
        let codes: Vec<i32> = sample.lamination_statuses.iter().map(|s| s.code).collect();
        assert_eq!(codes, vec![0, 1, 2]);
        assert_eq!(sample.lamination_statuses[0].label, "已完成");
    }

    #[test]
    fn test_annotation_copied_as_stored() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 0);
        let mut annotation = Annotation::empty(1001);
        annotation.uwagi_druk = Some("重印一次".to_string());
        // 库中 produce 与当前订单状态不一致时照抄,不在聚合时重派生
        annotation.produce = Some(false);
        annotation.send = Some(true);

        let sample = agg.build_sample(&order, &[], &[], &[], Some(&annotation));
        assert_eq!(sample.uwagi_druk.as_deref(), Some("重印一次"));
        assert_eq!(sample.produce, Some(false));
        assert_eq!(sample.send, Some(true));
        assert_eq!(sample.tested, None);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let agg = create_aggregator();
        let order = create_test_order(1001, 2);
        let laminations = vec![create_test_stage(1, 1001, 1)];
        let a = agg.build_sample(&order, &[], &[], &laminations, None);
        let b = agg.build_sample(&order, &[], &[], &laminations, None);
        assert_eq!(a, b);
    }
}
