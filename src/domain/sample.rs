// ==========================================
// 样品生产跟踪系统 - 样品视图模型
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 聚合视图
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// StatusInfo - 解析后的状态信息
// ==========================================
// 派生值,不落库: 状态码 + 画面标签 + 该工序的数量/日期
// 区分两种缺失: 工序记录不存在 → 整个 StatusInfo 为 None;
//               状态码未登记 → label 为带码回退文案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub code: i32,                         // 状态码
    pub label: String,                     // 画面标签（StatusResolver 解析）
    pub ilosc: Option<f64>,                // 计划数量
    pub ilosc_wykonana: Option<f64>,       // 已完成数量
    pub termin: Option<NaiveDate>,         // 要求完成日期
    pub data_wykonania: Option<NaiveDate>, // 实际完成日期
}

// ==========================================
// Sample - 样品聚合视图（前端展示用完整信息）
// ==========================================
// 红线: 不可变值,任何变更都整体替换列表中的条目,杜绝半新半旧
// 组合: 订单字段 + 各工序 StatusInfo + 批注字段 + 客户名
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    // ===== 订单字段 =====
    pub numer: i64,                  // 订单号（业务主键）
    pub oddzial: Option<String>,     // 分部代码
    pub rok: Option<i32>,            // 年度
    pub artykul: Option<String>,     // 品号
    pub receptura: Option<String>,   // 配方号
    pub folia_grubosc: Option<String>, // 膜厚
    pub plyta_grubosc: Option<String>, // 板厚
    pub szerokosc: Option<String>,   // 幅宽
    pub ilosc: Option<f64>,          // 数量
    pub jednostka: Option<String>,   // 单位
    pub data_zamowienia: Option<NaiveDate>, // 下单日期

    // ===== 客户 =====
    pub kontrahent_id: Option<i64>,       // 客户 ID
    pub kontrahent_name: Option<String>,  // 客户名称（加载管线富化）

    // ===== 工序状态 =====
    pub order_status: StatusInfo,               // 订单状态（恒存在）
    pub print_status: Option<StatusInfo>,       // 印刷状态（0..1）
    pub cutter_status: Option<StatusInfo>,      // 分切状态（0..1）
    pub lamination_statuses: Vec<StatusInfo>,   // 复合状态（0..N,创建序）

    // ===== 批注字段（无批注时全部缺省）=====
    pub uwagi_zamowienie: Option<String>, // 订单备注
    pub uwagi_druk: Option<String>,       // 印刷备注
    pub uwagi_laminacja: Option<String>,  // 复合备注
    pub uwagi_przecinarka: Option<String>, // 分切备注
    pub produce: Option<bool>,            // 投产标志（派生缓存,按库中值展示）
    pub send: Option<bool>,               // 寄送标志
    pub tested: Option<bool>,             // 测试标志
}

impl Sample {
    /// 读取指定人工标志的当前值
    pub fn manual_flag(&self, kind: crate::domain::types::FlagKind) -> Option<bool> {
        match kind {
            crate::domain::types::FlagKind::Send => self.send,
            crate::domain::types::FlagKind::Tested => self.tested,
        }
    }

    /// 导出本样品的批注投影（持久化用）
    pub fn annotation(&self) -> crate::domain::Annotation {
        crate::domain::Annotation {
            numer: self.numer,
            uwagi_zamowienie: self.uwagi_zamowienie.clone(),
            uwagi_druk: self.uwagi_druk.clone(),
            uwagi_laminacja: self.uwagi_laminacja.clone(),
            uwagi_przecinarka: self.uwagi_przecinarka.clone(),
            produce: self.produce,
            send: self.send,
            tested: self.tested,
        }
    }
}
