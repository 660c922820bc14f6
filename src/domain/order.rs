// ==========================================
// 样品生产跟踪系统 - 订单领域模型
// ==========================================
// 依据: Sample_Core_Master_Spec.md - 数据模型
// 依据: sample_schema_v0.2.md - zlecenia 表字段映射
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 样品订单主数据
// ==========================================
// 红线: numer 为业务主键,所有关联表以其为连接键
// 用途: 仓库层读取,聚合层只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // ===== 业务主键 =====
    pub numer: i64, // 订单号（唯一业务键）

    // ===== 归属信息 =====
    pub oddzial: Option<String>, // 分部代码
    pub rok: Option<i32>,        // 年度

    // ===== 技术维度（源字段,全部可缺省）=====
    pub artykul: Option<String>,     // 品号
    pub receptura: Option<String>,   // 配方号
    pub folia_grubosc: Option<String>, // 膜厚
    pub plyta_grubosc: Option<String>, // 板厚
    pub szerokosc: Option<String>,   // 幅宽
    pub ilosc: Option<f64>,          // 数量
    pub jednostka: Option<String>,   // 单位

    // ===== 关联 =====
    pub kontrahent_id: Option<i64>, // 客户 ID（关联 kontrahenci）

    // ===== 时间信息 =====
    pub data_zamowienia: Option<NaiveDate>, // 下单日期

    // ===== 状态 =====
    pub status: i32, // 订单状态码（与阶段状态码同域）
}

// ==========================================
// Counterparty - 客户摘要
// ==========================================
// 用途: 筛选维度与样品视图的客户名展示
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: i64,      // 客户 ID
    pub name: String, // 客户名称
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_order() -> Order {
        Order {
            numer: 1001,
            oddzial: Some("W1".to_string()),
            rok: Some(2025),
            artykul: Some("ART-100".to_string()),
            receptura: Some("RC-7".to_string()),
            folia_grubosc: None,
            plyta_grubosc: None,
            szerokosc: None,
            ilosc: Some(500.0),
            jednostka: Some("szt".to_string()),
            kontrahent_id: Some(42),
            data_zamowienia: NaiveDate::from_ymd_opt(2025, 3, 10),
            status: 1,
        }
    }

    #[test]
    fn test_order_serde_roundtrip() {
        let order = create_test_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }
}
