//! Integration tests for value formatting and records.

use chrono::NaiveDate;
use docfill::format::{normalize_date_input, parse_date_text, serial_to_date};
use docfill::report::add_derived_fields;
use docfill::{
    format_date, format_money, format_value, to_vietnamese_words, FieldRecord, FieldValue,
    FormatOptions, ValueFormatter,
};

#[test]
fn test_serial_matches_iso_date() {
    let iso = parse_date_text("2012-04-01").unwrap();
    assert_eq!(serial_to_date(41000.0), Some(iso));
    assert_eq!(format_date(41000), "01/04/2012");
    assert_eq!(format_date(iso), "01/04/2012");
}

#[test]
fn test_money() {
    assert_eq!(format_money(5_500_000), "5.500.000");
    assert_eq!(format_money(5_500_000.5), "5.500.000,50");
    assert_eq!(format_money("abc"), "abc");
    assert_eq!(format_money(FieldValue::Empty), "");
}

#[test]
fn test_value_by_key() {
    assert_eq!(format_value("ngay_ky", &FieldValue::Integer(44200)), "04/01/2021");
    assert_eq!(format_value("Tong_tien", &FieldValue::from("1250000")), "1.250.000");
    assert_eq!(format_value("Ghi_chu", &FieldValue::from("1250000")), "1250000");
    assert_eq!(format_value("So_luong", &FieldValue::Integer(12000)), "12.000");
    assert_eq!(format_value("Ngay_lap", &FieldValue::from("5/1/2021")), "05/01/2021");
    assert_eq!(format_value("ngay_ky", &FieldValue::from("sắp tới")), "sắp tới");
    assert_eq!(format_value("bat_ky", &FieldValue::Empty), "");
}

#[test]
fn test_serial_for_any_ngay_key() {
    assert_eq!(format_value("ngay_ban_giao", &FieldValue::Integer(44200)), "04/01/2021");
    assert_eq!(format_value("Ngay_kiem_tra", &FieldValue::Decimal(44200.0)), "04/01/2021");
    assert_eq!(
        docfill::InputKind::for_name("ngay_ban_giao"),
        docfill::InputKind::Date
    );
}

#[test]
fn test_custom_options() {
    let formatter = ValueFormatter::new(
        FormatOptions::new()
            .with_date_key("Han_bao_hanh")
            .with_date_pattern("%Y-%m-%d"),
    );
    assert_eq!(
        formatter.format("han_bao_hanh", &FieldValue::Integer(44200)),
        "2021-01-04"
    );
    // below the threshold a number stays a number
    assert_eq!(
        formatter.format("han_bao_hanh", &FieldValue::Integer(2024)),
        "2024"
    );
}

#[test]
fn test_manual_date_input() {
    assert_eq!(normalize_date_input("2024-11-05").as_deref(), Some("05/11/2024"));
    assert_eq!(normalize_date_input(" 5/11/2024 ").as_deref(), Some("05/11/2024"));
    assert_eq!(normalize_date_input("hôm nay"), None);
}

#[test]
fn test_amount_in_words() {
    assert_eq!(to_vietnamese_words(0), "Không");
    assert_eq!(to_vietnamese_words(21), "Hai mươi mốt");
    assert_eq!(to_vietnamese_words(105), "Một trăm lẻ năm");
    assert_eq!(to_vietnamese_words(5_500_000), "Năm triệu năm trăm nghìn");
}

#[test]
fn test_derived_field_scenarios() {
    let mut record: FieldRecord = [("ma_tram", "A12"), ("Loai_cot", "cột dây co")]
        .into_iter()
        .collect();
    add_derived_fields(&mut record);
    assert_eq!(record.text("Danh_gia_cot").as_deref(), Some("Đạt"));

    let mut record: FieldRecord = [("Loai_cot", "cột sắt")].into_iter().collect();
    add_derived_fields(&mut record);
    assert_eq!(record.text("Danh_gia_cot").as_deref(), Some("Không đánh giá"));
}

#[test]
fn test_record_json() {
    let record: FieldRecord = serde_json::from_str(
        r#"{"Ma_tram": "A12", "Tong_tien": 5500000, "Ty_le": 0.25, "Ghi_chu": null}"#,
    )
    .unwrap();
    assert_eq!(record.get("ma_tram"), Some(&FieldValue::from("A12")));
    assert_eq!(record.get("TONG_TIEN"), Some(&FieldValue::Integer(5_500_000)));
    assert_eq!(record.get("tyle"), Some(&FieldValue::Decimal(0.25)));
    assert!(record.get("ghi_chu").is_some_and(FieldValue::is_empty));

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["Ma_tram"], "A12");
    assert_eq!(json["Tong_tien"], 5_500_000);

    let date = FieldValue::from(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
    assert_eq!(format_value("x", &date), "04/01/2021");
}
