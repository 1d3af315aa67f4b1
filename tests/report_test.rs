//! Integration tests for report generation.

mod common;

use common::{body_text, docx, para, part_names, table};
use docfill::report::{hash_secret, DEFAULT_SALT};
use docfill::{
    Error, FieldRecord, FieldValue, InMemorySource, InputKind, MissingField, PhotoSlots,
    ReportGenerator, ReportOptions, ReportOutcome, Session,
};

fn source() -> InMemorySource {
    InMemorySource::new()
        .with_station(
            [
                ("ma_tram", FieldValue::from("A12")),
                ("Ten_tram", FieldValue::from("Trạm Cầu Giấy")),
                ("Password", FieldValue::from(hash_secret("bi-mat", DEFAULT_SALT))),
                ("Loai_cot", FieldValue::from("Cột dây co")),
                ("Phong_may", FieldValue::from("Không thuê")),
            ]
            .into_iter()
            .collect(),
        )
        .with_financial(
            [
                ("Ma_vi_tri", FieldValue::from("A12")),
                ("Thang", FieldValue::from("11/2024")),
                ("Tong_tien", FieldValue::Integer(5_500_000)),
                ("ngay_ky", FieldValue::Integer(44200)),
            ]
            .into_iter()
            .collect(),
        )
}

fn login(src: &InMemorySource, period: &str) -> Session {
    ReportGenerator::default()
        .login(src, "a12", period, "bi-mat")
        .unwrap()
}

fn ready(outcome: ReportOutcome) -> docfill::RenderedReport {
    match outcome {
        ReportOutcome::Ready(report) => report,
        ReportOutcome::NeedsInput(missing) => panic!("unexpected prompt: {:?}", missing),
    }
}

#[test]
fn test_serial_date_is_formatted() {
    let data = docx(&para("$ngay_ky"));
    let record: FieldRecord = [("ngay_ky", FieldValue::Integer(44200))].into_iter().collect();

    let report = ready(
        ReportGenerator::default()
            .generate(&data, &record, &FieldRecord::new(), &PhotoSlots::new(), "A12", "11/2024")
            .unwrap(),
    );
    assert_eq!(body_text(&report.bytes), "04/01/2021");
    assert_eq!(report.replaced, 1);
}

#[test]
fn test_full_session_report() {
    let src = source();
    let mut session = login(&src, "11/2024");
    session.photos.upload(3, &common::png(64, 48)).unwrap();
    session.photos.upload(5, &common::png(16, 16)).unwrap();

    let body = format!(
        "{}{}{}{}",
        para("Trạm: ${Ten_tram} ($ma_tram) - kỳ $Thang"),
        table(&["Cột", "${Danh_gia_cot}", "Phòng máy", "${Danh_gia_PM}"]),
        para("Tổng tiền: ${Tong_tien}; (${Tong_tien_bang_chu} đồng)"),
        para("${Anh3}")
    );
    let data = docx(&body);

    let report = ready(
        ReportGenerator::default()
            .generate_for_session(&data, &session, &src, &FieldRecord::new())
            .unwrap(),
    );

    assert_eq!(
        body_text(&report.bytes),
        "Trạm: Trạm Cầu Giấy (A12) - kỳ 11/2024\n\
         Cột\nĐạt\nPhòng máy\nKhông đánh giá\n\
         Tổng tiền: 5.500.000 (Năm triệu năm trăm nghìn đồng)\n"
    );
    assert_eq!(report.inserted_slots, vec![3]);
    assert!(report.filename.starts_with("BBNT_A12_11-2024_"));
    assert!(report.filename.ends_with(".docx"));
    assert!(part_names(&report.bytes)
        .iter()
        .any(|n| n == "word/media/docfill_image1.jpeg"));
}

#[test]
fn test_missing_period_halts_before_template() {
    let src = source();
    let session = login(&src, "12/2024");

    // Not a template at all: the period check must fail first.
    let result = ReportGenerator::default().generate_for_session(
        b"not a docx",
        &session,
        &src,
        &FieldRecord::new(),
    );
    match result {
        Err(Error::NoDataForPeriod { station, period }) => {
            assert_eq!(station, "A12");
            assert_eq!(period, "12/2024");
        }
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_unknown_station_is_distinct() {
    let result = ReportGenerator::default().login(&source(), "Z99", "11/2024", "bi-mat");
    assert!(matches!(result, Err(Error::StationNotFound(code)) if code == "Z99"));

    let result = ReportGenerator::default().login(&source(), "A12", "11/2024", "sai");
    assert!(matches!(result, Err(Error::InvalidCredentials)));
}

#[test]
fn test_prompt_then_retry() {
    let data = docx(&format!(
        "{}{}",
        para("Ghi chú: ${Ghi_chu}"),
        para("Ngày nghiệm thu: $ngay_nghiem_thu")
    ));
    let record: FieldRecord = [("ma_tram", "A12")].into_iter().collect();
    let generator = ReportGenerator::default();

    let first = generator
        .generate(&data, &record, &FieldRecord::new(), &PhotoSlots::new(), "A12", "11/2024")
        .unwrap();
    match first {
        ReportOutcome::NeedsInput(missing) => assert_eq!(
            missing,
            vec![
                MissingField {
                    name: "Ghi_chu".into(),
                    kind: InputKind::Text
                },
                MissingField {
                    name: "ngay_nghiem_thu".into(),
                    kind: InputKind::Date
                },
            ]
        ),
        ReportOutcome::Ready(_) => panic!("expected a prompt"),
    }

    let manual: FieldRecord = [("Ghi_chu", "Đạt yêu cầu"), ("ngay_nghiem_thu", "2024-11-05")]
        .into_iter()
        .collect();
    let report = ready(
        generator
            .generate(&data, &record, &manual, &PhotoSlots::new(), "A12", "11/2024")
            .unwrap(),
    );
    assert_eq!(
        body_text(&report.bytes),
        "Ghi chú: Đạt yêu cầu\nNgày nghiệm thu: 05/11/2024"
    );
}

#[test]
fn test_plan_is_a_dry_run() {
    let data = docx(&format!("{}{}", para("$Ten_tram"), para("$Anh1 $Anh2")));
    let record: FieldRecord = [("ten_tram", "Trạm A12")].into_iter().collect();

    let plan = ReportGenerator::default()
        .plan(&data, &record, &FieldRecord::new())
        .unwrap();
    assert!(plan.is_complete());
    assert_eq!(plan.values["Ten_tram"], "Trạm A12");
    assert_eq!(plan.images, vec!["Anh1", "Anh2"]);
}

#[test]
fn test_custom_prefix_and_unfilled_slot() {
    let data = docx(&para("$ma_tram"));
    let record: FieldRecord = [("ma_tram", "A12")].into_iter().collect();
    let mut photos = PhotoSlots::new();
    photos.upload(8, &common::png(4, 4)).unwrap();

    let generator = ReportGenerator::new(ReportOptions::new().with_filename_prefix("BB"));
    let report = ready(
        generator
            .generate(&data, &record, &FieldRecord::new(), &photos, "A12", "Q4 2024")
            .unwrap(),
    );
    assert!(report.inserted_slots.is_empty());
    assert!(report.filename.starts_with("BB_A12_Q4-2024_"));
    assert!(!part_names(&report.bytes)
        .iter()
        .any(|n| n.starts_with("word/media/")));
}

#[test]
fn test_manual_note_keeps_dollar_text() {
    let data = docx(&format!("{}{}", para("$ma_tram"), para("Ghi chú: ${Ghi_chu}")));
    let record: FieldRecord = [("ma_tram", "A12")].into_iter().collect();
    let manual: FieldRecord = [("Ghi_chu", "giá $ma_tram USD")].into_iter().collect();

    let report = ready(
        ReportGenerator::default()
            .generate(&data, &record, &manual, &PhotoSlots::new(), "A12", "11/2024")
            .unwrap(),
    );
    assert_eq!(body_text(&report.bytes), "A12\nGhi chú: giá $ma_tram USD");
}

#[test]
fn test_any_ngay_field_gets_a_date() {
    let data = docx(&para("Bàn giao: $ngay_ban_giao"));
    let record: FieldRecord = [("ngay_ban_giao", FieldValue::Integer(44200))]
        .into_iter()
        .collect();

    let report = ready(
        ReportGenerator::default()
            .generate(&data, &record, &FieldRecord::new(), &PhotoSlots::new(), "A12", "11/2024")
            .unwrap(),
    );
    assert_eq!(body_text(&report.bytes), "Bàn giao: 04/01/2021");
}
