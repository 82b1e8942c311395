use aggwalk::source::{load_aggregations, DEFAULT_SECTION};
use aggwalk::{tablify, tablify_with, AccumulatorScope, Error, Frame, WalkOptions};
use arrow2::datatypes::DataType;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/marketing_results.json")
}

#[test]
fn demo_response_flattens_to_registrations_table() {
    let aggs = load_aggregations(demo_path(), DEFAULT_SECTION).unwrap();
    let rows = tablify(&aggs);

    assert_eq!(rows.len(), 5);

    let campaigns: Vec<_> = rows[..3]
        .iter()
        .map(|r| (r["PROJECT"].clone(), r["CAMPAIGN_ID"].clone(), r["MKT_REGISTRATIONS"].clone()))
        .collect();
    assert_eq!(
        campaigns,
        vec![
            (json!("FC"), json!("002"), json!(3.0)),
            (json!("FC"), json!("003"), json!(1.0)),
            (json!("FC"), json!("004"), json!(12.0)),
        ]
    );

    // CHANNEL rows still see the last PROJECT/CAMPAIGN_ID with the shared accumulator
    assert_eq!(rows[3]["CHANNEL"], json!("paid"));
    assert_eq!(rows[3]["CAMPAIGN_ID"], json!("004"));
    assert_eq!(rows[4]["SPEND"], json!(null));
}

#[test]
fn demo_response_per_branch_frame() {
    let aggs = load_aggregations(demo_path(), DEFAULT_SECTION).unwrap();
    let options = WalkOptions {
        scope: AccumulatorScope::PerBranch,
        ..Default::default()
    };
    let rows = tablify_with(&aggs, &options);
    let frame = Frame::from_records(&rows).unwrap();

    assert_eq!(
        frame.column_names(),
        vec!["PROJECT", "CAMPAIGN_ID", "MKT_REGISTRATIONS", "CHANNEL", "SPEND"]
    );
    assert_eq!(frame.num_rows(), 5);

    let schema = frame.schema();
    assert_eq!(schema.fields[0].data_type, DataType::Utf8);
    assert_eq!(schema.fields[2].data_type, DataType::Float64);
    assert_eq!(schema.fields[4].data_type, DataType::Float64);

    let project = frame.column("PROJECT").unwrap();
    assert!(project.is_null(3));
    assert!(project.is_null(4));
    assert_eq!(frame.column("SPEND").unwrap().null_count(), 4);
}

#[test]
fn load_from_custom_section() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"aggs": {{"total": {{"value": 7}}}}}}"#).unwrap();

    let aggs = load_aggregations(file.path(), "aggs").unwrap();
    assert_eq!(tablify(&aggs)[0]["total"], json!(7));

    let err = load_aggregations(file.path(), DEFAULT_SECTION).unwrap_err();
    assert!(matches!(err, Error::MissingSection(_)));
}

#[test]
fn missing_file_reports_path() {
    let err = load_aggregations("/nonexistent/response.json", DEFAULT_SECTION).unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/response.json"));
}
