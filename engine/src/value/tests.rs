use std::path::PathBuf;

use googletest::prelude::*;

use super::*;

#[gtest]
fn test_kind_matches_variant() {
    expect_that!(Value::File(PathBuf::from("a")).kind(), eq(ValueKind::File));
    expect_that!(Value::Text("a".into()).kind(), eq(ValueKind::Text));
    expect_that!(Value::Int(1).kind(), eq(ValueKind::Int));
    expect_that!(Value::Float(1.5).kind(), eq(ValueKind::Float));
    expect_that!(Value::Bool(true).kind(), eq(ValueKind::Bool));
}

#[gtest]
fn test_file_label_is_file_name() {
    let value = Value::File(PathBuf::from("some/dir/foo.txt"));

    expect_that!(value.label(), eq("foo.txt"));
}

#[gtest]
fn test_non_file_label_is_display_form() {
    expect_that!(Value::Text("hello".into()).label(), eq("hello"));
    expect_that!(Value::Int(42).label(), eq("42"));
    expect_that!(Value::Bool(false).label(), eq("false"));
}

#[gtest]
fn test_file_display_is_full_path() {
    let value = Value::File(PathBuf::from("some/dir/foo.txt"));

    expect_that!(value.to_string(), eq("some/dir/foo.txt"));
}

#[gtest]
fn test_serde_round_trip() -> anyhow::Result<()> {
    let value = Value::File(PathBuf::from("foo.txt"));

    let json = serde_json::to_string(&value)?;
    let parsed: Value = serde_json::from_str(&json)?;
    expect_that!(&parsed, eq(&value));

    Ok(())
}
