use redframe::bridge::{materialize, parse};
use redframe::engine::{MemoryEngine, ResultSet};
use redframe::materializer::{MaterializeError, Materializer};
use redframe::model::{Model, ModelDescriptor, ModelError};
use redframe::parser::{parse_records, ParseOptions};
use redframe::query::{Direction, Op, Query};
use redframe::table::{Index, ReadOptions, Table, Value};
use serial_test::serial;
use test_case::test_case;

use super::fixtures::{expected_widgets, widget_engine, widget_rows, Widget};

fn parse_all(table: Table, options: impl Into<ParseOptions>) -> Vec<Widget> {
    parse::<Widget>(table, options)
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test_case("sqlite"; "sqlite positional")]
#[test_case("clickhouse"; "clickhouse positional")]
#[test_case("postgresql"; "postgresql named")]
fn test_round_trip(dialect: &str) {
    let engine = widget_engine(dialect);
    let table = materialize::<Widget>(&engine, None, ReadOptions::new()).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(parse_all(table, false), expected_widgets());
}

// mysql's global entry is swapped out by the registry override test
#[test]
#[serial]
fn test_round_trip_mysql() {
    let engine = widget_engine("mysql");
    let query = Query::for_model(Widget::descriptor()).filter("kind", Op::NotEq, "buzzer");
    let table = materialize::<Widget>(&engine, Some(query), ReadOptions::new()).unwrap();
    assert!(!engine.executed()[0].params.is_positional());

    let mut expected = expected_widgets();
    expected.remove(1);
    assert_eq!(parse_all(table, false), expected);
}

#[test]
fn test_indexed_scenario() {
    let engine = widget_engine("sqlite");
    let table =
        materialize::<Widget>(&engine, None, ReadOptions::new().index_col("timestamp")).unwrap();
    assert_eq!(table.index_name(), Some("timestamp"));
    assert!(table.column_position("timestamp").is_none());

    let widgets = parse_all(table, true);
    assert_eq!(widgets, expected_widgets());
}

#[test]
fn test_index_not_injected_without_parse_index() {
    let engine = widget_engine("sqlite");
    let table =
        materialize::<Widget>(&engine, None, ReadOptions::new().index_col("timestamp")).unwrap();

    let widgets = parse_all(table, false);
    assert_eq!(widgets.len(), 3);
    assert!(widgets.iter().all(|w| w.timestamp.is_none()));
}

#[test]
fn test_extra_column_is_tolerated() {
    let rows = widget_rows();
    let table = Table::new(rows.columns, rows.rows).unwrap();
    assert!(table.column_position("colour").is_some());
    assert_eq!(parse_all(table, false), expected_widgets());
}

#[test]
fn test_strict_mode_rejects_extra_column() {
    let rows = widget_rows();
    let table = Table::new(rows.columns, rows.rows).unwrap();
    let results: Vec<_> = parse::<Widget>(table, ParseOptions::new().strict(true)).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        Err(ModelError::UndeclaredColumns { columns, .. }) if columns == &["colour".to_string()]
    ));
}

#[test]
fn test_empty_relation() {
    let engine = MemoryEngine::new("sqlite").with_relation(
        "widgets",
        ResultSet::new(
            vec!["timestamp".into(), "name".into(), "kind".into(), "units".into()],
            Vec::new(),
        ),
    );
    let table = materialize::<Widget>(&engine, None, ReadOptions::new()).unwrap();
    assert!(table.is_empty());
    assert_eq!(parse::<Widget>(table, false).count(), 0);
}

#[test]
fn test_parse_index_on_unnamed_index() {
    let table = Table::new(
        vec!["name".into(), "kind".into(), "units".into()],
        vec![vec!["foo".into(), "fizzer".into(), Value::Int(10)]],
    )
    .unwrap()
    .with_index(Index::unnamed(vec![Value::Int(0)]))
    .unwrap();
    assert_eq!(
        parse_all(table, true),
        vec![Widget::new(None, "foo", "fizzer", 10)]
    );
}

#[test]
fn test_missing_required_field() {
    let table = Table::from_records(vec![
        vec![("units", Value::Int(10)), ("name", Value::from("foo"))],
        vec![("name", Value::from("goo")), ("units", Value::Int(11))],
    ])
    .unwrap();
    let results: Vec<_> = parse::<Widget>(table, false).collect();
    assert_eq!(
        results,
        vec![
            Err(ModelError::missing("Widget", "kind")),
            Err(ModelError::missing("Widget", "kind")),
        ]
    );
}

#[test_case("sqlite"; "positional")]
#[test_case("postgresql"; "named")]
fn test_filtered_query(dialect: &str) {
    let engine = widget_engine(dialect);
    let query = Query::for_model(Widget::descriptor())
        .filter("units", Op::GtEq, 11)
        .order_by("units", Direction::Desc)
        .limit(1);
    let table = materialize::<Widget>(&engine, Some(query), ReadOptions::new()).unwrap();
    assert_eq!(
        parse_all(table, false),
        vec![Widget::new(Some(1002), "hoo", "bopper", 12)]
    );
}

#[test]
fn test_option_merge() {
    let descriptor = ModelDescriptor::new("Event", "events", ["id", "ts"])
        .with_read_options(ReadOptions::new().parse_dates(["ts"]));
    let engine = MemoryEngine::new("sqlite").with_relation(
        "events",
        ResultSet::new(
            vec!["id".into(), "ts".into()],
            vec![
                vec![Value::Int(1), "2024-03-01 12:00:00".into()],
                vec![Value::Int(2), Value::Null],
            ],
        ),
    );
    let materializer = Materializer::new();

    let spec = materializer
        .read_spec_for(&engine, &descriptor, None, ReadOptions::new().index_col("id"))
        .unwrap();
    assert_eq!(
        spec.options,
        ReadOptions::new().index_col("id").parse_dates(["ts"])
    );

    let table = spec.read(&engine).unwrap();
    assert_eq!(
        table,
        materializer
            .materialize_descriptor(&engine, &descriptor, None, ReadOptions::new().index_col("id"))
            .unwrap()
    );
    assert_eq!(table.index_name(), Some("id"));
    assert!(matches!(table.get(0, "ts"), Some(Value::Timestamp(_))));
    assert_eq!(table.get(1, "ts"), Some(&Value::Null));

    let records: Vec<_> = parse_records(table, &descriptor, ParseOptions::from(true))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records[1].get("id"), Some(&Value::Int(2)));
}

#[test]
fn test_engine_errors_pass_through() {
    let engine = MemoryEngine::new("sqlite");
    let err = materialize::<Widget>(&engine, None, ReadOptions::new()).unwrap_err();
    assert!(matches!(err, MaterializeError::Engine(_)));
    assert!(err.to_string().contains("no such table: widgets"));
}

#[test]
fn test_unknown_index_col() {
    let engine = widget_engine("sqlite");
    let err = materialize::<Widget>(&engine, None, ReadOptions::new().index_col("colour"))
        .unwrap_err();
    assert!(matches!(err, MaterializeError::Read(_)));
}
