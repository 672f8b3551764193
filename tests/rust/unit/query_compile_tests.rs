use redframe::dialect::{builtin_extractor, CompiledStatement, ParamStyle, Params};
use redframe::query::{Direction, Op, Query, QueryError};
use redframe::table::Value;
use test_case::test_case;

fn widgets_query() -> Query {
    Query::select_all("widgets")
        .columns(["name", "units"])
        .filter("kind", Op::Eq, "fizzer")
        .between("units", 10, 12)
        .is_null("retired_at")
        .order_by("units", Direction::Desc)
        .limit(10)
        .offset(5)
}

#[test_case(ParamStyle::Qmark,
    "SELECT name, units FROM widgets WHERE kind = ? AND units BETWEEN ? AND ? AND retired_at IS NULL ORDER BY units DESC LIMIT ? OFFSET ?";
    "qmark")]
#[test_case(ParamStyle::Numeric,
    "SELECT name, units FROM widgets WHERE kind = $1 AND units BETWEEN $2 AND $3 AND retired_at IS NULL ORDER BY units DESC LIMIT $4 OFFSET $5";
    "numeric")]
#[test_case(ParamStyle::Pyformat,
    "SELECT name, units FROM widgets WHERE kind = %(param_1)s AND units BETWEEN %(param_2)s AND %(param_3)s AND retired_at IS NULL ORDER BY units DESC LIMIT %(param_4)s OFFSET %(param_5)s";
    "pyformat")]
fn test_compile_styles(style: ParamStyle, expected: &str) {
    let compiled = widgets_query().compile(style).unwrap();
    assert_eq!(compiled.sql, expected);
    assert_eq!(compiled.binds.len(), 5);
}

#[test]
fn test_builtin_extractors_by_shape() {
    let compiled: CompiledStatement = widgets_query().compile(ParamStyle::Qmark).unwrap();

    let positional = builtin_extractor("sqlite").unwrap()(&compiled);
    assert_eq!(
        positional,
        Params::Positional(vec![
            Value::from("fizzer"),
            Value::Int(10),
            Value::Int(12),
            Value::Int(10),
            Value::Int(5),
        ])
    );

    let named = builtin_extractor("postgresql").unwrap()(&compiled);
    match named {
        Params::Named(map) => {
            assert_eq!(map.get("param_1"), Some(&Value::from("fizzer")));
            assert_eq!(map.get("param_5"), Some(&Value::Int(5)));
        }
        other => panic!("expected named params, got {:?}", other),
    }

    assert!(builtin_extractor("oracle").is_none());
}

#[test]
fn test_invalid_identifiers() {
    let err = Query::select_all("widgets; DROP TABLE widgets")
        .compile(ParamStyle::Qmark)
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidIdentifier { .. }));

    assert_eq!(
        Query::select_all("").compile(ParamStyle::Qmark),
        Err(QueryError::EmptyRelation)
    );
}

#[test]
fn test_limit_out_of_range() {
    let err = Query::select_all("widgets")
        .limit(u64::MAX)
        .compile(ParamStyle::Qmark)
        .unwrap_err();
    assert!(matches!(err, QueryError::OutOfRange { clause: "limit", .. }));
}
