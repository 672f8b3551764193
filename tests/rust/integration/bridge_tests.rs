use lazy_static::lazy_static;
use redframe::bridge::{frame, materialize, parse, Bridge, DefaultBridge, ParsedModels};
use redframe::dialect::{CompiledStatement, DialectRegistry, ParamStyle, Params};
use redframe::engine::Engine;
use redframe::materializer::{MaterializeError, Materializer};
use redframe::model::{FieldMap, Model, ModelDescriptor, ModelError};
use redframe::parser::{parse_models, ParseOptions};
use redframe::query::{Op, Query};
use redframe::table::{ReadOptions, Table, Value};
use serial_test::serial;

use super::fixtures::{expected_widgets, widget_engine, Widget};

lazy_static! {
    static ref SHOUTY: ModelDescriptor =
        ModelDescriptor::new("Shouty", "widgets", ["name", "units"]);
}

/// Widget names, upper-cased on the way in, heaviest first
#[derive(Debug, PartialEq)]
struct Shouty {
    name: String,
    units: i64,
}

impl Model for Shouty {
    fn descriptor() -> &'static ModelDescriptor {
        &SHOUTY
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, ModelError> {
        Ok(Shouty {
            name: fields.take_required("name")?,
            units: fields.take_required("units")?,
        })
    }

    fn bridge() -> Box<dyn Bridge<Self>> {
        Box::new(ShoutyBridge {
            materializer: Materializer::new(),
        })
    }
}

struct ShoutyBridge {
    materializer: Materializer,
}

impl Bridge<Shouty> for ShoutyBridge {
    fn materialize(
        &self,
        engine: &dyn Engine,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<Table, MaterializeError> {
        let query = query.unwrap_or_else(|| {
            Query::for_model(Shouty::descriptor())
                .order_by("units", redframe::query::Direction::Desc)
        });
        self.materializer
            .materialize::<Shouty>(engine, Some(query), options)
    }

    fn parse(&self, table: Table, options: ParseOptions) -> ParsedModels<Shouty> {
        Box::new(parse_models::<Shouty>(table, options).map(|shouty| {
            shouty.map(|s| Shouty {
                name: s.name.to_uppercase(),
                units: s.units,
            })
        }))
    }
}

#[test]
fn test_model_bridge_override() {
    let engine = widget_engine("sqlite");
    let table = materialize::<Shouty>(&engine, None, ReadOptions::new()).unwrap();
    let names: Vec<String> = parse::<Shouty>(table, false)
        .map(|s| s.unwrap().name)
        .collect();
    assert_eq!(names, vec!["HOO", "GOO", "FOO"]);
    assert_eq!(
        engine.executed()[0].sql,
        "SELECT name, units FROM widgets ORDER BY units DESC"
    );
}

#[test]
#[serial]
fn test_default_bridge_is_used_otherwise() {
    let engine = widget_engine("mysql");
    let table = materialize::<Widget>(&engine, None, ReadOptions::new()).unwrap();
    let widgets: Vec<Widget> = parse::<Widget>(table, false)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(widgets, expected_widgets());
}

#[test]
fn test_default_bridge_with_injected_materializer() {
    let mut registry = DialectRegistry::empty();
    registry.register("duckdb", |c: &CompiledStatement| {
        Params::Positional(c.positional_values())
    });
    let bridge = DefaultBridge::with_materializer(Materializer::with_registry(registry));
    let engine = widget_engine("duckdb").with_param_style(ParamStyle::Qmark);

    let query = Query::for_model(Widget::descriptor()).filter("name", Op::Eq, "hoo");
    let table = Bridge::<Widget>::materialize(&bridge, &engine, Some(query), ReadOptions::new())
        .unwrap();
    let widgets: Vec<Widget> = Bridge::<Widget>::parse(&bridge, table, ParseOptions::new())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(widgets, vec![expected_widgets().remove(2)]);

    // the process-wide registry knows nothing about duckdb
    assert!(materialize::<Widget>(&engine, None, ReadOptions::new()).is_err());
}

#[test]
fn test_frame_applies_transformations_in_order() {
    let engine = widget_engine("sqlite");
    let heavy = |table: Table| {
        table.filter_rows(|_: &[String], row: &[Value]| {
            matches!(row[3], Value::Int(units) if units >= 11)
        })
    };
    let names_only = |table: Table| table.select(&["name".to_string()]).expect("name column");
    let transformations: [&dyn Fn(Table) -> Table; 2] = [&heavy, &names_only];

    let table =
        frame::<Widget>(&engine, None, ReadOptions::new(), &transformations).unwrap();
    assert_eq!(table.columns(), &["name".to_string()]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.get(0, "name"), Some(&Value::from("goo")));
}

#[test]
fn test_frame_without_transformations() {
    let engine = widget_engine("sqlite");
    let table = frame::<Widget>(&engine, None, ReadOptions::new(), &[]).unwrap();
    assert_eq!(table.len(), 3);
}
