use lazy_static::lazy_static;
use redframe::engine::{MemoryEngine, ResultSet};
use redframe::model::{FieldMap, Model, ModelDescriptor, ModelError};
use redframe::table::Value;

lazy_static! {
    static ref WIDGET: ModelDescriptor =
        ModelDescriptor::new("Widget", "widgets", ["timestamp", "name", "kind", "units"]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub timestamp: Option<i64>,
    pub name: String,
    pub kind: String,
    pub units: i64,
}

impl Widget {
    pub fn new(timestamp: Option<i64>, name: &str, kind: &str, units: i64) -> Self {
        Self {
            timestamp,
            name: name.to_string(),
            kind: kind.to_string(),
            units,
        }
    }
}

impl Model for Widget {
    fn descriptor() -> &'static ModelDescriptor {
        &WIDGET
    }

    fn from_fields(mut fields: FieldMap) -> Result<Self, ModelError> {
        Ok(Widget {
            timestamp: fields.take_optional("timestamp")?,
            name: fields.take_required("name")?,
            kind: fields.take_required("kind")?,
            units: fields.take_required("units")?,
        })
    }
}

/// The three-row widget relation, plus an undeclared `colour` column
pub fn widget_rows() -> ResultSet {
    ResultSet::new(
        vec![
            "timestamp".into(),
            "name".into(),
            "kind".into(),
            "units".into(),
            "colour".into(),
        ],
        vec![
            vec![Value::Int(1000), "foo".into(), "fizzer".into(), Value::Int(10), "red".into()],
            vec![Value::Int(1001), "goo".into(), "buzzer".into(), Value::Int(11), "green".into()],
            vec![Value::Int(1002), "hoo".into(), "bopper".into(), Value::Int(12), "blue".into()],
        ],
    )
}

pub fn widget_engine(dialect: &str) -> MemoryEngine {
    MemoryEngine::new(dialect).with_relation("widgets", widget_rows())
}

pub fn expected_widgets() -> Vec<Widget> {
    vec![
        Widget::new(Some(1000), "foo", "fizzer", 10),
        Widget::new(Some(1001), "goo", "buzzer", 11),
        Widget::new(Some(1002), "hoo", "bopper", 12),
    ]
}
