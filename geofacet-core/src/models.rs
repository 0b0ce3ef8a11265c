use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";
pub const ID_FIELD: &str = "id";

/// A single field of a dataset record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Convert a raw JSON value; `null` and nested objects carry nothing we can facet on
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
            Value::Array(arr) => {
                let values: Vec<String> = arr.iter().filter_map(scalar_to_string).collect();
                Some(FieldValue::List(values))
            }
            Value::Null | Value::Object(_) => None,
        }
    }

    /// All string forms of the value (one per list element)
    pub fn values(&self) -> Vec<Cow<'_, str>> {
        match self {
            FieldValue::Number(n) => vec![Cow::Owned(format_number(*n))],
            FieldValue::Text(s) => vec![Cow::Borrowed(s.as_str())],
            FieldValue::List(values) => values.iter().map(|v| Cow::Borrowed(v.as_str())).collect(),
        }
    }

    /// Display form; list elements are joined with ", "
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
            FieldValue::Text(s) => Cow::Borrowed(s.as_str()),
            FieldValue::List(values) => Cow::Owned(values.join(", ")),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            FieldValue::List(_) => None,
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Render a number the way it appears as a bucket key: integral values drop the fraction
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// An immutable dataset record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    pub location: Option<GeoPoint>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Item {
    /// Build an item from one flat JSON record
    /// `position` is the record's index in the dataset and the fallback identifier
    pub fn from_record(position: usize, record: &Value) -> Result<Self> {
        let object = record.as_object().ok_or_else(|| {
            Error::InvalidDataset(vec![format!(
                "Record #{}: expected an object, found {}",
                position + 1,
                json_type_name(record)
            )])
        })?;

        let fields: BTreeMap<String, FieldValue> = object
            .iter()
            .filter_map(|(key, value)| FieldValue::from_json(value).map(|v| (key.clone(), v)))
            .collect();

        let id = fields
            .get(ID_FIELD)
            .and_then(|v| match v {
                FieldValue::List(_) => None,
                scalar => Some(scalar.as_text().into_owned()),
            })
            .unwrap_or_else(|| position.to_string());

        let location = match (
            fields.get(LATITUDE_FIELD).and_then(FieldValue::as_number),
            fields.get(LONGITUDE_FIELD).and_then(FieldValue::as_number),
        ) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Self {
            id,
            location,
            fields,
        })
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Every string value of a field; empty when the field is absent
    pub fn values(&self, field: &str) -> Vec<Cow<'_, str>> {
        self.fields.get(field).map(FieldValue::values).unwrap_or_default()
    }

    pub fn get_as_string(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(|v| v.as_text().into_owned())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
