use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use super::ViewName;

/// One table cell: text or a checkbox
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Flag(bool),
}

impl Cell {
    /// Text rendering of the cell, booleans become "Sí"/"No"
    pub fn display(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Flag(true) => "Sí".to_string(),
            Cell::Flag(false) => "No".to_string(),
        }
    }

    /// Numbers keep their text, anything else becomes an empty cell
    fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => Cell::Text(text),
            Value::Bool(flag) => Cell::Flag(flag),
            Value::Number(number) => Cell::Text(number.to_string()),
            _ => Cell::Text(String::new()),
        }
    }
}

/// Positional row of a tabular section
pub type Row = Vec<Cell>;

/// Gallery entry such as `{ "imagen": <data-uri>, "descripcion": "..." }`
pub type Item = BTreeMap<String, String>;

/// Value of a single field in a view's data bag
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Rows(Vec<Row>),
    Items(Vec<Item>),
}

impl FieldValue {
    /// Shape a stored JSON value; `None` when it fits no field kind
    fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(FieldValue::Text(text)),
            Value::Bool(flag) => Some(FieldValue::Flag(flag)),
            Value::Array(entries) if entries.iter().all(Value::is_array) => {
                let rows = entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::Array(cells) => cells.into_iter().map(Cell::from_json).collect(),
                        _ => Row::new(),
                    })
                    .collect();
                Some(FieldValue::Rows(rows))
            }
            Value::Array(entries) if entries.iter().all(Value::is_object) => {
                let items = entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Value::Object(fields) => Some(
                            fields
                                .into_iter()
                                .filter_map(|(key, value)| match value {
                                    Value::String(text) => Some((key, text)),
                                    Value::Number(number) => Some((key, number.to_string())),
                                    _ => None,
                                })
                                .collect(),
                        ),
                        _ => None,
                    })
                    .collect();
                Some(FieldValue::Items(items))
            }
            _ => None,
        }
    }
}

/// Plain snapshot of one view's field values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewData(BTreeMap<String, FieldValue>);

/// Entries that fit no field kind are dropped so one odd value never
/// costs the rest of the bag
impl<'de> Deserialize<'de> for ViewData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let fields = raw
            .into_iter()
            .filter_map(|(key, value)| match FieldValue::from_json(value) {
                Some(field) => Some((key, field)),
                None => {
                    warn!(field = %key, "Ignoring stored value of unexpected type");
                    None
                }
            })
            .collect();
        Ok(ViewData(fields))
    }
}

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    pub fn set_text(&mut self, key: &str, value: &str) {
        self.insert(key, FieldValue::Text(value.to_string()));
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.insert(key, FieldValue::Flag(value));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(FieldValue::Flag(flag)) => Some(*flag),
            Some(FieldValue::Text(text)) => match text.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Rows of a table field. An empty item list reads as an empty table.
    pub fn rows(&self, key: &str) -> Option<&[Row]> {
        match self.0.get(key) {
            Some(FieldValue::Rows(rows)) => Some(rows),
            Some(FieldValue::Items(items)) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// Items of a gallery field. `[]` parses as rows, so accept that too.
    pub fn items(&self, key: &str) -> Option<&[Item]> {
        match self.0.get(key) {
            Some(FieldValue::Items(items)) => Some(items),
            Some(FieldValue::Rows(rows)) if rows.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

/// The four view bags; a struct so every key is always present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewDataMap {
    pub vista1: ViewData,
    pub vista2: ViewData,
    pub vista3: ViewData,
    pub vista4: ViewData,
}

impl ViewDataMap {
    pub fn get(&self, view: ViewName) -> &ViewData {
        match view {
            ViewName::Vista1 => &self.vista1,
            ViewName::Vista2 => &self.vista2,
            ViewName::Vista3 => &self.vista3,
            ViewName::Vista4 => &self.vista4,
        }
    }

    pub fn get_mut(&mut self, view: ViewName) -> &mut ViewData {
        match view {
            ViewName::Vista1 => &mut self.vista1,
            ViewName::Vista2 => &mut self.vista2,
            ViewName::Vista3 => &mut self.vista3,
            ViewName::Vista4 => &mut self.vista4,
        }
    }

    pub fn set(&mut self, view: ViewName, data: ViewData) {
        *self.get_mut(view) = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_shapes_from_json() {
        let data: ViewData = serde_json::from_str(
            r#"{
                "articulo": "A-99",
                "aprobado": true,
                "materiales": [["Denim", "Textil Sur", true]],
                "muestraMateriales": [{"descripcion": "botón", "imagen": ""}],
                "vacio": []
            }"#,
        )
        .unwrap();

        assert_eq!(data.text("articulo"), Some("A-99"));
        assert_eq!(data.flag("aprobado"), Some(true));
        assert_eq!(
            data.rows("materiales").unwrap()[0],
            vec![
                Cell::Text("Denim".into()),
                Cell::Text("Textil Sur".into()),
                Cell::Flag(true)
            ]
        );
        assert_eq!(data.items("muestraMateriales").unwrap()[0]["descripcion"], "botón");
        assert_eq!(data.items("vacio"), Some(&[][..]));
        assert_eq!(data.rows("vacio"), Some(&[][..]));
    }

    #[test]
    fn test_mismatched_types_read_as_absent() {
        let mut data = ViewData::new();
        data.set_flag("articulo", true);
        assert_eq!(data.text("articulo"), None);
        assert_eq!(data.rows("articulo"), None);
    }

    #[test]
    fn test_map_requires_all_keys() {
        let result = serde_json::from_str::<ViewDataMap>(
            r#"{"vista1": {}, "vista2": {}, "vista4": {}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unexpected_values_are_dropped_not_fatal() {
        let data: ViewData = serde_json::from_str(
            r#"{
                "articulo": "A-99",
                "legacyCount": 5,
                "fecha": null,
                "extra": {"nested": true},
                "mezcla": [["a"], {"b": "c"}]
            }"#,
        )
        .unwrap();

        assert_eq!(data.text("articulo"), Some("A-99"));
        assert_eq!(data.text("legacyCount"), None);
        assert_eq!(data.text("fecha"), None);
        assert_eq!(data.rows("mezcla"), None);
        assert_eq!(serde_json::to_value(&data).unwrap(), serde_json::json!({"articulo": "A-99"}));
    }

    #[test]
    fn test_odd_cells_are_coerced() {
        let data: ViewData = serde_json::from_str(
            r#"{
                "materiales": [["Denim", 3, null, true]],
                "muestraMateriales": [{"descripcion": "botón", "imagen": null, "orden": 2}]
            }"#,
        )
        .unwrap();

        assert_eq!(
            data.rows("materiales").unwrap()[0],
            vec![
                Cell::Text("Denim".into()),
                Cell::Text("3".into()),
                Cell::Text(String::new()),
                Cell::Flag(true)
            ]
        );
        let item = &data.items("muestraMateriales").unwrap()[0];
        assert_eq!(item["descripcion"], "botón");
        assert_eq!(item["orden"], "2");
        assert!(!item.contains_key("imagen"));
    }
}
