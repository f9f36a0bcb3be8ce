//! JSON dataset loading (pandas `records` and `columns` layouts).

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::frame::{Column, FeatureFrame};
use crate::error::{Error, Result};

/// Read a JSON file into a [`FeatureFrame`].
pub fn read_json(path: &Path) -> Result<FeatureFrame> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::Dataset(format!("Failed to parse JSON {}: {e}", path.display())))?;
    frame_from_json(&value)
        .map_err(|e| Error::Dataset(format!("{}: {e}", path.display())))
}

/// Build a frame from either `[{col: v, ...}, ...]` (records) or
/// `{col: [v, ...]}` / `{col: {"0": v, ...}}` (columns).
pub fn frame_from_json(value: &Value) -> std::result::Result<FeatureFrame, String> {
    let raw = match value {
        Value::Array(rows) => records_to_columns(rows)?,
        Value::Object(map) => map
            .iter()
            .map(|(name, col)| Ok((name.clone(), column_values(name, col)?)))
            .collect::<std::result::Result<BTreeMap<_, _>, String>>()?,
        other => return Err(format!("expected an array or object at top level, got {other}")),
    };

    let mut frame = FeatureFrame::new();
    for (name, values) in raw {
        frame.insert(name, infer_column(&values)).map_err(|e| e.to_string())?;
    }
    Ok(frame)
}

fn records_to_columns(rows: &[Value]) -> std::result::Result<BTreeMap<String, Vec<Value>>, String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        let obj = row.as_object().ok_or("records layout expects an array of objects")?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    Ok(names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter()
                .map(|row| row.get(&name).cloned().unwrap_or(Value::Null))
                .collect();
            (name, values)
        })
        .collect())
}

fn column_values(name: &str, col: &Value) -> std::result::Result<Vec<Value>, String> {
    match col {
        Value::Array(values) => Ok(values.clone()),
        Value::Object(indexed) => {
            let mut entries: Vec<(u64, &Value)> = indexed
                .iter()
                .map(|(k, v)| k.parse::<u64>().map(|i| (i, v)))
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| format!("column '{name}' has a non-integer row index"))?;
            entries.sort_by_key(|(i, _)| *i);
            Ok(entries.into_iter().map(|(_, v)| v.clone()).collect())
        }
        _ => Err(format!("column '{name}' is neither an array nor an indexed object")),
    }
}

/// All-number (or null) columns become numeric; anything else is text.
fn infer_column(values: &[Value]) -> Column {
    let numeric = values.iter().all(|v| v.is_number() || v.is_null());
    if numeric {
        Column::Numeric(values.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect())
    } else {
        Column::Text(
            values
                .iter()
                .map(|v| match v {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect(),
        )
    }
}
