use serde_json::{Map, Value};

use crate::domain::{
    analysis::schema::{BoundedField, PayloadSchema},
    common::entities::app_errors::ExtractionError,
};

/// Reconciles a partial model payload with the stage schema.
///
/// Objects merge key by key, arrays are only accepted when array-shaped and
/// scalar leaves only when scalar. Keys the schema does not declare are kept
/// as reported. Bounded numeric leaves fall back to their floor when missing,
/// non-numeric or out of range.
pub fn merge(extracted: &Value, schema: &PayloadSchema) -> Value {
    let mut merged = merge_shape(&schema.defaults, Some(extracted));

    for field in &schema.bounded {
        apply_bound(&mut merged, field);
    }

    merged
}

/// Fails when a top-level key the stage depends on is missing or null.
pub fn ensure_required(extracted: &Value, schema: &PayloadSchema) -> Result<(), ExtractionError> {
    let missing: Vec<&str> = schema
        .required
        .iter()
        .copied()
        .filter(|key| extracted.get(*key).is_none_or(Value::is_null))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExtractionError::InvalidStructure {
            reason: format!("missing required fields: {}", missing.join(", ")),
        })
    }
}

fn merge_shape(default: &Value, extracted: Option<&Value>) -> Value {
    match (default, extracted) {
        (Value::Object(defaults), Some(Value::Object(reported))) => {
            let mut out = Map::new();
            for (key, default_value) in defaults {
                out.insert(key.clone(), merge_shape(default_value, reported.get(key)));
            }
            for (key, value) in reported {
                if !defaults.contains_key(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
            Value::Object(out)
        }
        (Value::Object(defaults), _) => {
            let mut out = Map::new();
            for (key, default_value) in defaults {
                out.insert(key.clone(), merge_shape(default_value, None));
            }
            Value::Object(out)
        }
        (Value::Array(_), Some(reported @ Value::Array(_))) => reported.clone(),
        (Value::Array(_), _) => Value::Array(Vec::new()),
        (_, Some(Value::Object(_) | Value::Array(_))) | (_, None) => default.clone(),
        (_, Some(reported)) => reported.clone(),
    }
}

fn apply_bound(payload: &mut Value, field: &BoundedField) {
    let Some((last, parents)) = field.path.split_last() else {
        return;
    };

    let mut cursor = payload;
    for segment in parents {
        match cursor.get_mut(*segment) {
            Some(next) => cursor = next,
            None => return,
        }
    }

    let Some(object) = cursor.as_object_mut() else {
        return;
    };

    let bounded = object
        .get(*last)
        .and_then(numeric_value)
        .filter(|n| *n >= field.min && *n <= field.max)
        .and_then(to_json_number)
        .unwrap_or_else(|| field.floor.clone());

    object.insert((*last).to_string(), bounded);
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn to_json_number(n: f64) -> Option<Value> {
    if n.fract() == 0.0 {
        Some(Value::from(n as i64))
    } else {
        serde_json::Number::from_f64(n).map(Value::Number)
    }
}
