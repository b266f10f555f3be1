//! Value normalization and default merging.
//!
//! The boundary accepts labels where canonical option values are stored,
//! sized quantities with units, and bare scalars. Everything funnels through
//! here so downstream code (evaluator, assembler) never re-resolves.

use super::schema::{FieldOption, InputField};
use serde_json::{Map, Value};

/// File sizes normalize into gigabytes.
fn file_size_multiplier(unit: &str) -> f64 {
    match unit {
        "KB" => 1.0 / f64::from(1u32 << 20),
        "MB" => 1.0 / f64::from(1u32 << 10),
        "GB" => 1.0,
        "TB" => 1024.0,
        _ => 1.0,
    }
}

/// Frequencies normalize into a per-month count (30-day month).
fn frequency_multiplier(unit: &str) -> f64 {
    match unit {
        "per second" => 2_592_000.0,
        "per minute" => 43_200.0,
        "per hour" => 720.0,
        "per day" => 30.0,
        "per week" => 30.0 / 7.0,
        "per month" => 1.0,
        "per year" => 1.0 / 12.0,
        _ => 1.0,
    }
}

/// Pull the numeric payload out of a raw component value: the inner `value`
/// of a `{value, unit}` record, or the value itself. Numeric strings count;
/// anything else is 0.
pub fn numeric_of(raw: &Value) -> f64 {
    let inner = match raw {
        Value::Object(map) => map.get("value").unwrap_or(&Value::Null),
        other => other,
    };
    match inner {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The `unit` of a `{value, unit}` record, if any.
pub fn unit_of(raw: &Value) -> Option<&str> {
    raw.as_object()?.get("unit")?.as_str()
}

/// Project a raw component value to the scalar the evaluator consumes,
/// keyed by the field's subtype.
pub fn normalize_value(sub_type: &str, raw: &Value) -> f64 {
    let n = numeric_of(raw);
    match sub_type {
        "fileSize" => n * file_size_multiplier(unit_of(raw).unwrap_or("GB")),
        "frequency" => n * frequency_multiplier(unit_of(raw).unwrap_or("per month")),
        _ => n,
    }
}

fn option_matches(option: &FieldOption, supplied: &str) -> bool {
    if option.label == supplied {
        return true;
    }
    match &option.value {
        Value::String(s) => s == supplied,
        Value::Number(n) => n.to_string() == supplied,
        _ => false,
    }
}

/// Substitute a supplied label (or already-canonical value) with the
/// option's canonical value. Strings outside the option set pass through.
pub fn resolve_value(field: &InputField, raw: &Value) -> Value {
    let Some(options) = field.options.as_ref() else {
        return raw.clone();
    };
    let Some(supplied) = raw.as_str() else {
        return raw.clone();
    };
    options
        .iter()
        .find(|opt| option_matches(opt, supplied))
        .map(|opt| opt.value.clone())
        .unwrap_or_else(|| raw.clone())
}

/// Wrap a resolved scalar in its on-the-wire component-value form:
/// `{value, unit}` for sized fields, `{value}` otherwise.
pub fn build_component_value(field: &InputField, value: Value) -> Value {
    let mut record = Map::new();
    record.insert("value".to_string(), value);
    if field.is_sized()
        && let Some(unit) = field.default_unit.as_deref()
    {
        record.insert("unit".to_string(), Value::String(unit.to_string()));
    }
    Value::Object(record)
}

/// Seed value for one field's meaningful default.
fn default_entry(field: &InputField, default: &Value) -> Value {
    if field.field_type == "pricingStrategy" && default.is_object() {
        // Pricing strategies persist as plain objects, no {value} wrapper.
        return default.clone();
    }
    build_component_value(field, resolve_value(field, default))
}

/// Merge user inputs over definition defaults into the persisted
/// calculation-component map.
///
/// With no user input, every field with a meaningful default gets an entry.
/// With user input, defaults are seeded first and user entries overlaid.
/// Unknown keys are preserved untouched (pass-through user data).
pub fn build_calc_components(
    fields: &[InputField],
    user_inputs: &Map<String, Value>,
) -> Map<String, Value> {
    let mut components = Map::new();
    for field in fields {
        if let Some(default) = field.meaningful_default() {
            components.insert(field.id.clone(), default_entry(field, default));
        }
    }

    for (key, raw) in user_inputs {
        let Some(field) = fields.iter().find(|f| &f.id == key) else {
            tracing::warn!("calculation component '{}' has no matching input; passing through", key);
            let preserved = if raw.is_object() {
                raw.clone()
            } else {
                let mut record = Map::new();
                record.insert("value".to_string(), raw.clone());
                Value::Object(record)
            };
            components.insert(key.clone(), preserved);
            continue;
        };

        let entry = if field.field_type == "pricingStrategy" {
            // Accept either the bare strategy object or one wrapped in
            // {value: …}; persist the bare object.
            let strategy = raw
                .as_object()
                .and_then(|m| m.get("value"))
                .filter(|v| v.is_object())
                .unwrap_or(raw);
            strategy.clone()
        } else if let Some(record) = raw.as_object().filter(|m| m.contains_key("value")) {
            let resolved = resolve_value(field, record.get("value").unwrap_or(&Value::Null));
            let mut out = Map::new();
            out.insert("value".to_string(), resolved);
            if let Some(unit) = record.get("unit") {
                out.insert("unit".to_string(), unit.clone());
            }
            Value::Object(out)
        } else {
            build_component_value(field, resolve_value(field, raw))
        };
        components.insert(key.clone(), entry);
    }

    components
}
