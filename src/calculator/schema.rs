//! Schema extraction: from a definition's template tree to a portable list
//! of input fields an agent can fill in.
//!
//! Every component carrying an `id` becomes a field; recursion continues
//! into a node's children whether or not the node itself was emitted.

use super::definition::{
    ChoiceOption, Component, RadioGroup, ServiceDefinition, walk_components,
};
use serde::Serialize;
use serde_json::Value;

/// A normalized `{label, value}` choice. Label falls back to the value's
/// string form when the wire omits it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    pub label: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One group of a `pricingStrategy` field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadioGroupField {
    pub key: String,
    pub default: Value,
    pub options: Vec<FieldOption>,
}

/// The portable form of one configurable input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_options: Option<Vec<FieldOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio_groups: Option<Vec<RadioGroupField>>,
}

impl InputField {
    /// True when the field holds a `{value, unit}` pair on the wire.
    pub fn is_sized(&self) -> bool {
        matches!(self.field_type.as_str(), "fileSize" | "frequency")
    }

    /// A default worth seeding into calculation components: non-null and
    /// not an empty string.
    pub fn meaningful_default(&self) -> Option<&Value> {
        match &self.default {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            other => Some(other),
        }
    }
}

/// Template identity, surfaced so agents can pick an alternate form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The full schema for one service: identity, templates, inputs, and
/// best-effort sub-service schemas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSchema {
    pub service_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    pub templates: Vec<TemplateInfo>,
    pub inputs: Vec<InputField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_services: Vec<ServiceSchema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ServiceSchema {
    /// Placeholder emitted when a sub-service definition cannot be fetched.
    pub fn placeholder(service_code: &str, note: String) -> Self {
        Self {
            service_code: service_code.to_string(),
            service_name: None,
            version: None,
            layout: None,
            templates: Vec::new(),
            inputs: Vec::new(),
            sub_services: Vec::new(),
            notes: vec![note],
        }
    }
}

fn label_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn normalize_options(options: &[ChoiceOption]) -> Vec<FieldOption> {
    options
        .iter()
        .map(|opt| {
            let value = opt.value.clone().unwrap_or(Value::Null);
            let label = opt
                .label
                .as_ref()
                .map(label_string)
                .unwrap_or_else(|| label_string(&value));
            FieldOption {
                label,
                value,
                description: None,
            }
        })
        .collect()
}

fn normalize_radio_groups(groups: &[RadioGroup]) -> Vec<RadioGroupField> {
    groups
        .iter()
        .map(|group| RadioGroupField {
            key: group.key.clone().unwrap_or_default(),
            default: group.default_option.clone().unwrap_or(Value::Null),
            options: normalize_options(&group.options),
        })
        .collect()
}

/// Unit metadata for sized fields: explicit unit options win, a fixed
/// `unit` string is the fallback.
fn sized_units(component: &Component) -> (Option<String>, Option<Vec<FieldOption>>, Option<String>) {
    let unit_options = if component.unit_options.is_empty() {
        None
    } else {
        Some(normalize_options(&component.unit_options))
    };
    let default_unit = unit_options
        .as_ref()
        .and_then(|opts| opts.first())
        .map(|opt| label_string(&opt.value))
        .or_else(|| component.unit.clone());
    let format = {
        let units = unit_options
            .as_ref()
            .map(|opts| {
                opts.iter()
                    .map(|o| o.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .or_else(|| component.unit.clone());
        units.map(|u| format!("number with unit ({u})"))
    };
    (default_unit, unit_options, format)
}

/// Project one component into an `InputField`. Only called for nodes with
/// an `id`.
fn field_from_component(component: &Component) -> InputField {
    let id = component.id.clone().unwrap_or_default();
    let field_type = component.effective_type().to_string();

    let mut field = InputField {
        id,
        field_type: field_type.clone(),
        label: component.label.clone(),
        description: component.description.clone(),
        default: component.default_value().cloned().unwrap_or(Value::Null),
        unit: component.unit.clone(),
        options: None,
        default_unit: None,
        unit_options: None,
        format: None,
        radio_groups: None,
    };

    if !component.options.is_empty() {
        field.options = Some(normalize_options(&component.options));
    }

    match field_type.as_str() {
        "frequency" | "fileSize" => {
            let (default_unit, unit_options, format) = sized_units(component);
            field.default_unit = default_unit;
            field.unit_options = unit_options;
            field.format = format;
        }
        "pricingStrategy" if !component.radio_groups.is_empty() => {
            let groups = normalize_radio_groups(&component.radio_groups);
            let mut default = serde_json::Map::new();
            for group in &groups {
                default.insert(group.key.clone(), group.default.clone());
            }
            field.default = Value::Object(default);
            field.radio_groups = Some(groups);
        }
        "radioTiles" => {
            field.default = component
                .default_selection
                .clone()
                .unwrap_or(Value::Null);
            field.options = Some(
                component
                    .radio_options
                    .iter()
                    .map(|opt| {
                        let value = opt.value.clone().unwrap_or(Value::Null);
                        let label = opt
                            .label
                            .as_ref()
                            .map(label_string)
                            .unwrap_or_else(|| label_string(&value));
                        FieldOption {
                            label,
                            value,
                            description: opt.description.clone(),
                        }
                    })
                    .collect(),
            );
        }
        _ => {}
    }

    field
}

/// Depth-first extraction of every input field in the definition: all
/// templates, all cards, all input-section components.
pub fn extract_inputs(def: &ServiceDefinition) -> Vec<InputField> {
    let mut fields = Vec::new();
    for template in &def.templates {
        for card in &template.cards {
            walk_components(&card.input_section.components, &mut |component| {
                if component.id.is_some() {
                    fields.push(field_from_component(component));
                }
            });
        }
    }
    fields
}

/// Project a fetched definition into its schema, without sub-service
/// resolution (the caller fetches those).
pub fn project_schema(def: &ServiceDefinition, service_code: &str) -> ServiceSchema {
    let inputs = extract_inputs(def);
    let mut notes = Vec::new();
    if def.layout.as_deref() == Some("loader") && inputs.is_empty() {
        notes.push(
            "This service uses a dynamically-assembled form; no inputs could be \
             extracted. Configure it with explicit calculationComponents."
                .to_string(),
        );
    }
    ServiceSchema {
        service_code: service_code.to_string(),
        service_name: def.service_name.clone(),
        version: def.version.clone(),
        layout: def.layout.clone(),
        templates: def
            .templates
            .iter()
            .map(|t| TemplateInfo {
                id: t.id.clone(),
                title: t.title.clone(),
            })
            .collect(),
        inputs,
        sub_services: Vec::new(),
        notes,
    }
}
