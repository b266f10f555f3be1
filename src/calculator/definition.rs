//! Service-definition document model.
//!
//! A service definition is the remote, authoritative document describing one
//! AWS service's configurable inputs, pricing-lookup bindings, and math
//! formulas. The document is a recursive tree: templates hold cards, cards
//! hold an input section (a component tree) and an ordered maths section.
//! Components are heterogeneous: the `type`/`subType` pair selects the
//! role, so most fields here are optional and the evaluator matches on
//! `effective_type()`.

use serde::Deserialize;
use serde_json::Value;

/// Input roles: components the user supplies values for.
pub const INPUT_TYPES: &[&str] = &[
    "numericInput",
    "dropdown",
    "frequency",
    "fileSize",
    "pricingStrategy",
    "radioTiles",
];

/// Pricing roles: components resolved against price tables before math runs.
pub const PRICING_TYPES: &[&str] = &[
    "replace",
    "singlePricePoint",
    "pricingComboV2",
    "tieredPricing",
];

/// One AWS service's definition, fetched from
/// `{definition_base}/{serviceCode}/en_US.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDefinition {
    pub service_name: Option<String>,
    pub version: Option<String>,
    pub estimate_for: Option<String>,
    /// `"loader"` marks a dynamically-assembled form; inputs may be empty.
    pub layout: Option<String>,
    pub sub_services: Vec<SubServiceRef>,
    pub mapping_definitions: Vec<MappingDefinition>,
    pub templates: Vec<Template>,
}

impl ServiceDefinition {
    /// Resolve a mapping-definition name to its pricing-table URL template.
    pub fn mapping_url(&self, name: &str) -> Option<&str> {
        self.mapping_definitions
            .iter()
            .find(|m| m.name.as_deref() == Some(name))
            .and_then(|m| m.url.as_deref())
    }

    /// First template, the one the evaluator runs (templates are
    /// alternatives, not layers).
    pub fn primary_template(&self) -> Option<&Template> {
        self.templates.first()
    }
}

/// Reference to a child service whose definition is fetched separately.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubServiceRef {
    pub service_code: Option<String>,
    pub name: Option<String>,
}

/// Named pricing table binding: name → URL template with a `[currency]`
/// placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingDefinition {
    #[serde(alias = "mappingDefinitionName")]
    pub name: Option<String>,
    pub url: Option<String>,
}

/// A top-level alternate form for configuring the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: Option<String>,
    pub title: Option<String>,
    pub cards: Vec<Card>,
}

/// One card: an input component tree plus an ordered operator list, both
/// optionally guarded by `displayIf`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Card {
    pub id: Option<String>,
    pub title: Option<String>,
    pub input_section: Section,
    pub maths_section: Section,
    pub display_if: Option<Value>,
}

/// A component list that tolerates both wire shapes:
/// `{"components": [...]}` and a bare `[...]`.
#[derive(Debug, Clone, Default)]
pub struct Section {
    pub components: Vec<Component>,
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let components = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value(v).ok())
                .collect(),
            Value::Object(mut map) => match map.remove("components") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .filter_map(|v| serde_json::from_value(v).ok())
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(Section { components })
    }
}

/// A `{label, value}` choice, as used by dropdowns and unit selectors.
/// Labels fall back to the value when absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChoiceOption {
    pub label: Option<Value>,
    pub value: Option<Value>,
}

/// A radio tile: `{label, value, description}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadioOption {
    pub label: Option<Value>,
    pub value: Option<Value>,
    pub description: Option<String>,
}

/// One group inside a `pricingStrategy` component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RadioGroup {
    pub key: Option<String>,
    #[serde(alias = "defaultValue")]
    pub default_option: Option<Value>,
    pub options: Vec<ChoiceOption>,
}

/// A `replace` substitution rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Replacement {
    pub original_string: Option<String>,
    pub replace_string: Option<String>,
}

/// One node of the definition tree. The `type`/`subType` pair picks the
/// role; everything else is role-specific and optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    pub sub_type: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub default_value: Option<Value>,
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub unit_options: Vec<ChoiceOption>,
    pub options: Vec<ChoiceOption>,
    pub components: Vec<Component>,
    pub display_if: Option<Value>,

    // Pricing bindings
    pub mapping_definition_name: Option<String>,
    /// `{allRegions: "GB-Month"}` or a bare string.
    pub metered_unit: Option<Value>,
    /// `pricingComboV2`: the metered-unit name is read out of context via
    /// `refers[0].variableId`.
    pub refers: Vec<Value>,
    /// `tieredPricing`: `{allRegions: [{startOfTier, endOfTier, meteredUnit}]}`.
    pub tiers: Option<Value>,
    pub replacements: Vec<Replacement>,
    pub original_id: Option<String>,

    // Math operators
    pub operation: Option<String>,
    /// Operand list for `basicMaths`/`maxMin`; each entry follows the
    /// operand encoding (`{constant}`, `{variableId}`, `{refer}`, `{value}`,
    /// bare number).
    pub values: Vec<Value>,
    pub variable_id: Option<String>,
    pub refer: Option<String>,
    pub method: Option<String>,
    pub factor: Option<Value>,
    pub input_refer: Option<String>,
    pub tiered_pricing_refer: Option<String>,
    pub sub_total_refer: Option<String>,
    pub cost_type: Option<String>,

    // Input specifics
    pub default_selection: Option<Value>,
    pub radio_options: Vec<RadioOption>,
    pub radio_groups: Vec<RadioGroup>,
}

impl Component {
    /// The role discriminator: `subType` wins over `type`.
    pub fn effective_type(&self) -> &str {
        self.sub_type
            .as_deref()
            .or(self.component_type.as_deref())
            .unwrap_or("")
    }

    pub fn is_input(&self) -> bool {
        INPUT_TYPES.contains(&self.effective_type())
    }

    pub fn is_pricing(&self) -> bool {
        PRICING_TYPES.contains(&self.effective_type())
    }

    /// `defaultValue` wins over `value`; null means no default.
    pub fn default_value(&self) -> Option<&Value> {
        self.default_value
            .as_ref()
            .or(self.value.as_ref())
            .filter(|v| !v.is_null())
    }

    /// The metered-unit string for `singlePricePoint`: `allRegions` key or
    /// a bare string.
    pub fn metered_unit_name(&self) -> Option<&str> {
        match self.metered_unit.as_ref()? {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("allRegions").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Depth-first walk over a component tree, visiting every node.
pub fn walk_components<'a>(components: &'a [Component], visit: &mut dyn FnMut(&'a Component)) {
    for component in components {
        visit(component);
        walk_components(&component.components, visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_accepts_both_shapes() {
        let wrapped: Card = serde_json::from_value(serde_json::json!({
            "inputSection": {"components": [{"id": "a", "type": "numericInput"}]}
        }))
        .expect("wrapped");
        assert_eq!(wrapped.input_section.components.len(), 1);

        let bare: Card = serde_json::from_value(serde_json::json!({
            "inputSection": [{"id": "a", "type": "numericInput"}],
            "mathsSection": [{"type": "basicMaths", "operation": "addition"}]
        }))
        .expect("bare");
        assert_eq!(bare.input_section.components.len(), 1);
        assert_eq!(bare.maths_section.components.len(), 1);
    }

    #[test]
    fn test_effective_type_prefers_sub_type() {
        let c: Component = serde_json::from_value(serde_json::json!({
            "type": "input", "subType": "fileSize"
        }))
        .expect("component");
        assert_eq!(c.effective_type(), "fileSize");
        assert!(c.is_input());
    }

    #[test]
    fn test_default_value_precedence() {
        let c: Component = serde_json::from_value(serde_json::json!({
            "defaultValue": 5, "value": 9
        }))
        .expect("component");
        assert_eq!(c.default_value(), Some(&serde_json::json!(5)));

        let c: Component =
            serde_json::from_value(serde_json::json!({"value": 9})).expect("component");
        assert_eq!(c.default_value(), Some(&serde_json::json!(9)));

        let c: Component =
            serde_json::from_value(serde_json::json!({"defaultValue": null})).expect("component");
        assert_eq!(c.default_value(), None);
    }

    #[test]
    fn test_metered_unit_name_shapes() {
        let c: Component = serde_json::from_value(serde_json::json!({
            "meteredUnit": {"allRegions": "GB-Month"}
        }))
        .expect("component");
        assert_eq!(c.metered_unit_name(), Some("GB-Month"));

        let c: Component = serde_json::from_value(serde_json::json!({
            "meteredUnit": "Requests"
        }))
        .expect("component");
        assert_eq!(c.metered_unit_name(), Some("Requests"));
    }

    #[test]
    fn test_walk_components_depth_first() {
        let def: ServiceDefinition = serde_json::from_value(serde_json::json!({
            "templates": [{
                "cards": [{
                    "inputSection": {"components": [
                        {"id": "outer", "type": "dropdown", "components": [
                            {"id": "inner", "type": "numericInput"}
                        ]},
                        {"id": "sibling", "type": "numericInput"}
                    ]}
                }]
            }]
        }))
        .expect("definition");

        let mut seen = Vec::new();
        let card = &def.templates[0].cards[0];
        walk_components(&card.input_section.components, &mut |c| {
            seen.push(c.id.clone().unwrap_or_default());
        });
        assert_eq!(seen, vec!["outer", "inner", "sibling"]);
    }

    #[test]
    fn test_mapping_url_lookup() {
        let def: ServiceDefinition = serde_json::from_value(serde_json::json!({
            "mappingDefinitions": [
                {"name": "lambda", "url": "https://x/[currency]/lambda.json"}
            ],
            "templates": []
        }))
        .expect("definition");
        assert_eq!(
            def.mapping_url("lambda"),
            Some("https://x/[currency]/lambda.json")
        );
        assert_eq!(def.mapping_url("missing"), None);
    }
}
