//! The expression evaluator.
//!
//! Evaluation runs three ordered passes over one mutable context keyed by
//! component id:
//!
//! 1. **Seeding**: every calculation-component entry is normalized by its
//!    input's subtype and stored.
//! 2. **Pricing resolution**: `replace`, `singlePricePoint`,
//!    `pricingComboV2` and `tieredPricing` components assign their slots
//!    from the loaded price tables.
//! 3. **Math**: the first template's cards run in order; each card's
//!    operators fold over the context, guarded by `displayIf`, and
//!    `priceDisplay` operators emit the labeled subtotals that become the
//!    final cost.
//!
//! The context is a typed symbol table: numeric slots, string slots (for
//! `replace` and `==` conditions), and tier arrays.

use super::definition::{Component, ServiceDefinition, walk_components};
use super::pricing::PriceTables;
use super::value::{normalize_value, numeric_of};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One slot of the evaluation context.
#[derive(Debug, Clone)]
pub enum CtxValue {
    Num(f64),
    Text(String),
    Tiers(Vec<Tier>),
}

/// One resolved pricing tier. `end == None` means unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub start: f64,
    pub end: Option<f64>,
    pub price: f64,
}

#[derive(Debug, Default)]
struct EvalContext {
    slots: HashMap<String, CtxValue>,
}

impl EvalContext {
    fn set(&mut self, id: &str, value: CtxValue) {
        self.slots.insert(id.to_string(), value);
    }

    /// Numeric read; non-numeric slots and missing ids are 0.
    fn num(&self, id: &str) -> f64 {
        match self.slots.get(id) {
            Some(CtxValue::Num(n)) => *n,
            _ => 0.0,
        }
    }

    /// String read; numbers format losslessly, everything else is empty.
    fn text(&self, id: &str) -> String {
        match self.slots.get(id) {
            Some(CtxValue::Text(s)) => s.clone(),
            Some(CtxValue::Num(n)) => format_number(*n),
            _ => String::new(),
        }
    }

    fn tiers(&self, id: &str) -> Option<&[Tier]> {
        match self.slots.get(id) {
            Some(CtxValue::Tiers(tiers)) => Some(tiers),
            _ => None,
        }
    }
}

/// Integral values print without a trailing `.0` so they compare cleanly
/// against wire strings.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One `priceDisplay` emission.
#[derive(Debug, Clone)]
pub struct PriceLine {
    pub cost_type: String,
    pub value: f64,
}

/// The evaluator's result: monthly and upfront subtotals, clamped
/// non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostTotals {
    pub monthly: f64,
    pub upfront: f64,
}

impl CostTotals {
    pub fn add(&mut self, other: CostTotals) {
        self.monthly += other.monthly;
        self.upfront += other.upfront;
    }
}

// ─── Phase 1: seeding ────────────────────────────────────────

/// Input ids and subtypes across every template's input tree.
fn input_subtypes(def: &ServiceDefinition) -> HashMap<String, String> {
    let mut subtypes = HashMap::new();
    for template in &def.templates {
        for card in &template.cards {
            walk_components(&card.input_section.components, &mut |component| {
                if let Some(id) = component.id.as_deref() {
                    subtypes.insert(id.to_string(), component.effective_type().to_string());
                }
            });
        }
    }
    subtypes
}

/// Seed one raw component value: numeric payloads normalize by subtype,
/// plain strings stay text (dropdown values feed `replace` and `==`
/// conditions), objects without a scalar payload are skipped.
fn seed_value(sub_type: &str, raw: &Value) -> Option<CtxValue> {
    let inner = match raw {
        Value::Object(map) => map.get("value").unwrap_or(&Value::Null),
        other => other,
    };
    match inner {
        Value::Number(_) => Some(CtxValue::Num(normalize_value(sub_type, raw))),
        Value::String(s) => {
            if s.trim().parse::<f64>().is_ok() {
                Some(CtxValue::Num(normalize_value(sub_type, raw)))
            } else {
                Some(CtxValue::Text(s.clone()))
            }
        }
        Value::Bool(b) => Some(CtxValue::Text(b.to_string())),
        _ => None,
    }
}

// ─── Phase 2: pricing resolution ─────────────────────────────

fn tier_bound(entry: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        entry.get(key).and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    })
}

fn build_tiers(component: &Component, tables: &PriceTables) -> Vec<Tier> {
    let mapping = component.mapping_definition_name.as_deref().unwrap_or("");
    let Some(entries) = component
        .tiers
        .as_ref()
        .and_then(|t| t.get("allRegions"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| {
            let start = tier_bound(entry, &["startOfTier", "start"]).unwrap_or(0.0);
            let end = tier_bound(entry, &["endOfTier", "end"])
                .filter(|e| *e >= 0.0);
            let unit = entry
                .get("meteredUnit")
                .and_then(Value::as_str)
                .unwrap_or("");
            Tier {
                start,
                end,
                price: tables.price(mapping, unit),
            }
        })
        .collect()
}

fn resolve_pricing_component(component: &Component, ctx: &mut EvalContext, tables: &PriceTables) {
    let Some(id) = component.id.as_deref() else {
        return;
    };
    let mapping = component.mapping_definition_name.as_deref().unwrap_or("");
    match component.effective_type() {
        "replace" => {
            let original = component
                .original_id
                .as_deref()
                .map(|source| ctx.text(source))
                .unwrap_or_default();
            let replaced = component
                .replacements
                .iter()
                .find(|r| r.original_string.as_deref() == Some(original.as_str()))
                .and_then(|r| r.replace_string.clone())
                .unwrap_or_default();
            ctx.set(id, CtxValue::Text(replaced));
        }
        "singlePricePoint" => {
            let unit = component.metered_unit_name().unwrap_or("");
            ctx.set(id, CtxValue::Num(tables.price(mapping, unit)));
        }
        "pricingComboV2" => {
            // The metered-unit name is dynamic: refers[0].variableId names
            // the context slot that holds it.
            let unit = component
                .refers
                .first()
                .and_then(|r| r.get("variableId"))
                .and_then(Value::as_str)
                .map(|slot| ctx.text(slot))
                .unwrap_or_default();
            ctx.set(id, CtxValue::Num(tables.price(mapping, &unit)));
        }
        "tieredPricing" => {
            ctx.set(id, CtxValue::Tiers(build_tiers(component, tables)));
        }
        _ => {}
    }
}

// ─── displayIf ───────────────────────────────────────────────

fn condition_operand(operand: &Value, ctx: &EvalContext) -> String {
    if let Some(map) = operand.as_object() {
        if let Some(id) = map.get("id").and_then(Value::as_str) {
            return ctx.text(id);
        }
        return operand.to_string();
    }
    match operand {
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n.as_f64().unwrap_or(0.0)),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Evaluate a `displayIf` condition. Unknown shapes default to inclusion.
fn eval_condition(condition: Option<&Value>, ctx: &EvalContext, tables: &PriceTables) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    match condition {
        Value::Bool(b) => *b,
        Value::Array(items) => items.iter().all(|c| eval_condition(Some(c), ctx, tables)),
        Value::Object(map) => {
            if let Some(exists) = map.get("exists") {
                let mapping = exists
                    .get("mappingDefinitionName")
                    .and_then(Value::as_str);
                let unit = exists.get("meteredUnit").and_then(Value::as_str);
                return match (mapping, unit) {
                    (Some(mapping), Some(unit)) => tables.has_unit(mapping, unit),
                    _ => true,
                };
            }
            if let Some(inner) = map.get("and") {
                return match inner {
                    Value::Array(items) => {
                        items.iter().all(|c| eval_condition(Some(c), ctx, tables))
                    }
                    other => eval_condition(Some(other), ctx, tables),
                };
            }
            if let Some(inner) = map.get("or") {
                return match inner {
                    Value::Array(items) => {
                        items.iter().any(|c| eval_condition(Some(c), ctx, tables))
                    }
                    other => eval_condition(Some(other), ctx, tables),
                };
            }
            if let Some(inner) = map.get("not") {
                return !eval_condition(Some(inner), ctx, tables);
            }
            if let Some(Value::Array(operands)) = map.get("==")
                && operands.len() == 2
            {
                return condition_operand(&operands[0], ctx)
                    == condition_operand(&operands[1], ctx);
            }
            true
        }
        _ => true,
    }
}

// ─── Phase 3: math ───────────────────────────────────────────

/// Operand encoding: `{constant}`, `{variableId}`/`{refer}`, `{value}`,
/// bare number; anything else is 0.
fn resolve_operand(operand: &Value, ctx: &EvalContext) -> f64 {
    match operand {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Object(map) => {
            if let Some(constant) = map.get("constant") {
                return numeric_of(constant);
            }
            if let Some(slot) = map
                .get("variableId")
                .or_else(|| map.get("refer"))
                .and_then(Value::as_str)
            {
                return ctx.num(slot);
            }
            if let Some(value) = map.get("value") {
                return numeric_of(value);
            }
            0.0
        }
        _ => 0.0,
    }
}

fn fold_basic_maths(operation: &str, operands: &[Value], ctx: &EvalContext) -> f64 {
    let mut values = operands.iter().map(|operand| resolve_operand(operand, ctx));
    let Some(first) = values.next() else {
        return 0.0;
    };
    values.fold(first, |acc, v| match operation {
        "multiplication" => acc * v,
        "addition" => acc + v,
        "subtraction" => acc - v,
        "division" => {
            if v == 0.0 {
                0.0
            } else {
                acc / v
            }
        }
        _ => acc,
    })
}

fn fold_max_min(operation: &str, operands: &[Value], ctx: &EvalContext) -> f64 {
    let mut values = operands.iter().map(|operand| resolve_operand(operand, ctx));
    let Some(first) = values.next() else {
        return 0.0;
    };
    values.fold(first, |acc, v| match operation {
        "Maximum" => acc.max(v),
        "Minimum" => acc.min(v),
        _ => acc,
    })
}

fn apply_rounding(component: &Component, ctx: &EvalContext) -> f64 {
    let value = component
        .variable_id
        .as_deref()
        .or(component.refer.as_deref())
        .map(|slot| ctx.num(slot))
        .unwrap_or_else(|| {
            component
                .value
                .as_ref()
                .map(numeric_of)
                .unwrap_or(0.0)
        });
    let factor = component.factor.as_ref().map(numeric_of).unwrap_or(0.0);
    if factor <= 0.0 {
        return value;
    }
    match component.method.as_deref() {
        Some("roundUp") => (value / factor).ceil() * factor,
        Some("roundDown") => (value / factor).floor() * factor,
        _ => value,
    }
}

/// Graduated tiers: charge `min(remaining, end - start)` units at each
/// tier's price until the quantity is exhausted.
fn tiered_cost(quantity: f64, tiers: &[Tier]) -> f64 {
    let mut remaining = quantity.max(0.0);
    let mut cost = 0.0;
    for tier in tiers {
        if remaining <= 0.0 {
            break;
        }
        let span = match tier.end {
            Some(end) => (end - tier.start).max(0.0),
            None => f64::INFINITY,
        };
        let units = remaining.min(span);
        cost += units * tier.price;
        remaining -= units;
    }
    cost
}

fn run_operator(
    component: &Component,
    ctx: &mut EvalContext,
    tables: &PriceTables,
    lines: &mut Vec<PriceLine>,
) {
    if !eval_condition(component.display_if.as_ref(), ctx, tables) {
        return;
    }
    match component.effective_type() {
        "display" | "conversionDisplay" => {}
        "priceDisplay" => {
            let value = component
                .sub_total_refer
                .as_deref()
                .map(|slot| ctx.num(slot))
                .unwrap_or(0.0);
            lines.push(PriceLine {
                cost_type: component
                    .cost_type
                    .clone()
                    .unwrap_or_else(|| "Monthly".to_string()),
                value,
            });
        }
        "basicMaths" => {
            let operation = component.operation.as_deref().unwrap_or("");
            let result = fold_basic_maths(operation, &component.values, ctx);
            if let Some(id) = component.id.as_deref() {
                ctx.set(id, CtxValue::Num(result));
            }
        }
        "maxMin" => {
            let operation = component.operation.as_deref().unwrap_or("");
            let result = fold_max_min(operation, &component.values, ctx);
            if let Some(id) = component.id.as_deref() {
                ctx.set(id, CtxValue::Num(result));
            }
        }
        "rounding" => {
            let result = apply_rounding(component, ctx);
            if let Some(id) = component.id.as_deref() {
                ctx.set(id, CtxValue::Num(result));
            }
        }
        "tieredPricingMath" => {
            let quantity = component
                .input_refer
                .as_deref()
                .map(|slot| ctx.num(slot))
                .unwrap_or(0.0);
            let cost = component
                .tiered_pricing_refer
                .as_deref()
                .and_then(|slot| ctx.tiers(slot))
                .map(|tiers| tiered_cost(quantity, tiers))
                .unwrap_or(0.0);
            if let Some(id) = component.id.as_deref() {
                ctx.set(id, CtxValue::Num(cost));
            }
        }
        other => {
            tracing::debug!("skipping unknown operator '{}'", other);
        }
    }
}

/// Evaluate one definition against its calculation components and loaded
/// price tables.
pub fn evaluate(
    def: &ServiceDefinition,
    components: &Map<String, Value>,
    tables: &PriceTables,
) -> CostTotals {
    let mut ctx = EvalContext::default();

    // Phase 1: seed the context from calculation components.
    let subtypes = input_subtypes(def);
    for (id, raw) in components {
        let sub_type = subtypes.get(id).map(String::as_str).unwrap_or("");
        if let Some(value) = seed_value(sub_type, raw) {
            ctx.set(id, value);
        }
    }

    // Phase 2: resolve pricing components across every template's input
    // sections (ids are unique within the definition).
    for template in &def.templates {
        for card in &template.cards {
            walk_components(&card.input_section.components, &mut |component| {
                if component.is_pricing() {
                    resolve_pricing_component(component, &mut ctx, tables);
                }
            });
        }
    }

    // Phase 3: fold the first template's math, in card order.
    let mut lines = Vec::new();
    if let Some(template) = def.primary_template() {
        for card in &template.cards {
            if !eval_condition(card.display_if.as_ref(), &ctx, tables) {
                continue;
            }
            for operator in &card.maths_section.components {
                run_operator(operator, &mut ctx, tables, &mut lines);
            }
        }
    }

    let mut totals = CostTotals::default();
    for line in &lines {
        if line.cost_type.eq_ignore_ascii_case("upfront") {
            totals.upfront += line.value;
        } else {
            totals.monthly += line.value;
        }
    }
    totals.monthly = totals.monthly.max(0.0);
    totals.upfront = totals.upfront.max(0.0);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(value: Value) -> ServiceDefinition {
        serde_json::from_value(value).expect("definition")
    }

    fn components(value: Value) -> Map<String, Value> {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn test_no_math_sections_is_zero() {
        let d = def(json!({
            "templates": [{"cards": [{"inputSection": {"components": [
                {"id": "n", "type": "numericInput"}
            ]}}]}]
        }));
        let totals = evaluate(
            &d,
            &components(json!({"n": {"value": 5}})),
            &PriceTables::default(),
        );
        assert_eq!(totals, CostTotals::default());
    }

    #[test]
    fn test_lambda_free_tier_math() {
        let d = def(json!({
            "serviceName": "AWS Lambda",
            "templates": [{"id": "default", "cards": [{
                "inputSection": {"components": [
                    {"id": "numberOfRequests", "type": "numericInput"},
                    {"id": "durationOfEachRequest", "type": "numericInput"},
                    {"id": "sizeOfMemoryAllocated", "type": "numericInput"},
                    {"id": "requestPrice", "type": "numericInput"},
                    {"id": "durationPrice", "type": "numericInput"}
                ]},
                "mathsSection": {"components": [
                    {"id": "durationSeconds", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "durationOfEachRequest"}, {"constant": 0.001}]},
                    {"id": "computeGbs", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "numberOfRequests"}, {"variableId": "durationSeconds"},
                                {"variableId": "sizeOfMemoryAllocated"}]},
                    {"id": "billableGbs", "type": "basicMaths", "operation": "subtraction",
                     "values": [{"variableId": "computeGbs"}, {"constant": 400000}]},
                    {"id": "billableGbsFloor", "type": "maxMin", "operation": "Maximum",
                     "values": [{"variableId": "billableGbs"}, {"constant": 0}]},
                    {"id": "computeCost", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "billableGbsFloor"}, {"variableId": "durationPrice"}]},
                    {"id": "billableRequests", "type": "basicMaths", "operation": "subtraction",
                     "values": [{"variableId": "numberOfRequests"}, {"constant": 1000000}]},
                    {"id": "billableRequestsFloor", "type": "maxMin", "operation": "Maximum",
                     "values": [{"variableId": "billableRequests"}, {"constant": 0}]},
                    {"id": "requestCost", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "billableRequestsFloor"}, {"variableId": "requestPrice"}]},
                    {"id": "totalCost", "type": "basicMaths", "operation": "addition",
                     "values": [{"variableId": "computeCost"}, {"variableId": "requestCost"}]},
                    {"type": "priceDisplay", "costType": "Monthly", "subTotalRefer": "totalCost"}
                ]}
            }]}]
        }));

        let totals = evaluate(
            &d,
            &components(json!({
                "numberOfRequests": {"value": 10000000},
                "durationOfEachRequest": {"value": 200},
                "sizeOfMemoryAllocated": {"value": 0.5},
                "requestPrice": {"value": 0.0000002},
                "durationPrice": {"value": 0.0000166667}
            })),
            &PriceTables::default(),
        );
        assert!(
            (totals.monthly - 11.80).abs() < 0.005,
            "expected ≈11.80, got {}",
            totals.monthly
        );
        assert_eq!(totals.upfront, 0.0);
    }

    #[test]
    fn test_s3_tiered_storage() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [
                    {"id": "storageGB", "type": "numericInput"},
                    {"id": "storageTiers", "type": "tieredPricing",
                     "mappingDefinitionName": "s3Storage",
                     "tiers": {"allRegions": [
                        {"startOfTier": 0, "endOfTier": 51200, "meteredUnit": "Tier1"},
                        {"startOfTier": 51200, "endOfTier": 512000, "meteredUnit": "Tier2"},
                        {"startOfTier": 512000, "endOfTier": -1, "meteredUnit": "Tier3"}
                     ]}}
                ]},
                "mathsSection": {"components": [
                    {"id": "storageCost", "type": "tieredPricingMath",
                     "inputRefer": "storageGB", "tieredPricingRefer": "storageTiers"},
                    {"type": "priceDisplay", "subTotalRefer": "storageCost"}
                ]}
            }]}]
        }));

        let tables = PriceTables::from_entries(&[(
            "s3Storage",
            &[("Tier1", 0.023), ("Tier2", 0.022), ("Tier3", 0.021)],
        )]);
        let totals = evaluate(
            &d,
            &components(json!({"storageGB": {"value": 60000}})),
            &tables,
        );
        assert!(
            (totals.monthly - 1371.20).abs() < 0.005,
            "expected ≈1371.20, got {}",
            totals.monthly
        );
    }

    #[test]
    fn test_single_price_point_and_upfront_grouping() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [
                    {"id": "hours", "type": "numericInput"},
                    {"id": "hourlyRate", "type": "singlePricePoint",
                     "mappingDefinitionName": "ec2",
                     "meteredUnit": {"allRegions": "Hrs"}}
                ]},
                "mathsSection": {"components": [
                    {"id": "runningCost", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "hours"}, {"variableId": "hourlyRate"}]},
                    {"type": "priceDisplay", "costType": "Monthly", "subTotalRefer": "runningCost"},
                    {"id": "reservation", "type": "basicMaths", "operation": "addition",
                     "values": [{"constant": 100}]},
                    {"type": "priceDisplay", "costType": "Upfront", "subTotalRefer": "reservation"}
                ]}
            }]}]
        }));

        let tables = PriceTables::from_entries(&[("ec2", &[("Hrs", 0.10)])]);
        let totals = evaluate(&d, &components(json!({"hours": {"value": 720}})), &tables);
        assert!((totals.monthly - 72.0).abs() < 1e-9);
        assert!((totals.upfront - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_replace_and_combo_pricing() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [
                    {"id": "storageClass", "type": "dropdown",
                     "options": [{"label": "Glacier", "value": "glacier"}]},
                    {"id": "meteredName", "type": "replace", "originalId": "storageClass",
                     "replacements": [
                        {"originalString": "glacier", "replaceString": "Glacier-Storage"},
                        {"originalString": "standard", "replaceString": "Std-Storage"}
                     ]},
                    {"id": "unitPrice", "type": "pricingComboV2",
                     "mappingDefinitionName": "s3",
                     "refers": [{"variableId": "meteredName"}]},
                    {"id": "gb", "type": "numericInput"}
                ]},
                "mathsSection": {"components": [
                    {"id": "cost", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "gb"}, {"variableId": "unitPrice"}]},
                    {"type": "priceDisplay", "subTotalRefer": "cost"}
                ]}
            }]}]
        }));

        let tables = PriceTables::from_entries(&[(
            "s3",
            &[("Glacier-Storage", 0.004), ("Std-Storage", 0.023)],
        )]);
        let totals = evaluate(
            &d,
            &components(json!({
                "storageClass": {"value": "glacier"},
                "gb": {"value": 1000}
            })),
            &tables,
        );
        assert!((totals.monthly - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_replace_without_match_is_empty_string() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [
                    {"id": "choice", "type": "dropdown"},
                    {"id": "name", "type": "replace", "originalId": "choice",
                     "replacements": [{"originalString": "a", "replaceString": "A"}]}
                ]},
                "mathsSection": {"components": [
                    {"type": "priceDisplay", "subTotalRefer": "missing",
                     "displayIf": {"==": [{"type": "component", "id": "name"}, ""]}}
                ]}
            }]}]
        }));
        let totals = evaluate(
            &d,
            &components(json!({"choice": {"value": "zzz"}})),
            &PriceTables::default(),
        );
        // The == guard passed (empty replace output), so a zero-value line
        // was emitted.
        assert_eq!(totals.monthly, 0.0);
    }

    #[test]
    fn test_display_if_skips_cards_and_operators() {
        let d = def(json!({
            "templates": [{"cards": [
                {
                    "displayIf": {"exists": {"type": "meteredUnit",
                        "mappingDefinitionName": "m", "meteredUnit": "Absent"}},
                    "inputSection": {"components": []},
                    "mathsSection": {"components": [
                        {"id": "skipped", "type": "basicMaths", "operation": "addition",
                         "values": [{"constant": 1000}]},
                        {"type": "priceDisplay", "subTotalRefer": "skipped"}
                    ]}
                },
                {
                    "inputSection": {"components": []},
                    "mathsSection": {"components": [
                        {"id": "base", "type": "basicMaths", "operation": "addition",
                         "values": [{"constant": 7}]},
                        {"type": "priceDisplay", "subTotalRefer": "base",
                         "displayIf": {"not": {"exists": {
                            "mappingDefinitionName": "m", "meteredUnit": "Absent"}}}},
                        {"type": "priceDisplay", "subTotalRefer": "base",
                         "displayIf": {"exists": {
                            "mappingDefinitionName": "m", "meteredUnit": "Present"}}}
                    ]}
                }
            ]}]
        }));
        let tables = PriceTables::from_entries(&[("m", &[("Present", 1.0)])]);
        let totals = evaluate(&d, &Map::new(), &tables);
        // Card 1 skipped entirely; card 2 emits `base` twice (not-absent
        // guard and present guard both true).
        assert!((totals.monthly - 14.0).abs() < 1e-9);
    }

    #[test]
    fn test_equality_condition_against_component() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [{"id": "mode", "type": "dropdown"}]},
                "mathsSection": {"components": [
                    {"id": "c", "type": "basicMaths", "operation": "addition",
                     "values": [{"constant": 3}]},
                    {"type": "priceDisplay", "subTotalRefer": "c",
                     "displayIf": {"==": [{"type": "component", "id": "mode"}, "provisioned"]}}
                ]}
            }]}]
        }));
        let on = evaluate(
            &d,
            &components(json!({"mode": {"value": "provisioned"}})),
            &PriceTables::default(),
        );
        assert_eq!(on.monthly, 3.0);
        let off = evaluate(
            &d,
            &components(json!({"mode": {"value": "onDemand"}})),
            &PriceTables::default(),
        );
        assert_eq!(off.monthly, 0.0);
    }

    #[test]
    fn test_rounding_methods() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [{"id": "n", "type": "numericInput"}]},
                "mathsSection": {"components": [
                    {"id": "up", "type": "rounding", "method": "roundUp",
                     "variableId": "n", "factor": 100},
                    {"id": "down", "type": "rounding", "method": "roundDown",
                     "refer": "n", "factor": 100},
                    {"id": "passthrough", "type": "rounding", "method": "banker",
                     "variableId": "n", "factor": 100},
                    {"type": "priceDisplay", "subTotalRefer": "up"},
                    {"type": "priceDisplay", "costType": "Upfront", "subTotalRefer": "down"}
                ]}
            }]}]
        }));
        let totals = evaluate(
            &d,
            &components(json!({"n": {"value": 250}})),
            &PriceTables::default(),
        );
        assert_eq!(totals.monthly, 300.0);
        assert_eq!(totals.upfront, 200.0);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [{"id": "n", "type": "numericInput"}]},
                "mathsSection": {"components": [
                    {"id": "q", "type": "basicMaths", "operation": "division",
                     "values": [{"variableId": "n"}, {"constant": 0}]},
                    {"type": "priceDisplay", "subTotalRefer": "q"}
                ]}
            }]}]
        }));
        let totals = evaluate(
            &d,
            &components(json!({"n": {"value": 42}})),
            &PriceTables::default(),
        );
        assert_eq!(totals.monthly, 0.0);
    }

    #[test]
    fn test_sized_inputs_normalized_before_math() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": [
                    {"id": "payload", "type": "fileSize"},
                    {"id": "rate", "type": "frequency"}
                ]},
                "mathsSection": {"components": [
                    {"id": "gbPerMonth", "type": "basicMaths", "operation": "multiplication",
                     "values": [{"variableId": "payload"}, {"variableId": "rate"}]},
                    {"type": "priceDisplay", "subTotalRefer": "gbPerMonth"}
                ]}
            }]}]
        }));
        let totals = evaluate(
            &d,
            &components(json!({
                "payload": {"value": 512, "unit": "MB"},
                "rate": {"value": 2, "unit": "per day"}
            })),
            &PriceTables::default(),
        );
        // 0.5 GB × 60 per month
        assert!((totals.monthly - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_total_clamps_to_zero() {
        let d = def(json!({
            "templates": [{"cards": [{
                "inputSection": {"components": []},
                "mathsSection": {"components": [
                    {"id": "neg", "type": "basicMaths", "operation": "subtraction",
                     "values": [{"constant": 0}, {"constant": 5}]},
                    {"type": "priceDisplay", "subTotalRefer": "neg"}
                ]}
            }]}]
        }));
        let totals = evaluate(&d, &Map::new(), &PriceTables::default());
        assert_eq!(totals.monthly, 0.0);
    }

    #[test]
    fn test_only_first_template_runs() {
        let d = def(json!({
            "templates": [
                {"id": "a", "cards": [{"inputSection": {"components": []},
                    "mathsSection": {"components": [
                        {"id": "x", "type": "basicMaths", "operation": "addition",
                         "values": [{"constant": 1}]},
                        {"type": "priceDisplay", "subTotalRefer": "x"}
                    ]}}]},
                {"id": "b", "cards": [{"inputSection": {"components": []},
                    "mathsSection": {"components": [
                        {"id": "y", "type": "basicMaths", "operation": "addition",
                         "values": [{"constant": 100}]},
                        {"type": "priceDisplay", "subTotalRefer": "y"}
                    ]}}]}
            ]
        }));
        let totals = evaluate(&d, &Map::new(), &PriceTables::default());
        assert_eq!(totals.monthly, 1.0);
    }
}
