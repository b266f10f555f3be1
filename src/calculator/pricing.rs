//! Pricing-table resolution.
//!
//! A definition references named mapping definitions; each resolves to a
//! remote per-region document of metered-unit prices. All tables one
//! evaluation needs are fetched together and awaited as a set. Missing
//! names, failed fetches, and unknown units all read as zero; pricing
//! lookups never fail.

use super::definition::{ServiceDefinition, walk_components};
use super::fetch::RemoteClient;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Metered-unit string → price, for one `(mapping, region)` pair.
pub type PriceTable = HashMap<String, f64>;

/// Every table one evaluation can see, keyed by mapping-definition name.
#[derive(Debug, Clone, Default)]
pub struct PriceTables {
    tables: HashMap<String, Arc<PriceTable>>,
}

impl PriceTables {
    pub fn insert(&mut self, name: String, table: Arc<PriceTable>) {
        self.tables.insert(name, table);
    }

    /// Price for a metered unit; missing table or unit is 0.
    pub fn price(&self, mapping_name: &str, metered_unit: &str) -> f64 {
        self.tables
            .get(mapping_name)
            .and_then(|table| table.get(metered_unit))
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether the table actually quotes the unit (the `displayIf`
    /// `exists` predicate).
    pub fn has_unit(&self, mapping_name: &str, metered_unit: &str) -> bool {
        self.tables
            .get(mapping_name)
            .is_some_and(|table| table.contains_key(metered_unit))
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, &[(&str, f64)])]) -> Self {
        let mut tables = PriceTables::default();
        for (name, units) in entries {
            let table: PriceTable = units
                .iter()
                .map(|(unit, price)| (unit.to_string(), *price))
                .collect();
            tables.insert(name.to_string(), Arc::new(table));
        }
        tables
    }
}

fn price_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Object(map) => map.get("price").map(price_number).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Project a fetched pricing document down to one region's unit→price map.
/// Prices arrive as strings, numbers, or `{price: "…"}` objects; anything
/// unparsable becomes 0.
pub fn project_region_table(doc: &Value, region_name: &str) -> PriceTable {
    let Some(region) = doc
        .get("regions")
        .and_then(|r| r.get(region_name))
        .and_then(Value::as_object)
    else {
        return PriceTable::new();
    };
    region
        .iter()
        .map(|(unit, value)| (unit.clone(), price_number(value)))
        .collect()
}

fn collect_from_condition(condition: &Value, names: &mut BTreeSet<String>) {
    match condition {
        Value::Object(map) => {
            if let Some(exists) = map.get("exists")
                && let Some(name) = exists.get("mappingDefinitionName").and_then(Value::as_str)
            {
                names.insert(name.to_string());
            }
            for key in ["and", "or", "not"] {
                if let Some(inner) = map.get(key) {
                    collect_from_condition(inner, names);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_from_condition(item, names);
            }
        }
        _ => {}
    }
}

/// Pre-scan the template tree for every mapping-definition name the
/// evaluation can touch: pricing components plus `displayIf` existence
/// checks (on cards and on operators).
pub fn collect_mapping_names(def: &ServiceDefinition) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for template in &def.templates {
        for card in &template.cards {
            if let Some(condition) = &card.display_if {
                collect_from_condition(condition, &mut names);
            }
            for section in [&card.input_section, &card.maths_section] {
                walk_components(&section.components, &mut |component| {
                    if let Some(name) = component.mapping_definition_name.as_deref() {
                        names.insert(name.to_string());
                    }
                    if let Some(condition) = &component.display_if {
                        collect_from_condition(condition, &mut names);
                    }
                });
            }
        }
    }
    names
}

/// Fetch every referenced table for one region, concurrently. Unresolved
/// names fall back to the default URL shape; failures yield empty tables.
pub async fn load_price_tables(
    client: &RemoteClient,
    def: &ServiceDefinition,
    region_name: &str,
) -> PriceTables {
    let endpoints = client.endpoints();
    let names = collect_mapping_names(def);
    let fetches = names.into_iter().map(|name| {
        let url = def
            .mapping_url(&name)
            .map(|template| template.replace("[currency]", &endpoints.currency))
            .unwrap_or_else(|| endpoints.default_pricing_url(&name));
        async move {
            let table = client.price_table(&name, region_name, &url).await;
            (name, table)
        }
    });

    let mut tables = PriceTables::default();
    for (name, table) in futures::future::join_all(fetches).await {
        tables.insert(name, table);
    }
    tables
}
