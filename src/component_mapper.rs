use std::collections::HashMap;

use serde_json::Value;

use crate::{
    diagnostics::TransformContext,
    schema::{walk, Schema, COMPONENT_KEY},
};

/// Source component tag to target component tag
pub type ComponentTable = HashMap<String, String>;

/// Rewrite each element's `component` tag through `table`. Elements without a
/// matching entry come back as unchanged copies.
pub fn map_components(schema: &Schema, table: &ComponentTable, ctx: &mut TransformContext) -> Schema {
    walk(schema, |element| {
        let mut mapped = element.clone();
        let target = element
            .get(COMPONENT_KEY)
            .and_then(Value::as_str)
            .and_then(|tag| table.get(tag));

        if let Some(target) = target {
            mapped.insert(COMPONENT_KEY.to_string(), Value::String(target.clone()));
            ctx.summary.components_remapped += 1;
        }
        mapped
    })
}
