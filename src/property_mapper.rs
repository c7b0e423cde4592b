use crate::{
    diagnostics::TransformContext,
    property_rule::{MappingError, PropertyMappingSpec, PropertyTable},
    rewriter::rewrite_property,
    schema::{try_walk, Element, Schema},
};

/// Rename, relocate and delete properties across a whole schema.
///
/// A static table is applied one entry at a time, each entry walking the
/// entire schema before the next one starts. A dynamic spec derives a table
/// per element and applies all of its entries to that element in order.
pub fn map_properties(
    schema: &Schema,
    spec: Option<&PropertyMappingSpec>,
    ctx: &mut TransformContext,
) -> Result<Schema, MappingError> {
    match spec {
        None => Ok(schema.clone()),
        Some(PropertyMappingSpec::Static(table)) => map_static(schema, table, ctx),
        Some(PropertyMappingSpec::Dynamic(derive)) => try_walk(schema, |element| {
            let table = derive(element)?;
            apply_table(element, &table, ctx)
        }),
    }
}

fn map_static(
    schema: &Schema,
    table: &PropertyTable,
    ctx: &mut TransformContext,
) -> Result<Schema, MappingError> {
    let mut mapped = schema.clone();
    for (property, directive) in table.iter() {
        mapped = try_walk(&mapped, |element| {
            rewrite_property(element, property, directive, ctx).map(|rewrite| rewrite.element)
        })?;
    }
    Ok(mapped)
}

/// Thread one element through every entry of `table`
fn apply_table(
    element: &Element,
    table: &PropertyTable,
    ctx: &mut TransformContext,
) -> Result<Element, MappingError> {
    let mut current = element.clone();
    for (property, directive) in table.iter() {
        current = rewrite_property(&current, property, directive, ctx)?.element;
    }
    Ok(current)
}
