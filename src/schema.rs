use serde_json::{Map, Value};

/// A single UI-element descriptor: property name to arbitrary value
pub type Element = Map<String, Value>;

/// One rendered row of elements
pub type Row = Vec<Element>;

/// Ordered rows of elements, in rendering order
pub type Schema = Vec<Row>;

/// Property conventionally holding an element's component tag
pub const COMPONENT_KEY: &str = "component";

/// Apply `transform` to every element of every row, producing a schema of
/// identical shape. The input is left untouched.
pub fn walk<F>(schema: &Schema, mut transform: F) -> Schema
where
    F: FnMut(&Element) -> Element,
{
    schema
        .iter()
        .map(|row| row.iter().map(&mut transform).collect())
        .collect()
}

/// Fallible variant of [`walk`]. The first error aborts the walk and is
/// returned as-is.
pub fn try_walk<F, E>(schema: &Schema, mut transform: F) -> Result<Schema, E>
where
    F: FnMut(&Element) -> Result<Element, E>,
{
    let mut walked = Vec::with_capacity(schema.len());
    for row in schema {
        let mut new_row = Vec::with_capacity(row.len());
        for element in row {
            new_row.push(transform(element)?);
        }
        walked.push(new_row);
    }
    Ok(walked)
}

/// Number of elements across all rows
pub fn element_count(schema: &Schema) -> usize {
    schema.iter().map(Vec::len).sum()
}

/// Build a schema from a JSON array of arrays of objects. Non-object entries
/// are skipped, which is only ever useful for fixtures and hosts that keep
/// their layout as raw JSON.
pub fn schema_from_value(value: &Value) -> Schema {
    value
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row.as_array()
                        .map(|elements| {
                            elements
                                .iter()
                                .filter_map(|e| e.as_object().cloned())
                                .collect()
                        })
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}
