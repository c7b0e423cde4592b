use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::{Notice, TransformContext},
    property_rule::{directive_key, is_falsy, Directive, MappingError},
    schema::Element,
};

/// What a single rewrite did to its element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteOutcome {
    Renamed { from: String, to: String },
    Deleted { property: String },
    /// A computed directive answered with a falsy value
    Skipped { property: String },
    /// The element has no such property
    Missing { property: String },
}

/// A rewritten element together with what happened to it
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub element: Element,
    pub outcome: RewriteOutcome,
}

/// Rename, relocate or remove one property of `element`.
///
/// Computed directives are evaluated first; a falsy result leaves the element
/// untouched. Only [`Directive::Delete`] removes a property without a
/// replacement. A rename onto an existing property overwrites it.
pub fn rewrite_property(
    element: &Element,
    property: &str,
    directive: &Directive,
    ctx: &mut TransformContext,
) -> Result<Rewrite, MappingError> {
    let target = match directive {
        Directive::Rename(target) => Some(target.clone()),
        Directive::Delete => None,
        Directive::Computed(compute) => {
            let computed = compute(element)?;
            if is_falsy(&computed) {
                return Ok(unchanged(
                    element,
                    RewriteOutcome::Skipped {
                        property: property.to_string(),
                    },
                    ctx,
                ));
            }
            Some(directive_key(&computed))
        }
    };

    let mut rewritten = element.clone();
    let Some(value) = rewritten.shift_remove(property) else {
        ctx.notify(Notice::missing_property(property));
        return Ok(unchanged(
            element,
            RewriteOutcome::Missing {
                property: property.to_string(),
            },
            ctx,
        ));
    };

    let outcome = match target {
        Some(to) => {
            rewritten.insert(to.clone(), value);
            RewriteOutcome::Renamed {
                from: property.to_string(),
                to,
            }
        }
        None => RewriteOutcome::Deleted {
            property: property.to_string(),
        },
    };

    ctx.summary.record(&outcome);
    Ok(Rewrite {
        element: rewritten,
        outcome,
    })
}

fn unchanged(element: &Element, outcome: RewriteOutcome, ctx: &mut TransformContext) -> Rewrite {
    ctx.summary.record(&outcome);
    Rewrite {
        element: element.clone(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, MemorySink, NoticeKind, Verbosity};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn element(value: Value) -> Element {
        value.as_object().cloned().unwrap()
    }

    fn context() -> (TransformContext, MemorySink) {
        let sink = MemorySink::new();
        let diagnostics = Diagnostics::with_sink(sink.clone()).with_verbosity(Verbosity::Verbose);
        (TransformContext::new(diagnostics), sink)
    }

    #[test]
    fn test_rename_keeps_value() {
        let (mut ctx, sink) = context();
        let input = element(json!({ "model": "firstName", "label": "First Name" }));

        let rewrite = rewrite_property(&input, "label", &Directive::rename("tag"), &mut ctx).unwrap();

        assert_eq!(rewrite.element, element(json!({ "model": "firstName", "tag": "First Name" })));
        assert_eq!(
            rewrite.outcome,
            RewriteOutcome::Renamed {
                from: "label".to_string(),
                to: "tag".to_string()
            }
        );
        assert!(sink.is_empty());
        assert_eq!(ctx.summary.properties_renamed, 1);
    }

    #[test]
    fn test_rename_does_not_mutate_input() {
        let (mut ctx, _) = context();
        let input = element(json!({ "label": "First Name" }));
        let before = input.clone();

        rewrite_property(&input, "label", &Directive::rename("tag"), &mut ctx).unwrap();
        assert_eq!(input, before);
    }

    #[test]
    fn test_delete_adds_no_replacement() {
        let (mut ctx, _) = context();
        let input = element(json!({ "model": "firstName", "label": "First Name" }));

        let rewrite = rewrite_property(&input, "label", &Directive::Delete, &mut ctx).unwrap();

        assert_eq!(rewrite.element, element(json!({ "model": "firstName" })));
        assert_eq!(ctx.summary.properties_deleted, 1);
    }

    #[test]
    fn test_missing_property_emits_notice() {
        let (mut ctx, sink) = context();
        let input = element(json!({ "model": "firstName" }));

        let rewrite = rewrite_property(&input, "label", &Directive::Delete, &mut ctx).unwrap();

        assert_eq!(rewrite.element, input);
        assert_eq!(
            rewrite.outcome,
            RewriteOutcome::Missing {
                property: "label".to_string()
            }
        );
        let notices = sink.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].kind, NoticeKind::MissingProperty);
        assert_eq!(ctx.summary.properties_missing, 1);
    }

    #[test]
    fn test_rename_collision_overwrites_silently() {
        let (mut ctx, sink) = context();
        let input = element(json!({ "type": "FormText", "component": "Old" }));

        let rewrite = rewrite_property(&input, "type", &Directive::rename("component"), &mut ctx).unwrap();

        assert_eq!(rewrite.element, element(json!({ "component": "FormText" })));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_rename_to_same_name_is_stable() {
        let (mut ctx, _) = context();
        let input = element(json!({ "label": "x" }));

        let rewrite = rewrite_property(&input, "label", &Directive::rename("label"), &mut ctx).unwrap();
        assert_eq!(rewrite.element, input);
    }

    #[test]
    fn test_computed_directive_uses_element() {
        let (mut ctx, _) = context();
        let input = element(json!({ "kind": "select", "options": [1, 2] }));
        let directive = Directive::computed(|e| {
            Ok(match e.get("kind").and_then(Value::as_str) {
                Some("select") => json!("items"),
                _ => json!(null),
            })
        });

        let rewrite = rewrite_property(&input, "options", &directive, &mut ctx).unwrap();
        assert_eq!(rewrite.element, element(json!({ "kind": "select", "items": [1, 2] })));
    }

    #[test]
    fn test_computed_false_skips_instead_of_deleting() {
        let (mut ctx, sink) = context();
        let input = element(json!({ "label": "First Name" }));
        let directive = Directive::computed(|_| Ok(json!(false)));

        let rewrite = rewrite_property(&input, "label", &directive, &mut ctx).unwrap();

        assert_eq!(rewrite.element, input);
        assert_eq!(
            rewrite.outcome,
            RewriteOutcome::Skipped {
                property: "label".to_string()
            }
        );
        assert!(sink.is_empty());
        assert_eq!(ctx.summary.directives_skipped, 1);
    }

    #[test]
    fn test_computed_falsy_values_skip() {
        for falsy in [json!(null), json!(0), json!("")] {
            let (mut ctx, _) = context();
            let input = element(json!({ "label": "x" }));
            let directive = Directive::computed(move |_| Ok(falsy.clone()));

            let rewrite = rewrite_property(&input, "label", &directive, &mut ctx).unwrap();
            assert_eq!(rewrite.element, input);
        }
    }

    #[test]
    fn test_computed_skip_happens_before_missing_check() {
        let (mut ctx, sink) = context();
        let input = element(json!({ "model": "a" }));
        let directive = Directive::computed(|_| Ok(json!(null)));

        rewrite_property(&input, "label", &directive, &mut ctx).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_computed_non_string_is_coerced_to_key() {
        let (mut ctx, _) = context();
        let input = element(json!({ "label": "x" }));
        let directive = Directive::computed(|_| Ok(json!(true)));

        let rewrite = rewrite_property(&input, "label", &directive, &mut ctx).unwrap();
        assert_eq!(rewrite.element, element(json!({ "true": "x" })));
    }

    #[test]
    fn test_computed_error_propagates() {
        let (mut ctx, _) = context();
        let input = element(json!({ "label": "x" }));
        let directive = Directive::computed(|_| Err(MappingError::new("bad element")));

        let err = rewrite_property(&input, "label", &directive, &mut ctx).unwrap_err();
        assert_eq!(err, MappingError::new("bad element"));
    }

    #[test]
    fn test_remaining_key_order_is_preserved() {
        let (mut ctx, _) = context();
        let input = element(json!({ "a": 1, "label": 2, "b": 3 }));

        let rewrite = rewrite_property(&input, "label", &Directive::rename("tag"), &mut ctx).unwrap();
        let keys: Vec<&str> = rewrite.element.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "tag"]);
    }
}
