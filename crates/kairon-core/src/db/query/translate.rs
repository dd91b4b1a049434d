use crate::{
    db::query::{
        DEFAULT_SEARCH_FIELD, FilterOp, PageSpec, Predicate, QueryError, QueryOptions, QueryPlan,
        RangeSpec, SortDirection, SortSpec, UPPERCASE_FIELD,
        parse::{Clause, parse_clause, split_clauses},
    },
    model::{
        entity::EntityModel,
        field::{EntityFieldKind, EntityFieldModel},
    },
    value::Value,
};

/// Translate caller query options into a plan for the given entity.
///
/// Filters are emitted in this order: one per recognised clause, then the
/// implicit `deleted == false` (soft-delete shapes only), then range bounds.
pub fn translate(opts: &QueryOptions, model: &EntityModel) -> Result<QueryPlan, QueryError> {
    if opts.limit == 0 {
        return Err(QueryError::InvalidLimit);
    }

    let mut filters = Vec::new();

    for clause in split_clauses(&opts.filter) {
        let Clause { field, value } = parse_clause(clause);
        let field = field.unwrap_or_else(|| {
            tracing::trace!(clause, "free-text clause");
            DEFAULT_SEARCH_FIELD
        });

        // unknown fields are ignored, not rejected
        let Some(field_model) = model.field(field) else {
            continue;
        };

        let raw = if field == UPPERCASE_FIELD {
            value.to_uppercase()
        } else {
            value
        };
        filters.push(clause_predicate(field_model, raw)?);
    }

    if let Some(deleted) = model.deleted_field {
        filters.push(Predicate::new(deleted, FilterOp::Eq, false));
    }

    let page = PageSpec {
        offset: opts.offset,
        limit: opts.limit,
    };

    let sort = opts
        .order_by
        .as_deref()
        .filter(|field| !field.is_empty())
        .map(|field| SortSpec {
            field: field.to_string(),
            direction: opts.direction.unwrap_or(SortDirection::Desc),
        });

    if let Some(range) = &opts.range {
        filters.extend(range_predicates(range)?);
    }

    Ok(QueryPlan {
        filters,
        sort,
        page,
    })
}

// Convert a raw clause value to the field's declared kind.
fn clause_predicate(field: &EntityFieldModel, raw: String) -> Result<Predicate, QueryError> {
    let name = field.store_name;

    match field.kind {
        EntityFieldKind::Text => Ok(Predicate::new(name, FilterOp::Eq, Value::Text(raw))),
        EntityFieldKind::Bool => {
            let parsed = parse_bool(&raw).ok_or_else(|| QueryError::InvalidBool {
                field: name.to_string(),
                value: raw.clone(),
            })?;

            Ok(Predicate::new(name, FilterOp::Eq, parsed))
        }
        EntityFieldKind::Collection => {
            Ok(Predicate::new(name, FilterOp::Contains, Value::Text(raw)))
        }
        kind @ (EntityFieldKind::Numeric | EntityFieldKind::Other) => {
            Err(QueryError::UnsupportedFieldKind {
                field: name.to_string(),
                kind: kind.label(),
            })
        }
    }
}

// Accepts the usual boolean spellings: 1/0, t/f, true/false in any common case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn range_predicates(range: &RangeSpec) -> Result<Vec<Predicate>, QueryError> {
    if range.field.is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |reason: String| QueryError::MalformedRange {
        field: range.field.clone(),
        reason,
    };

    if let Some(bad) = range.bounds.iter().find(|bound| !bound.is_scalar()) {
        return Err(malformed(format!(
            "bounds must be scalar values, got {}",
            bad.kind_label()
        )));
    }

    match range.bounds.as_slice() {
        [] => Ok(Vec::new()),
        [low] => Ok(vec![Predicate::new(&range.field, FilterOp::Gte, low.clone())]),
        [low, high] => {
            if low.loose_cmp(high).is_none() {
                return Err(malformed(format!(
                    "bounds are not comparable ({} vs {})",
                    low.kind_label(),
                    high.kind_label()
                )));
            }

            Ok(vec![
                Predicate::new(&range.field, FilterOp::Gte, low.clone()),
                Predicate::new(&range.field, FilterOp::Lt, high.clone()),
            ])
        }
        more => Err(malformed(format!(
            "expected at most 2 bounds, got {}",
            more.len()
        ))),
    }
}
