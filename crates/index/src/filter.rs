//! Metadata filter evaluation for local stores.
//!
//! Supports the Pinecone operator subset: `$eq $ne $gt $gte $lt $lte $in $nin $exists`,
//! `$and` / `$or`, and the shorthand `{"field": value}` for equality.

use serde_json::Value;

use crate::{IndexError, Metadata};

/// `true` when `metadata` satisfies `filter`.
pub(crate) fn matches_filter(metadata: &Metadata, filter: &Value) -> Result<bool, IndexError> {
    let clauses = filter
        .as_object()
        .ok_or_else(|| IndexError::validation("filter must be a JSON object"))?;

    for (key, condition) in clauses {
        let ok = match key.as_str() {
            "$and" => each_clause(condition, key)?
                .iter()
                .try_fold(true, |acc, c| Ok::<_, IndexError>(acc && matches_filter(metadata, c)?))?,
            "$or" => {
                let mut any = false;
                for c in each_clause(condition, key)? {
                    if matches_filter(metadata, c)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            op if op.starts_with('$') => {
                return Err(IndexError::validation(format!(
                    "unsupported top-level filter operator {op}"
                )))
            }
            field => matches_field(metadata.get(field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn each_clause<'a>(condition: &'a Value, op: &str) -> Result<&'a Vec<Value>, IndexError> {
    condition
        .as_array()
        .ok_or_else(|| IndexError::validation(format!("{op} expects an array of filters")))
}

fn matches_field(actual: Option<&Value>, condition: &Value) -> Result<bool, IndexError> {
    let ops = match condition {
        Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) => ops,
        // Shorthand equality
        other => return Ok(actual.is_some_and(|a| scalar_eq(a, other))),
    };

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => actual.is_some_and(|a| scalar_eq(a, operand)),
            "$ne" => !actual.is_some_and(|a| scalar_eq(a, operand)),
            "$gt" => compare(actual, operand, |o| o.is_gt()),
            "$gte" => compare(actual, operand, |o| o.is_ge()),
            "$lt" => compare(actual, operand, |o| o.is_lt()),
            "$lte" => compare(actual, operand, |o| o.is_le()),
            "$in" => list(operand, op)?
                .iter()
                .any(|candidate| actual.is_some_and(|a| scalar_eq(a, candidate))),
            "$nin" => !list(operand, op)?
                .iter()
                .any(|candidate| actual.is_some_and(|a| scalar_eq(a, candidate))),
            "$exists" => {
                let wanted = operand
                    .as_bool()
                    .ok_or_else(|| IndexError::validation("$exists expects a boolean"))?;
                actual.is_some() == wanted
            }
            other => {
                return Err(IndexError::validation(format!(
                    "unsupported filter operator {other}"
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn list<'a>(operand: &'a Value, op: &str) -> Result<&'a Vec<Value>, IndexError> {
    operand
        .as_array()
        .ok_or_else(|| IndexError::validation(format!("{op} expects an array")))
}

/// Equality where a metadata list matches when it contains the operand.
fn scalar_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(items), scalar) if !scalar.is_array() => {
            items.iter().any(|item| scalar_eq(item, scalar))
        }
        (a, b) => a == b,
    }
}

fn compare(
    actual: Option<&Value>,
    operand: &Value,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    match (actual.and_then(Value::as_f64), operand.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).is_some_and(accept),
        _ => false,
    }
}
