use serde_json::{json, Value as JsonValue};

use crate::firestore::api::query::{FieldFilter, QueryConstraint};
use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::remote::serializer::JsonProtoSerializer;

/// Compiles a constraint list into a `structuredQuery` body.
///
/// Filters are combined with a flat `AND`; `orderBy` entries keep declaration
/// order and the last declared limit wins. Operators without a server
/// equivalent are rejected.
pub(crate) fn encode_structured_query(
    serializer: &JsonProtoSerializer,
    collection_id: &str,
    constraints: &[QueryConstraint],
) -> FirestoreResult<JsonValue> {
    let mut structured = serde_json::Map::new();
    structured.insert("from".to_string(), json!([{ "collectionId": collection_id }]));

    let mut filters = Vec::new();
    let mut orders = Vec::new();
    let mut limit = None;
    for constraint in constraints {
        match constraint {
            QueryConstraint::Where(filter) => filters.push(encode_field_filter(serializer, filter)?),
            QueryConstraint::OrderBy(order) => orders.push(json!({
                "field": { "fieldPath": serializer.field_path(order.field()) },
                "direction": order.direction().as_str(),
            })),
            QueryConstraint::Limit(count) => limit = Some(*count),
        }
    }

    match filters.len() {
        0 => {}
        1 => {
            structured.insert("where".to_string(), filters.remove(0));
        }
        _ => {
            structured.insert(
                "where".to_string(),
                json!({
                    "compositeFilter": {
                        "op": "AND",
                        "filters": filters
                    }
                }),
            );
        }
    }

    if !orders.is_empty() {
        structured.insert("orderBy".to_string(), JsonValue::Array(orders));
    }

    if let Some(limit) = limit {
        structured.insert("limit".to_string(), json!(limit as i64));
    }

    Ok(JsonValue::Object(structured))
}

fn encode_field_filter(serializer: &JsonProtoSerializer, filter: &FieldFilter) -> FirestoreResult<JsonValue> {
    let op = filter.operator().server_name().ok_or_else(|| {
        invalid_argument(format!(
            "Operator '{}' on '{}' cannot be sent in a structured query",
            filter.operator(),
            filter.field()
        ))
    })?;
    Ok(json!({
        "fieldFilter": {
            "field": { "fieldPath": serializer.field_path(filter.field()) },
            "op": op,
            "value": serializer.encode_value(filter.value())?
        }
    }))
}
