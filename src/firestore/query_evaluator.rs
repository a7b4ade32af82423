use std::cmp::Ordering;

use crate::firestore::api::{FieldFilter, FilterOperator, OrderBy, OrderDirection, QueryConstraint, QueryDocumentSnapshot};
use crate::firestore::value::{FirestoreValue, ValueKind};

/// Filters, orders and truncates a fetched collection the way the server would
/// run the same constraints.
///
/// Filters are ANDed in declaration order. All `OrderBy` constraints form one
/// stable multi-key sort, so documents equal on every key keep their source
/// order. When several limits are declared the last one wins.
pub(crate) fn apply_constraints(
    documents: Vec<QueryDocumentSnapshot>,
    constraints: &[QueryConstraint],
) -> Vec<QueryDocumentSnapshot> {
    let mut filters = Vec::new();
    let mut order_by = Vec::new();
    let mut limit = None;
    for constraint in constraints {
        match constraint {
            QueryConstraint::Where(filter) => filters.push(filter),
            QueryConstraint::OrderBy(order) => order_by.push(order),
            QueryConstraint::Limit(count) => limit = Some(*count),
        }
    }

    let mut results: Vec<QueryDocumentSnapshot> = documents
        .into_iter()
        .filter(|snapshot| filters.iter().all(|filter| filter_matches(filter, snapshot)))
        .collect();

    if !order_by.is_empty() {
        // `sort_by` is stable.
        results.sort_by(|left, right| compare_snapshots(left, right, &order_by));
    }

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    results
}

pub(crate) fn filter_matches(filter: &FieldFilter, snapshot: &QueryDocumentSnapshot) -> bool {
    match snapshot.data().get_path(filter.field()) {
        Some(value) => evaluate_filter(filter, value),
        None => false,
    }
}

fn evaluate_filter(filter: &FieldFilter, value: &FirestoreValue) -> bool {
    let operand = filter.value();
    match filter.operator() {
        FilterOperator::Equal => value.loosely_equals(operand),
        FilterOperator::NotEqual => !value.loosely_equals(operand),
        FilterOperator::LessThan => range_compare(value, operand) == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => matches!(
            range_compare(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FilterOperator::GreaterThan => range_compare(value, operand) == Some(Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => matches!(
            range_compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::ArrayContains => value
            .as_array()
            .map(|array| array.contains(operand))
            .unwrap_or(false),
        FilterOperator::In => operand
            .as_array()
            .map(|candidates| candidates.contains(value))
            .unwrap_or(false),
        FilterOperator::NotIn => operand
            .as_array()
            .map(|candidates| !candidates.contains(value))
            .unwrap_or(false),
        FilterOperator::ArrayContainsAny => match (value.as_array(), operand.as_array()) {
            (Some(array), Some(candidates)) => candidates.values().iter().any(|needle| array.contains(needle)),
            _ => false,
        },
        FilterOperator::Matches => match (value.as_str(), filter.pattern()) {
            (Some(text), Some(pattern)) => pattern.is_match(text),
            _ => false,
        },
    }
}

#[derive(PartialEq, Eq)]
enum TypeClass {
    Number,
    Text,
    Boolean,
    Timestamp,
    Other,
}

fn type_class(value: &FirestoreValue) -> TypeClass {
    match value.kind() {
        ValueKind::Integer(_) | ValueKind::Double(_) => TypeClass::Number,
        ValueKind::String(_) => TypeClass::Text,
        ValueKind::Boolean(_) => TypeClass::Boolean,
        ValueKind::Timestamp(_) => TypeClass::Timestamp,
        _ => TypeClass::Other,
    }
}

// Range operators never cross type classes.
fn range_compare(left: &FirestoreValue, right: &FirestoreValue) -> Option<Ordering> {
    let class = type_class(left);
    if class == TypeClass::Other || class != type_class(right) {
        return None;
    }
    Some(compare_values(Some(left), Some(right)))
}

fn compare_snapshots(left: &QueryDocumentSnapshot, right: &QueryDocumentSnapshot, order_by: &[&OrderBy]) -> Ordering {
    for order in order_by {
        let ordering = compare_values(
            left.data().get_path(order.field()),
            right.data().get_path(order.field()),
        );
        let ordering = match order.direction() {
            OrderDirection::Ascending => ordering,
            OrderDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Total order used for sorting. Null and missing values sort first and are
/// equal to each other; otherwise values are ranked by kind (boolean, number,
/// timestamp, string, everything else) and compared within their kind.
pub(crate) fn compare_values(left: Option<&FirestoreValue>, right: Option<&FirestoreValue>) -> Ordering {
    let left = left.filter(|value| !value.is_null());
    let right = right.filter(|value| !value.is_null());
    let (left, right) = match (left, right) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(left), Some(right)) => (left, right),
    };

    match (left.kind(), right.kind()) {
        (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a.cmp(b),
        (ValueKind::Integer(a), ValueKind::Integer(b)) => a.cmp(b),
        (ValueKind::Double(a), ValueKind::Double(b)) => compare_doubles(*a, *b),
        (ValueKind::Integer(a), ValueKind::Double(b)) => compare_integer_double(*a, *b),
        (ValueKind::Double(a), ValueKind::Integer(b)) => compare_integer_double(*b, *a).reverse(),
        (ValueKind::Timestamp(a), ValueKind::Timestamp(b)) => a.cmp(b),
        (ValueKind::String(a), ValueKind::String(b)) => compare_strings(a, b),
        _ => sort_rank(left)
            .cmp(&sort_rank(right))
            .then_with(|| compare_strings(&left.to_string(), &right.to_string())),
    }
}

fn sort_rank(value: &FirestoreValue) -> u8 {
    match type_class(value) {
        TypeClass::Boolean => 0,
        TypeClass::Number => 1,
        TypeClass::Timestamp => 2,
        TypeClass::Text => 3,
        TypeClass::Other => 4,
    }
}

// NaN sorts before every other number.
fn compare_doubles(left: f64, right: f64) -> Ordering {
    match (left.is_nan(), right.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    }
}

// Exact: large integers are not rounded through f64.
fn compare_integer_double(integer: i64, double: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if double.is_nan() {
        return Ordering::Greater;
    }
    if double >= TWO_POW_63 {
        return Ordering::Less;
    }
    if double < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let truncated = double.trunc();
    integer.cmp(&(truncated as i64)).then_with(|| {
        if double > truncated {
            Ordering::Less
        } else if double < truncated {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

fn compare_strings(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}
