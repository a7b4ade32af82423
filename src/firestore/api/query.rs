use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;

use crate::firestore::error::{invalid_argument, FirestoreError, FirestoreResult};
use crate::firestore::model::{FieldPath, IntoFieldPath};
use crate::firestore::query_evaluator::apply_constraints;
use crate::firestore::remote::datastore::RunQueryRequest;
use crate::firestore::remote::serializer::JsonProtoSerializer;
use crate::firestore::remote::structured_query::encode_structured_query;
use crate::firestore::value::FirestoreValue;

use super::database::Firestore;
use super::reference::CollectionReference;
use super::snapshot::QueryDocumentSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
    NotIn,
    ArrayContainsAny,
    /// Regular-expression test against string fields.
    Matches,
}

impl FilterOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
            FilterOperator::ArrayContainsAny => "array-contains-any",
            FilterOperator::Matches => "matches",
        }
    }

    /// The structured-query operator name, or `None` when the server has no
    /// equivalent.
    pub fn server_name(&self) -> Option<&'static str> {
        match self {
            FilterOperator::Equal => Some("EQUAL"),
            FilterOperator::NotEqual => Some("NOT_EQUAL"),
            FilterOperator::LessThan => Some("LESS_THAN"),
            FilterOperator::LessThanOrEqual => Some("LESS_THAN_OR_EQUAL"),
            FilterOperator::GreaterThan => Some("GREATER_THAN"),
            FilterOperator::GreaterThanOrEqual => Some("GREATER_THAN_OR_EQUAL"),
            FilterOperator::ArrayContains => Some("ARRAY_CONTAINS"),
            FilterOperator::In => Some("IN"),
            FilterOperator::NotIn => Some("NOT_IN"),
            FilterOperator::ArrayContainsAny => Some("ARRAY_CONTAINS_ANY"),
            FilterOperator::Matches => None,
        }
    }

    fn requires_array(&self) -> bool {
        matches!(
            self,
            FilterOperator::In | FilterOperator::NotIn | FilterOperator::ArrayContainsAny
        )
    }
}

impl FromStr for FilterOperator {
    type Err = FirestoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let operator = match value {
            "==" => FilterOperator::Equal,
            "!=" => FilterOperator::NotEqual,
            "<" => FilterOperator::LessThan,
            "<=" => FilterOperator::LessThanOrEqual,
            ">" => FilterOperator::GreaterThan,
            ">=" => FilterOperator::GreaterThanOrEqual,
            "array-contains" => FilterOperator::ArrayContains,
            "in" => FilterOperator::In,
            "not-in" => FilterOperator::NotIn,
            "array-contains-any" => FilterOperator::ArrayContainsAny,
            "matches" => FilterOperator::Matches,
            other => return Err(invalid_argument(format!("Unknown filter operator '{other}'"))),
        };
        Ok(operator)
    }
}

impl Display for FilterOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Ascending => "ASCENDING",
            OrderDirection::Descending => "DESCENDING",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = FirestoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Ascending),
            "desc" => Ok(OrderDirection::Descending),
            _ => Err(invalid_argument(format!(
                "Order direction must be 'asc' or 'desc', got '{value}'"
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldFilter {
    field: FieldPath,
    operator: FilterOperator,
    value: FirestoreValue,
    pattern: Option<Regex>,
}

impl FieldFilter {
    fn new(field: FieldPath, operator: FilterOperator, value: FirestoreValue) -> FirestoreResult<Self> {
        if operator.requires_array() {
            match value.as_array() {
                Some(array) if !array.is_empty() => {}
                _ => {
                    return Err(invalid_argument(format!(
                        "'{operator}' filters on '{field}' require a non-empty array value"
                    )))
                }
            }
        }

        let pattern = if operator == FilterOperator::Matches {
            let source = value.as_str().ok_or_else(|| {
                invalid_argument(format!("'matches' filter on '{field}' requires a string pattern"))
            })?;
            let compiled = Regex::new(source)
                .map_err(|err| invalid_argument(format!("Invalid pattern for '{field}': {err}")))?;
            Some(compiled)
        } else {
            None
        };

        Ok(Self {
            field,
            operator,
            value,
            pattern,
        })
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &FirestoreValue {
        &self.value
    }

    /// The compiled pattern of a `matches` filter.
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    field: FieldPath,
    direction: OrderDirection,
}

impl OrderBy {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}

/// One declarative clause narrowing a query. Constraints are validated when
/// built and never change afterwards.
#[derive(Clone, Debug)]
pub enum QueryConstraint {
    Where(FieldFilter),
    OrderBy(OrderBy),
    Limit(usize),
}

impl QueryConstraint {
    pub fn where_field(
        field: impl IntoFieldPath,
        operator: FilterOperator,
        value: impl Into<FirestoreValue>,
    ) -> FirestoreResult<Self> {
        let field = field.into_field_path()?;
        FieldFilter::new(field, operator, value.into()).map(QueryConstraint::Where)
    }

    pub fn order_by(field: impl IntoFieldPath, direction: OrderDirection) -> FirestoreResult<Self> {
        Ok(QueryConstraint::OrderBy(OrderBy {
            field: field.into_field_path()?,
            direction,
        }))
    }

    pub fn limit(count: i64) -> FirestoreResult<Self> {
        if count <= 0 || count > i64::from(i32::MAX) {
            return Err(invalid_argument(format!(
                "limit must be a positive integer, got {count}"
            )));
        }
        Ok(QueryConstraint::Limit(count as usize))
    }
}

pub fn where_field(
    field: impl IntoFieldPath,
    operator: FilterOperator,
    value: impl Into<FirestoreValue>,
) -> FirestoreResult<QueryConstraint> {
    QueryConstraint::where_field(field, operator, value)
}

pub fn order_by(field: impl IntoFieldPath, direction: OrderDirection) -> FirestoreResult<QueryConstraint> {
    QueryConstraint::order_by(field, direction)
}

pub fn limit(count: i64) -> FirestoreResult<QueryConstraint> {
    QueryConstraint::limit(count)
}

/// How a query with constraints is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryStrategy {
    /// Compile to a structured query when the datastore can run it and every
    /// filter has a server equivalent, otherwise evaluate client-side.
    #[default]
    Auto,
    /// Always compile; filters without a server equivalent are rejected.
    Structured,
    /// Fetch the whole collection and filter, sort and limit locally.
    ClientSide,
}

#[derive(Debug)]
struct ConstraintNode {
    constraint: QueryConstraint,
    previous: Option<Arc<ConstraintNode>>,
}

// Persistent list: appending shares every earlier node with the source query.
#[derive(Clone, Debug, Default)]
struct ConstraintList {
    tail: Option<Arc<ConstraintNode>>,
    len: usize,
}

impl ConstraintList {
    fn push(&self, constraint: QueryConstraint) -> Self {
        Self {
            tail: Some(Arc::new(ConstraintNode {
                constraint,
                previous: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    fn to_vec(&self) -> Vec<QueryConstraint> {
        let mut constraints = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            constraints.push(node.constraint.clone());
            cursor = node.previous.as_deref();
        }
        constraints.reverse();
        constraints
    }
}

/// An immutable query over one collection. Adding a constraint returns a new
/// query and leaves the original untouched.
#[derive(Clone, Debug)]
pub struct Query {
    collection: CollectionReference,
    constraints: ConstraintList,
}

impl Query {
    pub(crate) fn new(collection: CollectionReference) -> Self {
        Self {
            collection,
            constraints: ConstraintList::default(),
        }
    }

    pub fn collection(&self) -> &CollectionReference {
        &self.collection
    }

    pub fn firestore(&self) -> &Firestore {
        self.collection.firestore()
    }

    /// Constraints in declaration order.
    pub fn constraints(&self) -> Vec<QueryConstraint> {
        self.constraints.to_vec()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len
    }

    pub fn with_constraint(&self, constraint: QueryConstraint) -> Query {
        Query {
            collection: self.collection.clone(),
            constraints: self.constraints.push(constraint),
        }
    }

    pub fn where_field(
        &self,
        field: impl IntoFieldPath,
        operator: FilterOperator,
        value: impl Into<FirestoreValue>,
    ) -> FirestoreResult<Query> {
        Ok(self.with_constraint(QueryConstraint::where_field(field, operator, value)?))
    }

    pub fn order_by(&self, field: impl IntoFieldPath, direction: OrderDirection) -> FirestoreResult<Query> {
        Ok(self.with_constraint(QueryConstraint::order_by(field, direction)?))
    }

    pub fn limit(&self, count: i64) -> FirestoreResult<Query> {
        Ok(self.with_constraint(QueryConstraint::limit(count)?))
    }

    /// Runs the query with the client's configured strategy.
    pub async fn get(&self) -> FirestoreResult<QuerySnapshot> {
        self.get_with(self.firestore().settings().query_strategy).await
    }

    pub async fn get_with(&self, strategy: QueryStrategy) -> FirestoreResult<QuerySnapshot> {
        let constraints = self.constraints();
        if constraints.is_empty() {
            let snapshot = self.collection.get().await?;
            return Ok(QuerySnapshot::new(self.clone(), snapshot.into_documents()));
        }

        let datastore = self.firestore().datastore();
        let structured = match strategy {
            QueryStrategy::Auto => {
                datastore.supports_structured_query() && constraints.iter().all(has_server_equivalent)
            }
            QueryStrategy::Structured => true,
            QueryStrategy::ClientSide => false,
        };

        let documents = if structured {
            let serializer = JsonProtoSerializer::new(self.firestore().database_id().clone());
            let request = RunQueryRequest {
                collection: self.collection.path().clone(),
                structured_query: encode_structured_query(&serializer, self.collection.id(), &constraints)?,
            };
            log::debug!("running structured query on '{}'", self.collection.path());
            datastore
                .run_query(&request)
                .await?
                .into_iter()
                .map(|document| self.firestore().query_document(document))
                .collect()
        } else {
            log::debug!("evaluating query on '{}' client-side", self.collection.path());
            let snapshot = self.collection.get().await?;
            apply_constraints(snapshot.into_documents(), &constraints)
        };

        Ok(QuerySnapshot::new(self.clone(), documents))
    }
}

fn has_server_equivalent(constraint: &QueryConstraint) -> bool {
    match constraint {
        QueryConstraint::Where(filter) => filter.operator().server_name().is_some(),
        _ => true,
    }
}

/// Builds a query over `collection` from a list of constraints.
pub fn query<I>(collection: &CollectionReference, constraints: I) -> Query
where
    I: IntoIterator<Item = QueryConstraint>,
{
    constraints
        .into_iter()
        .fold(collection.query(), |query, constraint| query.with_constraint(constraint))
}

/// The ordered result of a query or collection read.
#[derive(Clone, Debug)]
pub struct QuerySnapshot {
    query: Query,
    documents: Vec<QueryDocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(query: Query, documents: Vec<QueryDocumentSnapshot>) -> Self {
        Self { query, documents }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn documents(&self) -> &[QueryDocumentSnapshot] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<QueryDocumentSnapshot> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryDocumentSnapshot> {
        self.documents.iter()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = QueryDocumentSnapshot;
    type IntoIter = std::vec::IntoIter<QueryDocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a QueryDocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, QueryDocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
