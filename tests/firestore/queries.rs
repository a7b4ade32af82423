use firestore_lite::firestore::{
    limit, order_by, query, where_field, CollectionReference, FilterOperator, FirestoreErrorCode, FirestoreValue,
    Firestore, MapValue, OrderDirection, QueryStrategy,
};

fn map(entries: &[(&str, FirestoreValue)]) -> MapValue {
    entries.iter().cloned().collect()
}

async fn seeded(entries: Vec<(&str, MapValue)>) -> CollectionReference {
    let items = Firestore::in_memory("demo-project").unwrap().collection("items").unwrap();
    for (id, data) in entries {
        items.doc(Some(id)).unwrap().set(data, None).await.unwrap();
    }
    items
}

fn ids(snapshot: &firestore_lite::firestore::QuerySnapshot) -> Vec<String> {
    snapshot.iter().map(|doc| doc.id().to_string()).collect()
}

#[tokio::test]
async fn multi_key_order_breaks_ties_with_later_keys() {
    let items = seeded(vec![
        ("first", map(&[("n", "b".into()), ("v", 2.into())])),
        ("second", map(&[("n", "a".into()), ("v", 2.into())])),
        ("third", map(&[("n", "a".into()), ("v", 1.into())])),
    ])
    .await;

    let snapshot = items
        .query()
        .order_by("n", OrderDirection::Ascending)
        .unwrap()
        .order_by("v", OrderDirection::Ascending)
        .unwrap()
        .get()
        .await
        .unwrap();

    let pairs: Vec<(String, i64)> = snapshot
        .iter()
        .map(|doc| {
            (
                doc.get("n").unwrap().and_then(FirestoreValue::as_str).unwrap().to_string(),
                doc.get("v").unwrap().and_then(FirestoreValue::as_i64).unwrap(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![("a".to_string(), 1), ("a".to_string(), 2), ("b".to_string(), 2)]
    );
}

#[tokio::test]
async fn limit_keeps_the_leading_results() {
    let items = seeded(vec![
        ("c1", map(&[("rank", 1.into())])),
        ("c2", map(&[("rank", 2.into())])),
        ("c3", map(&[("rank", 3.into())])),
        ("c4", map(&[("rank", 4.into())])),
        ("c5", map(&[("rank", 5.into())])),
    ])
    .await;

    let snapshot = query(
        &items,
        [order_by("rank", OrderDirection::Descending).unwrap(), limit(2).unwrap()],
    )
    .get()
    .await
    .unwrap();
    assert_eq!(ids(&snapshot), vec!["c5", "c4"]);
}

#[tokio::test]
async fn in_filter_matches_listed_values_only() {
    let items = seeded(vec![
        ("one", map(&[("role", "a".into())])),
        ("two", map(&[("role", "b".into())])),
        ("three", map(&[("role", "c".into())])),
    ])
    .await;

    let snapshot = items
        .query()
        .where_field("role", FilterOperator::In, vec!["a", "b"])
        .unwrap()
        .get()
        .await
        .unwrap();
    assert_eq!(ids(&snapshot), vec!["one", "two"]);

    let err = where_field("role", FilterOperator::In, "a").unwrap_err();
    assert_eq!(err.code, FirestoreErrorCode::InvalidArgument);
}

#[tokio::test]
async fn queries_are_persistent_values() {
    let items = seeded(vec![
        ("young", map(&[("age", 17.into())])),
        ("adult", map(&[("age", 30.into())])),
        ("senior", map(&[("age", 70.into())])),
    ])
    .await;

    let adults = items.query().where_field("age", FilterOperator::GreaterThanOrEqual, 18).unwrap();
    let first_adult = adults.order_by("age", OrderDirection::Ascending).unwrap().limit(1).unwrap();

    assert_eq!(adults.get().await.unwrap().len(), 2);
    assert_eq!(ids(&first_adult.get().await.unwrap()), vec!["adult"]);
    assert_eq!(adults.constraint_count(), 1);
}

#[tokio::test]
async fn matches_filters_strings_with_a_regex() {
    let items = seeded(vec![
        ("ann", map(&[("name", "Ann".into())])),
        ("bob", map(&[("name", "Bob".into())])),
        ("anon", map(&[("name", 7.into())])),
    ])
    .await;

    let snapshot = items
        .query()
        .where_field("name", FilterOperator::Matches, "^[AB]")
        .unwrap()
        .get_with(QueryStrategy::ClientSide)
        .await
        .unwrap();
    assert_eq!(ids(&snapshot), vec!["ann", "bob"]);
}

#[tokio::test]
async fn client_side_results_are_query_documents() {
    let items = seeded(vec![("only", map(&[("tags", vec!["x", "y"].into())]))]).await;
    let snapshot = items
        .query()
        .where_field("tags", FilterOperator::ArrayContains, "y")
        .unwrap()
        .get()
        .await
        .unwrap();
    let documents = snapshot.into_documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].reference().path().canonical_string(), "demo-project/items/only");
}
