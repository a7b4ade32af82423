use std::collections::BTreeMap;

use firestore_lite::firestore::{
    DocumentIdSource, FirestoreErrorCode, FirestoreValue, Firestore, MapValue, SetOptions, Timestamp,
};
use serde::{Deserialize, Serialize};

fn firestore() -> Firestore {
    Firestore::in_memory("demo-project").unwrap()
}

fn map(entries: &[(&str, FirestoreValue)]) -> MapValue {
    entries.iter().cloned().collect()
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct City {
    name: String,
    population: i64,
    capital: bool,
}

#[tokio::test]
async fn missing_document_reads_as_not_existing() {
    let snapshot = firestore().doc("cities/atlantis").unwrap().get().await.unwrap();
    assert!(!snapshot.exists());
    assert!(snapshot.data().is_none());
    assert_eq!(snapshot.id(), "atlantis");
}

#[tokio::test]
async fn missing_collection_reads_as_empty() {
    let snapshot = firestore().collection("nothing_here").unwrap().get().await.unwrap();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.len(), 0);
}

#[tokio::test]
async fn typed_documents_roundtrip() {
    let firestore = firestore();
    let city = City {
        name: "Tokyo".into(),
        population: 37_400_068,
        capital: true,
    };
    let doc = firestore.doc("cities/tokyo").unwrap();
    doc.set(MapValue::from_serializable(&city).unwrap(), None)
        .await
        .unwrap();

    let snapshot = doc.get().await.unwrap();
    assert!(snapshot.exists());
    assert_eq!(snapshot.data_as::<City>().unwrap(), Some(city));
    assert_eq!(snapshot.id_source(), DocumentIdSource::Name);
    assert!(snapshot.update_time().is_some());
}

#[tokio::test]
async fn merge_fields_only_touches_listed_keys() {
    let doc = firestore().doc("settings/app").unwrap();
    doc.set(map(&[("a", 1.into()), ("b", 2.into()), ("c", 3.into())]), None)
        .await
        .unwrap();
    doc.set(
        map(&[("a", 9.into()), ("b", 9.into()), ("c", 9.into())]),
        Some(SetOptions::merge_fields(["a"]).unwrap()),
    )
    .await
    .unwrap();

    let data = doc.get().await.unwrap().data().cloned().unwrap();
    assert_eq!(data, map(&[("a", 9.into()), ("b", 2.into()), ("c", 3.into())]));
}

#[tokio::test]
async fn merge_write_combines_top_level_fields() {
    let doc = firestore().doc("settings/app").unwrap();
    doc.set(map(&[("a", 1.into()), ("b", 2.into())]), None).await.unwrap();
    doc.set(map(&[("b", 3.into()), ("c", 4.into())]), Some(SetOptions::merge_all()))
        .await
        .unwrap();

    let data = doc.get().await.unwrap().data().cloned().unwrap();
    assert_eq!(data, map(&[("a", 1.into()), ("b", 3.into()), ("c", 4.into())]));
}

#[tokio::test]
async fn update_requires_an_existing_document() {
    let firestore = firestore();
    let doc = firestore.doc("users/ghost").unwrap();
    let err = doc
        .update([("profile.lastLogin", FirestoreValue::from(Timestamp::new(1_700_000_000, 0)))])
        .await
        .unwrap_err();
    assert_eq!(err.code, FirestoreErrorCode::NotFound);

    let doc = firestore.doc("users/alice").unwrap();
    doc.set(map(&[("name", "Alice".into())]), None).await.unwrap();
    doc.update([("profile.lastLogin", FirestoreValue::from(Timestamp::new(1_700_000_000, 0)))])
        .await
        .unwrap();
    let snapshot = doc.get().await.unwrap();
    assert_eq!(
        snapshot.get("profile.lastLogin").unwrap(),
        Some(&FirestoreValue::from(Timestamp::new(1_700_000_000, 0)))
    );
    assert_eq!(snapshot.get("name").unwrap(), Some(&FirestoreValue::from("Alice")));

    let empty: BTreeMap<String, FirestoreValue> = BTreeMap::new();
    assert_eq!(
        doc.update(empty).await.unwrap_err().code,
        FirestoreErrorCode::InvalidArgument
    );
}

#[tokio::test]
async fn subcollections_are_independent() {
    let firestore = firestore();
    let alice = firestore.doc("users/alice").unwrap();
    let posts = alice.collection("posts").unwrap();
    posts.add(map(&[("title", "hello".into())])).await.unwrap();
    posts.add(map(&[("title", "again".into())])).await.unwrap();

    assert_eq!(posts.get().await.unwrap().len(), 2);
    assert!(firestore.collection("users").unwrap().get().await.unwrap().is_empty());
    assert_eq!(posts.parent(), Some(alice));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let doc = firestore().doc("users/alice").unwrap();
    doc.set(map(&[("name", "Alice".into())]), None).await.unwrap();
    doc.delete().await.unwrap();
    doc.delete().await.unwrap();
    assert!(!doc.get().await.unwrap().exists());
}
