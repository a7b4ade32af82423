use firestore_lite::firestore::model::{IdentifierRules, PathPolicy, PathResolver};

fn resolver(policy: PathPolicy, rules: IdentifierRules) -> PathResolver {
    PathResolver::new("demo", policy, rules)
}

#[test]
fn relative_document_paths_get_the_default_project() {
    let resolver = resolver(PathPolicy::Inferred, IdentifierRules::Permissive);
    let path = resolver.resolve_document("users/alice", None).unwrap();
    assert_eq!(path.canonical_string(), "demo/users/alice");

    let nested = resolver.resolve_collection("users/alice/posts", None).unwrap();
    assert_eq!(nested.canonical_string(), "demo/users/alice/posts");
}

#[test]
fn segment_count_leaves_qualified_paths_alone() {
    let resolver = resolver(PathPolicy::SegmentCount, IdentifierRules::Permissive);
    assert_eq!(
        resolver.resolve_document("demo/users/alice", None).unwrap().canonical_string(),
        "demo/users/alice"
    );
    assert_eq!(
        resolver.resolve_collection("users", None).unwrap().canonical_string(),
        "demo/users"
    );
}

#[test]
fn shape_is_checked_for_each_target() {
    let resolver = resolver(PathPolicy::Inferred, IdentifierRules::Permissive);
    assert!(resolver.resolve_document("users", None).is_err());
    assert!(resolver.resolve_document("users/alice/posts", None).is_err());
    assert!(resolver.resolve_collection("users/alice", None).is_err());
}

#[test]
fn strict_rules_reject_uppercase_collections() {
    let permissive = resolver(PathPolicy::Inferred, IdentifierRules::Permissive);
    let strict = resolver(PathPolicy::Inferred, IdentifierRules::Strict);
    assert!(permissive.resolve_collection("UserProfiles", None).is_ok());
    assert!(strict.resolve_collection("UserProfiles", None).is_err());
    assert!(strict.resolve_collection("user_profiles", None).is_ok());
}

#[test]
fn identifiers_are_length_limited() {
    let resolver = resolver(PathPolicy::Inferred, IdentifierRules::Permissive);
    let long_id = "a".repeat(256);
    assert!(resolver.resolve_document(&format!("users/{long_id}"), None).is_err());
    assert!(resolver.resolve_document(&format!("users/{}", "a".repeat(255)), None).is_ok());
    assert!(resolver.resolve_document("users/al ice", None).is_err());
}
