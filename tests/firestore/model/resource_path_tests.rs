use firestore_lite::firestore::model::ResourcePath;

fn resource_path(path: &str) -> ResourcePath {
    ResourcePath::parse(path).unwrap()
}

#[test]
fn parses_slash_separated_paths() {
    let path = resource_path("rooms/Eros/messages");
    assert_eq!(path.len(), 3);
    assert_eq!(path.get(0), Some("rooms"));
    assert_eq!(path.get(2), Some("messages"));
    assert_eq!(path.get(3), None);
    assert_eq!(path.to_string(), "rooms/Eros/messages");
}

#[test]
fn rejects_malformed_paths() {
    for raw in ["", "   ", "/rooms", "rooms/", "rooms//messages"] {
        let err = ResourcePath::parse(raw).unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument", "path {raw:?}");
    }
}

#[test]
fn pop_first_repeatedly() {
    let path = resource_path("rooms/Eros/messages");
    assert_eq!(path.pop_first(), resource_path("Eros/messages"));
    assert_eq!(path.pop_first().pop_first(), resource_path("messages"));
    assert!(path.pop_first().pop_first().pop_first().is_empty());
    assert!(ResourcePath::root().pop_first().is_empty());
}

#[test]
fn yields_last_segment() {
    let path = resource_path("rooms/Eros/messages");
    assert_eq!(path.last_segment(), Some("messages"));
    assert_eq!(path.without_last().last_segment(), Some("Eros"));
    assert_eq!(path.without_last().without_last().last_segment(), Some("rooms"));
    assert_eq!(ResourcePath::root().pop_last(), None);
}

#[test]
fn child_and_prepend_leave_the_source_untouched() {
    let base = resource_path("rooms");
    assert_eq!(base.child(["eros"]), resource_path("rooms/eros"));
    assert_eq!(base.child(["eros"]).child(["1"]), resource_path("rooms/eros/1"));
    assert_eq!(base.prepend("demo"), resource_path("demo/rooms"));
    assert_eq!(base, resource_path("rooms"));
}

#[test]
fn determines_prefix() {
    let empty = ResourcePath::root();
    let a = resource_path("a");
    let ab = resource_path("a/b");
    let abc = resource_path("a/b/c");
    let ba = resource_path("b/a");

    assert!(empty.is_prefix_of(&a));
    assert!(empty.is_prefix_of(&empty));
    assert!(a.is_prefix_of(&abc));
    assert!(ab.is_prefix_of(&ab));
    assert!(ab.is_prefix_of(&abc));
    assert!(!abc.is_prefix_of(&ab));
    assert!(!a.is_prefix_of(&ba));
    assert!(!a.is_prefix_of(&empty));
}
