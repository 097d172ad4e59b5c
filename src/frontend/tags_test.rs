use super::tags::TagIndex;

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

#[test]
fn bind_creates_tag_and_appends_keys_in_order() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1"]));
    index.bind("k2", &tags(&["t1"]));

    assert!(index.exists("t1"));
    assert_eq!(index.resolve(&tags(&["t1"])), vec!["k1", "k2"]);
}

#[test]
fn rebinding_same_key_does_not_duplicate() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1"]));
    index.bind("k1", &tags(&["t1"]));

    assert_eq!(index.resolve(&tags(&["t1"])), vec!["k1"]);
}

#[test]
fn one_key_under_many_tags() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1", "t2"]));

    assert!(index.exists("t1"));
    assert!(index.exists("t2"));
    assert_eq!(index.resolve(&tags(&["t2"])), vec!["k1"]);
}

#[test]
fn resolve_unions_and_deduplicates_across_tags() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1", "t2"]));
    index.bind("k2", &tags(&["t2"]));

    assert_eq!(index.resolve(&tags(&["t1", "t2"])), vec!["k1", "k2"]);
}

#[test]
fn missing_tag_resolves_to_empty_never_errors() {
    let index = TagIndex::new();
    assert!(index.resolve(&tags(&["ghost"])).is_empty());
    assert!(!index.exists("ghost"));
}

#[test]
fn clear_is_a_full_reset() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1"]));
    index.clear();

    assert!(index.is_empty());
    assert!(!index.exists("t1"));
}

#[test]
fn tags_snapshot_lists_all_known_tags() {
    let index = TagIndex::new();
    index.bind("k1", &tags(&["t1", "t2"]));

    let mut known = index.tags();
    known.sort();
    assert_eq!(known, vec!["t1", "t2"]);
}
