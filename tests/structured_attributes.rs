mod common;

use common::*;
use preload_store::prelude::*;
use std::collections::BTreeMap;

fn seeded() -> (Arc<CountingStore>, Vec<Widget>) {
    let store = CountingStore::new();
    push(&*store, "widget:1:recent_ids", &["a", "b", "c", "d"]);
    add(&*store, "widget:1:tag_ids", &["5", "3"]);
    zadd(&*store, "widget:1:ranking", "carol", 3.0);
    zadd(&*store, "widget:1:ranking", "alice", 1.0);
    zadd(&*store, "widget:1:ranking", "bob", 2.5);
    hset(&*store, "widget:1:metadata", "color", "red");
    hset(&*store, "widget:1:metadata", "size", "large");
    hset(&*store, "widget:1:metadata", "7", "lucky");
    let widgets = Widget::many(&store.shared(), 1..=2);

    Preloader::new(store.shared())
        .preload(&widgets, &["recent_ids", "tag_ids", "ranking", "metadata"])
        .unwrap();
    (store, widgets)
}

#[test_log::test]
fn test_list_accessors() {
    let (store, widgets) = seeded();
    let list = &widgets[0].recent_ids;

    assert_eq!(list.values().unwrap(), ["a", "b", "c", "d"]);
    assert_eq!(list.get(0).unwrap().as_deref(), Some("a"));
    assert_eq!(list.get(-1).unwrap().as_deref(), Some("d"));
    assert_eq!(list.get(9).unwrap(), None);
    assert_eq!(list.slice(1, 2).unwrap(), ["b", "c"]);
    assert_eq!(list.slice(-2, 10).unwrap(), ["c", "d"]);
    assert_eq!(list.len().unwrap(), 4);
    assert_eq!(store.pipelines(), 1);
}

#[test_log::test]
fn test_set_accessors() {
    let (_store, widgets) = seeded();
    let tags = &widgets[0].tag_ids;

    // Members are compared as strings.
    assert!(tags.contains(5).unwrap());
    assert!(tags.contains("3").unwrap());
    assert!(!tags.contains(4).unwrap());
    assert_eq!(tags.len().unwrap(), 2);
    let mut members = tags.members().unwrap();
    members.sort();
    assert_eq!(members, ["3", "5"]);
}

#[test_log::test]
fn test_sorted_set_accessors() {
    let (_store, widgets) = seeded();
    let ranking = &widgets[0].ranking;

    assert_eq!(ranking.members().unwrap(), ["alice", "bob", "carol"]);
    assert_eq!(
        ranking.members_with_scores().unwrap(),
        [
            ("alice".to_string(), 1.0),
            ("bob".to_string(), 2.5),
            ("carol".to_string(), 3.0),
        ]
    );
    assert_eq!(ranking.score("bob").unwrap(), Some(2.5));
    assert_eq!(ranking.rank("carol").unwrap(), Some(2));
    assert_eq!(ranking.rank("dave").unwrap(), None);
    assert_eq!(ranking.len().unwrap(), 3);
}

#[test_log::test]
fn test_map_accessors() {
    let (_store, widgets) = seeded();
    let metadata = &widgets[0].metadata;

    assert_eq!(metadata.get("color").unwrap().as_deref(), Some("red"));
    // Field names are coerced to strings.
    assert_eq!(metadata.get(7).unwrap().as_deref(), Some("lucky"));
    assert_eq!(metadata.get("weight").unwrap(), None);
    assert_eq!(metadata.keys().unwrap(), ["7", "color", "size"]);
    assert_eq!(metadata.values().unwrap(), ["lucky", "red", "large"]);
    assert_eq!(metadata.len().unwrap(), 3);
}

#[test_log::test]
fn test_missing_keys_resolve_to_empty_forms() {
    let (store, widgets) = seeded();
    let blank = &widgets[1];

    assert!(blank.recent_ids.values().unwrap().is_empty());
    assert_eq!(blank.recent_ids.get(0).unwrap(), None);
    assert!(blank.tag_ids.is_empty().unwrap());
    assert!(!blank.tag_ids.contains("x").unwrap());
    assert!(blank.ranking.members().unwrap().is_empty());
    assert_eq!(blank.ranking.score("anyone").unwrap(), None);
    assert_eq!(blank.metadata.all().unwrap(), BTreeMap::new());
    assert!(blank.metadata.keys().unwrap().is_empty());

    assert_eq!(store.pipelines(), 1);
    assert_eq!(store.direct_reads(), 0);
}

#[test_log::test]
fn test_pipeline_replies_are_matched_in_order() {
    let store = CountingStore::new();
    for id in 1..=4u64 {
        push(&*store, &format!("widget:{id}:recent_ids"), &[format!("item-{id}").as_str()]);
        hset(&*store, &format!("widget:{id}:metadata"), "owner", &format!("user-{id}"));
    }
    let widgets = Widget::many(&store.shared(), [4, 2, 3, 1]);

    Preloader::new(store.shared())
        .preload(&widgets, &["metadata", "recent_ids"])
        .unwrap();

    for widget in &widgets {
        assert_eq!(widget.recent_ids.values().unwrap(), [format!("item-{}", widget.id)]);
        assert_eq!(widget.metadata.get("owner").unwrap(), Some(format!("user-{}", widget.id)));
    }
    assert_eq!(store.pipelines(), 1);
}

#[test_log::test]
fn test_structured_writes() {
    let store = CountingStore::new();
    let widget = Widget::new(&store.shared(), 1);

    assert_eq!(widget.recent_ids.push("x").unwrap(), 1);
    assert_eq!(widget.recent_ids.push_all(["y", "z"]).unwrap(), 3);
    assert!(widget.tag_ids.add(1).unwrap());
    assert!(!widget.tag_ids.add("1").unwrap());
    assert!(widget.ranking.add("alice", 2.0).unwrap());
    assert!(!widget.ranking.add("alice", 0.5).unwrap());
    assert!(widget.metadata.insert("k", "v").unwrap());
    assert!(!widget.metadata.insert("k", "w").unwrap());

    assert_eq!(widget.recent_ids.values().unwrap(), ["x", "y", "z"]);
    assert_eq!(widget.ranking.score("alice").unwrap(), Some(0.5));
    assert_eq!(widget.metadata.get("k").unwrap().as_deref(), Some("w"));
}
