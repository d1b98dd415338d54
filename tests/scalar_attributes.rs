mod common;

use common::*;
use preload_store::prelude::*;
use proptest::prelude::*;

#[test_log::test]
fn test_counters_default_missing_to_zero() {
    let store = CountingStore::new();
    set(&*store, "widget:1:view_count", "10");
    set(&*store, "widget:3:view_count", "20");
    let widgets = Widget::many(&store.shared(), 1..=3);

    Preloader::new(store.shared())
        .preload(&widgets, &["view_count"])
        .unwrap();

    let counts: Vec<i64> = widgets.iter().map(|w| w.view_count.value().unwrap()).collect();
    assert_eq!(counts, [10, 0, 20]);
    assert!(widgets[1].view_count.is_nil().unwrap());
    assert!(!widgets[0].view_count.is_nil().unwrap());
    assert_eq!(store.multi_gets(), 1);
}

#[test_log::test]
fn test_values_are_served_verbatim() {
    let store = CountingStore::new();
    set(&*store, "widget:1:last_seen", "10");
    set(&*store, "widget:3:last_seen", "20");
    let widgets = Widget::many(&store.shared(), 1..=3);

    Preloader::new(store.shared())
        .preload(&widgets, &["last_seen"])
        .unwrap();

    let values: Vec<Option<String>> = widgets.iter().map(|w| w.last_seen.value().unwrap()).collect();
    assert_eq!(values, [Some("10".to_string()), None, Some("20".to_string())]);
    assert!(widgets[1].last_seen.is_nil().unwrap());
}

#[test_log::test]
fn test_unparsable_counter_reads_as_zero() {
    let store = CountingStore::new();
    set(&*store, "widget:1:view_count", "not a number");
    let widgets = Widget::many(&store.shared(), 1..=1);

    Preloader::new(store.shared())
        .preload(&widgets, &["view_count"])
        .unwrap();

    assert_eq!(widgets[0].view_count.value().unwrap(), 0);
    assert_eq!(widgets[0].view_count.raw().unwrap().as_deref(), Some("not a number"));
    assert!(!widgets[0].view_count.is_nil().unwrap());
}

#[test_log::test]
fn test_direct_and_batched_reads_agree() {
    let store = CountingStore::new();
    set(&*store, "widget:1:view_count", " 7 ");
    set(&*store, "widget:1:last_seen", "yesterday");

    let direct = Widget::new(&store.shared(), 1);
    let batched = Widget::many(&store.shared(), 1..=1);
    Preloader::new(store.shared())
        .preload(&batched, &["view_count", "last_seen"])
        .unwrap();

    assert_eq!(direct.view_count.value().unwrap(), batched[0].view_count.value().unwrap());
    assert_eq!(direct.last_seen.value().unwrap(), batched[0].last_seen.value().unwrap());
    assert_eq!(direct.view_count.value().unwrap(), 7);
}

#[test_log::test]
fn test_counter_writes_go_straight_to_the_store() {
    let store = CountingStore::new();
    let widget = Widget::new(&store.shared(), 1);

    assert_eq!(widget.view_count.increment(3).unwrap(), 3);
    assert_eq!(widget.view_count.decrement(1).unwrap(), 2);
    assert_eq!(widget.view_count.value().unwrap(), 2);

    widget.view_count.set(40).unwrap();
    assert_eq!(widget.view_count.value().unwrap(), 40);

    widget.last_seen.set("today").unwrap();
    assert_eq!(widget.last_seen.value().unwrap().as_deref(), Some("today"));

    assert!(widget.last_seen.delete().unwrap());
    assert!(!widget.last_seen.delete().unwrap());
    assert!(widget.last_seen.is_nil().unwrap());
}

proptest! {
    #[test]
    fn prop_each_entity_gets_its_own_counter(values in prop::collection::vec(prop::option::of(-1000i64..1000), 1..12)) {
        let store = CountingStore::new();
        let ids: Vec<u64> = (1..=values.len() as u64).collect();
        for (id, value) in ids.iter().zip(&values) {
            if let Some(value) = value {
                set(&*store, &format!("widget:{id}:view_count"), &value.to_string());
                set(&*store, &format!("widget:{id}:last_seen"), &format!("seen-{value}"));
            }
        }
        let widgets = Widget::many(&store.shared(), ids);

        Preloader::new(store.shared())
            .preload(&widgets, &["view_count", "last_seen"])
            .unwrap();

        for (widget, value) in widgets.iter().zip(&values) {
            prop_assert_eq!(widget.view_count.value().unwrap(), value.unwrap_or(0));
            prop_assert_eq!(widget.last_seen.value().unwrap(), value.map(|v| format!("seen-{v}")));
        }
        prop_assert_eq!(store.multi_gets(), 1);
        prop_assert_eq!(store.round_trips(), 1);
    }
}
