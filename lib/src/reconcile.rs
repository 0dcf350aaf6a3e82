//! Pure merge of a local bookmark collection with a fetch result or one change event.
//!
//! A collection produced here holds at most one record per id, only records owned by
//! the scope user, and is sorted by `created_at` newest first. Nothing in this module
//! touches the network or storage.

use crate::models::{Bookmark, ChangeEvent};
use log::debug;
use std::collections::HashSet;

/// Build a collection from a bulk fetch result.
///
/// Foreign rows are dropped and repeated ids keep their first occurrence. The sort is
/// stable, so rows sharing a timestamp keep the order the store returned them in.
pub fn from_snapshot(rows: Vec<Bookmark>, scope: &str) -> Vec<Bookmark> {
    let mut seen = HashSet::new();
    let mut collection: Vec<Bookmark> = rows
        .into_iter()
        .filter(|b| b.user_id == scope)
        .filter(|b| seen.insert(b.id.clone()))
        .collect();
    collection.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    collection
}

/// Apply one change event, returning the new collection.
pub fn apply(mut collection: Vec<Bookmark>, scope: &str, event: &ChangeEvent) -> Vec<Bookmark> {
    match event {
        ChangeEvent::Insert(record) => {
            if record.user_id != scope {
                debug!("Dropping insert of {} owned by another user", record.id);
                return collection;
            }
            match position(&collection, &record.id) {
                // Redelivery of an insert we already hold
                Some(pos) => replace_at(&mut collection, pos, record.clone()),
                None => insert_sorted(&mut collection, record.clone()),
            }
        }
        ChangeEvent::Update(record) => match position(&collection, &record.id) {
            Some(pos) if record.user_id == scope => replace_at(&mut collection, pos, record.clone()),
            Some(pos) => {
                debug!("Bookmark {} changed owner, removing", record.id);
                collection.remove(pos);
            }
            None => debug!("Ignoring update for unknown bookmark {}", record.id),
        },
        ChangeEvent::Delete { id } => match position(&collection, id) {
            Some(pos) => {
                collection.remove(pos);
            }
            None => debug!("Ignoring delete for unknown bookmark {}", id),
        },
    }
    collection
}

/// True when no record is newer than the one before it
pub fn is_sorted_newest_first(collection: &[Bookmark]) -> bool {
    collection
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at)
}

fn position(collection: &[Bookmark], id: &str) -> Option<usize> {
    collection.iter().position(|b| b.id == id)
}

/// Insert ahead of every record that is not strictly newer.
/// A freshly created bookmark therefore lands at the head.
fn insert_sorted(collection: &mut Vec<Bookmark>, record: Bookmark) {
    let idx = collection.partition_point(|b| b.created_at > record.created_at);
    collection.insert(idx, record);
}

fn replace_at(collection: &mut Vec<Bookmark>, pos: usize, record: Bookmark) {
    if collection[pos].created_at == record.created_at {
        collection[pos] = record;
    } else {
        collection.remove(pos);
        insert_sorted(collection, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use rstest::rstest;

    fn bm(id: &str, day: u32) -> Bookmark {
        Bookmark::new(
            id,
            "u1",
            format!("https://example.com/{}", id),
            id.to_uppercase(),
            Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        )
    }

    fn ids(collection: &[Bookmark]) -> Vec<&str> {
        collection.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_insert_into_empty() {
        let out = apply(vec![], "u1", &ChangeEvent::Insert(bm("b1", 1)));
        assert_eq!(ids(&out), vec!["b1"]);
    }

    #[test]
    fn test_newest_insert_goes_to_head() {
        let collection = vec![bm("b2", 2), bm("b1", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Insert(bm("b3", 3)));
        assert_eq!(ids(&out), vec!["b3", "b2", "b1"]);
    }

    #[test]
    fn test_older_insert_keeps_order() {
        let collection = vec![bm("b3", 3), bm("b1", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Insert(bm("b2", 2)));
        assert_eq!(ids(&out), vec!["b3", "b2", "b1"]);
    }

    #[test]
    fn test_insert_with_equal_timestamp_goes_first() {
        let collection = vec![bm("a", 2), bm("b", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Insert(bm("c", 2)));
        assert_eq!(ids(&out), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_redelivered_insert_replaces() {
        let mut renamed = bm("b1", 1);
        renamed.title = "Renamed".to_string();

        let collection = vec![bm("b2", 2), bm("b1", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Insert(renamed));
        assert_eq!(ids(&out), vec!["b2", "b1"]);
        assert_eq!(out[1].title, "Renamed");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut changed = bm("b2", 2);
        changed.url = "https://changed.example".to_string();

        let collection = vec![bm("b3", 3), bm("b2", 2), bm("b1", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Update(changed));
        assert_eq!(ids(&out), vec!["b3", "b2", "b1"]);
        assert_eq!(out[1].url, "https://changed.example");
    }

    #[test]
    fn test_update_with_new_timestamp_repositions() {
        let collection = vec![bm("b3", 3), bm("b2", 2), bm("b1", 1)];
        let out = apply(collection, "u1", &ChangeEvent::Update(bm("b1", 4)));
        assert_eq!(ids(&out), vec!["b1", "b3", "b2"]);
    }

    #[test]
    fn test_update_unknown_is_ignored() {
        let collection = vec![bm("b1", 1)];
        let out = apply(collection.clone(), "u1", &ChangeEvent::Update(bm("zz", 5)));
        assert_eq!(out, collection);
    }

    #[test]
    fn test_update_moving_to_other_owner_removes() {
        let mut moved = bm("b1", 1);
        moved.user_id = "u2".to_string();
        let out = apply(vec![bm("b2", 2), bm("b1", 1)], "u1", &ChangeEvent::Update(moved));
        assert_eq!(ids(&out), vec!["b2"]);
    }

    #[test]
    fn test_delete_removes() {
        let collection = vec![bm("b2", 2), bm("b1", 1)];
        let event = ChangeEvent::Delete { id: "b2".to_string() };
        assert_eq!(ids(&apply(collection, "u1", &event)), vec!["b1"]);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![bm("b1", 1)])]
    #[case(vec![bm("b2", 2), bm("b1", 1)])]
    fn test_delete_unknown_is_ignored(#[case] collection: Vec<Bookmark>) {
        let event = ChangeEvent::Delete { id: "missing".to_string() };
        assert_eq!(apply(collection.clone(), "u1", &event), collection);
    }

    #[test]
    fn test_foreign_insert_is_dropped() {
        let mut foreign = bm("x", 9);
        foreign.user_id = "u2".to_string();
        let out = apply(vec![bm("b1", 1)], "u1", &ChangeEvent::Insert(foreign));
        assert_eq!(ids(&out), vec!["b1"]);
    }

    #[test]
    fn test_snapshot_sorts_filters_and_dedups() {
        let mut foreign = bm("x", 5);
        foreign.user_id = "u2".to_string();
        let mut dup = bm("b1", 1);
        dup.title = "second copy".to_string();

        let out = from_snapshot(vec![bm("b1", 1), foreign, bm("b3", 3), dup, bm("b2", 2)], "u1");
        assert_eq!(ids(&out), vec!["b3", "b2", "b1"]);
        assert_eq!(out[2].title, "B1");
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let rows = vec![bm("b2", 2), bm("b1", 1), bm("b3", 3)];
        assert_eq!(from_snapshot(rows.clone(), "u1"), from_snapshot(rows, "u1"));
    }

    fn event_strategy() -> impl Strategy<Value = ChangeEvent> {
        let record = (0u8..6, 1u32..28).prop_map(|(id, day)| bm(&format!("b{}", id), day));
        prop_oneof![
            record.clone().prop_map(ChangeEvent::Insert),
            record.prop_map(ChangeEvent::Update),
            (0u8..6).prop_map(|id| ChangeEvent::Delete { id: format!("b{}", id) }),
        ]
    }

    proptest! {
        #[test]
        fn prop_inserts_keep_newest_first(days in proptest::collection::vec(1u32..28, 0..40)) {
            let mut collection = Vec::new();
            for (i, day) in days.iter().enumerate() {
                let event = ChangeEvent::Insert(bm(&format!("n{}", i), *day));
                collection = apply(collection, "u1", &event);
            }
            prop_assert_eq!(collection.len(), days.len());
            prop_assert!(is_sorted_newest_first(&collection));
        }

        #[test]
        fn prop_ids_stay_unique(events in proptest::collection::vec(event_strategy(), 0..60)) {
            let mut collection = Vec::new();
            for event in &events {
                // Every event is delivered twice
                collection = apply(collection, "u1", event);
                collection = apply(collection, "u1", event);
            }
            let unique: HashSet<&str> = collection.iter().map(|b| b.id.as_str()).collect();
            prop_assert_eq!(unique.len(), collection.len());
            prop_assert!(is_sorted_newest_first(&collection));
        }
    }
}
