//! # Order Merge
//!
//! Merges the user-defined display order of entries from two devices.
//!
//! ## Rules
//! - Same id, different order: the copy with the strictly newer
//!   `modify_time` wins. Local items are visited first, so ties keep local.
//! - Same id, same order: the first copy seen is kept.
//! - The result is sorted by `order`, then `modify_time`, then first
//!   appearance, and renumbered `0..n`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entry::Entry;

/// An entry with its position in the user's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryWithOrder {
    pub entry: Entry,
    pub modify_time: i64,
    pub order: i32,
}

/// Merges local and remote orderings into one continuous list.
pub fn reorder_items(local: &[EntryWithOrder], remote: &[EntryWithOrder]) -> Vec<EntryWithOrder> {
    let mut merged: Vec<EntryWithOrder> = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in local.iter().chain(remote) {
        match index.get(item.entry.id.as_str()) {
            Some(&slot) => {
                let existing = &merged[slot];
                if item.order != existing.order && item.modify_time > existing.modify_time {
                    merged[slot] = item.clone();
                }
            }
            None => {
                index.insert(item.entry.id.as_str(), merged.len());
                merged.push(item.clone());
            }
        }
    }

    // Stable sort keeps first appearance as the last tie-break
    merged.sort_by(|a, b| a.order.cmp(&b.order).then(a.modify_time.cmp(&b.modify_time)));

    for (position, item) in merged.iter_mut().enumerate() {
        item.order = position as i32;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::entry_with_id;

    fn item(id: &str, order: i32, modify_time: i64) -> EntryWithOrder {
        EntryWithOrder {
            entry: entry_with_id(id),
            modify_time,
            order,
        }
    }

    fn assert_continuous(items: &[EntryWithOrder]) {
        for (expected, item) in items.iter().enumerate() {
            assert_eq!(item.order, expected as i32, "entry {}", item.entry.id);
        }
    }

    fn ids(items: &[EntryWithOrder]) -> Vec<&str> {
        items.iter().map(|i| i.entry.id.as_str()).collect()
    }

    #[test]
    fn newer_remote_order_wins() {
        let result = reorder_items(&[item("a", 0, 100)], &[item("a", 1, 200)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].modify_time, 200);
        assert_continuous(&result);
    }

    #[test]
    fn older_remote_order_is_ignored() {
        let result = reorder_items(&[item("b", 1, 300)], &[item("b", 0, 50)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].modify_time, 300);
    }

    #[test]
    fn equal_time_keeps_local() {
        let result = reorder_items(&[item("b", 1, 300)], &[item("b", 0, 300)]);
        assert_eq!(result[0].modify_time, 300);
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn same_order_keeps_first_seen() {
        let result = reorder_items(&[item("h", 3, 100)], &[item("h", 3, 999)]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].modify_time, 100);
    }

    #[test]
    fn sorts_by_order_then_modify_time() {
        let result = reorder_items(&[item("c", 5, 70)], &[item("d", 2, 60)]);
        assert_eq!(ids(&result), vec!["d", "c"]);

        let tied = reorder_items(&[item("e", 0, 50), item("g", 0, 75), item("f", 0, 90)], &[]);
        assert_eq!(ids(&tied), vec!["e", "g", "f"]);
        assert_continuous(&tied);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let result = reorder_items(&[item("x", 0, 10), item("y", 0, 10)], &[item("z", 0, 10)]);
        assert_eq!(ids(&result), vec!["x", "y", "z"]);
    }

    #[test]
    fn remote_only_items_are_renumbered() {
        let result = reorder_items(&[], &[item("x", 5, 123)]);
        assert_eq!(ids(&result), vec!["x"]);
        assert_continuous(&result);
    }

    #[test]
    fn empty_inputs() {
        assert!(reorder_items(&[], &[]).is_empty());
    }
}
