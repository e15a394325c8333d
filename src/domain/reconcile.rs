//! Keyed list reconciliation after create/update/delete.
//!
//! Lists in page state are merged by record id, never by position.

use super::entities::{Balance, Expense, Group, Member};

/// Records addressable by backend id.
pub trait Keyed {
    fn key(&self) -> i64;
}

impl Keyed for Group {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Member {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Expense {
    fn key(&self) -> i64 {
        self.id
    }
}

impl Keyed for Balance {
    fn key(&self) -> i64 {
        self.user.id
    }
}

/// Replace the record with the same id, else prepend it.
///
/// Duplicates of the id already in the list collapse into the new record.
pub fn upsert_by_id<T: Keyed>(list: &mut Vec<T>, item: T) {
    let key = item.key();
    match list.iter_mut().find(|x| x.key() == key) {
        Some(slot) => *slot = item,
        None => {
            list.insert(0, item);
            return;
        }
    }
    let mut first = true;
    list.retain(|x| {
        if x.key() != key {
            return true;
        }
        std::mem::replace(&mut first, false)
    });
}

/// Drop every record with the given id. Returns true if anything was removed.
pub fn remove_by_id<T: Keyed>(list: &mut Vec<T>, key: i64) -> bool {
    let before = list.len();
    list.retain(|x| x.key() != key);
    list.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: i64, name: &str) -> Group {
        Group {
            id,
            name: name.to_string(),
            created_at: None,
            created_by: None,
        }
    }

    fn names(list: &[Group]) -> Vec<&str> {
        list.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_upsert_prepends_new_record() {
        let mut list = vec![group(1, "Trip"), group(2, "Flat")];
        upsert_by_id(&mut list, group(3, "Office"));
        assert_eq!(names(&list), ["Office", "Trip", "Flat"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut list = vec![group(1, "Trip"), group(2, "Flat"), group(3, "Office")];
        upsert_by_id(&mut list, group(2, "Flat 2B"));
        assert_eq!(names(&list), ["Trip", "Flat 2B", "Office"]);
    }

    #[test]
    fn test_upsert_collapses_duplicates() {
        let mut list = vec![group(1, "Trip"), group(2, "stale"), group(2, "stale too")];
        upsert_by_id(&mut list, group(2, "fresh"));
        assert_eq!(names(&list), ["Trip", "fresh"]);
    }

    #[test]
    fn test_upsert_keeps_position_of_first_duplicate() {
        let mut list = vec![group(5, "old"), group(1, "Trip"), group(5, "older")];
        upsert_by_id(&mut list, group(5, "new"));
        assert_eq!(names(&list), ["new", "Trip"]);
    }

    #[test]
    fn test_remove_by_id() {
        let mut list = vec![group(1, "Trip"), group(2, "Flat")];
        assert!(remove_by_id(&mut list, 1));
        assert!(!remove_by_id(&mut list, 1));
        assert_eq!(names(&list), ["Flat"]);
    }
}
