//! Fixed-capacity deque used for the metrics history and the event log.
//!
//! Pushing at one end evicts from the other once the capacity is reached,
//! so the deque never grows past `capacity`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// A bounded double-ended queue.
///
/// `push_back` keeps chronological order (oldest evicted from the front);
/// `push_front` keeps newest-first order (oldest evicted from the back).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoundedDeque<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct BoundedDeque<T> {
    capacity: usize,
    items: VecDeque<T>,
}

#[derive(Deserialize)]
struct RawBoundedDeque<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> TryFrom<RawBoundedDeque<T>> for BoundedDeque<T> {
    type Error = String;

    fn try_from(raw: RawBoundedDeque<T>) -> Result<Self, Self::Error> {
        if raw.capacity == 0 {
            return Err("capacity must be at least 1".to_string());
        }
        if raw.items.len() > raw.capacity {
            return Err(format!(
                "{} items exceed capacity {}",
                raw.items.len(),
                raw.capacity
            ));
        }
        Ok(Self {
            capacity: raw.capacity,
            items: raw.items,
        })
    }
}

impl<T> BoundedDeque<T> {
    /// Create an empty deque holding at most `capacity` items.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append at the back, evicting the front item when full.
    ///
    /// Returns the evicted item, if any.
    pub fn push_back(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Prepend at the front, evicting the back item when full.
    ///
    /// Returns the evicted item, if any.
    pub fn push_front(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_back()
        } else {
            None
        };
        self.items.push_front(item);
        evicted
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a BoundedDeque<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_back_evicts_oldest_from_front() {
        let mut d = BoundedDeque::new(3);
        for i in 0..5 {
            d.push_back(i);
        }
        assert_eq!(d.len(), 3);
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn push_front_keeps_newest_first() {
        let mut d = BoundedDeque::new(3);
        for i in 0..5 {
            d.push_front(i);
        }
        assert_eq!(d.iter().copied().collect::<Vec<_>>(), vec![4, 3, 2]);
    }

    #[test]
    fn eviction_returns_dropped_item() {
        let mut d = BoundedDeque::new(1);
        assert_eq!(d.push_back("a"), None);
        assert_eq!(d.push_back("b"), Some("a"));
        assert_eq!(d.push_front("c"), Some("b"));
    }

    #[test]
    fn zero_capacity_is_bumped() {
        let d: BoundedDeque<u8> = BoundedDeque::new(0);
        assert_eq!(d.capacity(), 1);
    }

    #[test]
    fn deserialize_rejects_overfull() {
        let json = r#"{"capacity":1,"items":[1,2]}"#;
        assert!(serde_json::from_str::<BoundedDeque<u8>>(json).is_err());

        let json = r#"{"capacity":2,"items":[1,2]}"#;
        let d: BoundedDeque<u8> = serde_json::from_str(json).unwrap();
        assert_eq!(d.len(), 2);
    }
}
