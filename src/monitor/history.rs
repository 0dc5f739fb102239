//! Fixed-capacity probe history.

use std::collections::VecDeque;

/// A FIFO queue that never holds more than `capacity` items.
///
/// Pushing onto a full queue evicts the oldest item first. A queue with zero
/// capacity stays empty forever; this is what a window shorter than one check
/// interval looks like.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Capacity for a window of `window_secs` sampled every `check_interval_secs`.
    pub fn for_window(window_secs: u64, check_interval_secs: u64) -> Self {
        let capacity = window_secs
            .checked_div(check_interval_secs)
            .unwrap_or(0) as usize;
        Self::new(capacity)
    }

    /// Build a queue by pushing `items` in order, keeping only the newest.
    #[cfg(test)]
    pub fn from_items<I: IntoIterator<Item = T>>(capacity: usize, items: I) -> Self {
        let mut history = Self::new(capacity);
        for item in items {
            history.push(item);
        }
        history
    }

    pub fn push(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(item);
    }

    /// Iterate oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
impl<T: Clone> BoundedHistory<T> {
    /// Snapshot of the current contents, oldest-first.
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut history = BoundedHistory::new(3);
        for i in 1..=5 {
            history.push(i);
        }
        assert_eq!(history.to_vec(), vec![3, 4, 5]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_zero_capacity_stays_empty() {
        let mut history = BoundedHistory::new(0);
        history.push(1);
        history.push(2);
        assert!(history.is_empty());
        assert_eq!(history.to_vec(), Vec::<i32>::new());
    }

    #[test]
    fn test_for_window_floors_capacity() {
        assert_eq!(BoundedHistory::<u8>::for_window(120, 7).capacity(), 17);
        assert_eq!(BoundedHistory::<u8>::for_window(600, 7).capacity(), 85);
        assert_eq!(BoundedHistory::<u8>::for_window(120, 120).capacity(), 1);
        assert_eq!(BoundedHistory::<u8>::for_window(120, 300).capacity(), 0);
        assert_eq!(BoundedHistory::<u8>::for_window(120, 0).capacity(), 0);
    }

    #[test]
    fn test_to_vec_does_not_mutate() {
        let history = BoundedHistory::from_items(2, [1, 2]);
        assert_eq!(history.to_vec(), vec![1, 2]);
        assert_eq!(history.to_vec(), vec![1, 2]);
        assert_eq!(history.len(), 2);
    }

    proptest! {
        #[test]
        fn keeps_last_min_n_c_items(capacity in 0usize..40, items in prop::collection::vec(any::<u32>(), 0..120)) {
            let history = BoundedHistory::from_items(capacity, items.clone());
            let kept = items.len().min(capacity);
            prop_assert_eq!(history.len(), kept);
            prop_assert_eq!(history.to_vec(), items[items.len() - kept..].to_vec());
        }
    }
}
