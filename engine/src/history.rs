use std::collections::VecDeque;

/// Number of prices retained per stock.
pub const HISTORY_CAPACITY: usize = 10;

/// Fixed-capacity rolling window of prices, oldest first.
///
/// Pushing into a full window evicts the oldest price. Retained prices keep
/// their insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryWindow {
    values: VecDeque<i64>,
    capacity: usize,
}

impl HistoryWindow {
    /// A capacity of zero is raised to one: the newest price is always kept.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window seeded with the most recent `capacity` prices of `history`.
    pub fn from_slice(history: &[i64], capacity: usize) -> Self {
        let mut w = Self::new(capacity);
        let start = history.len().saturating_sub(w.capacity);
        w.values.extend(&history[start..]);
        w
    }

    pub fn push(&mut self, price: i64) {
        while self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(price);
    }

    pub fn latest(&self) -> Option<i64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().copied()
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.values.into()
    }
}

/// Last `capacity - 1` prices of `history` followed by `new_price`.
pub fn append_bounded(history: &[i64], new_price: i64, capacity: usize) -> Vec<i64> {
    let mut w = HistoryWindow::from_slice(history, capacity);
    w.push(new_price);
    w.into_vec()
}
