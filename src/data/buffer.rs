//! Bounded series buffer for live charts.

use std::collections::VecDeque;

use farmwatch_types::{SamplePoint, Series};

/// Default number of points kept per live chart.
pub const MAX_POINTS: usize = 30;

/// Fixed-capacity, ordered window of the most recent points for one metric.
///
/// Appending to a full buffer evicts exactly one point, the oldest, before
/// the new point is pushed. The buffer is only ever mutated through
/// [`SeriesBuffer::append`].
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<SamplePoint>,
    capacity: usize,
}

impl Default for SeriesBuffer {
    fn default() -> Self {
        Self::new(MAX_POINTS)
    }
}

impl SeriesBuffer {
    /// Create an empty buffer. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest one if the buffer is full.
    ///
    /// Returns false and leaves the buffer untouched if the point's value is
    /// not finite.
    pub fn append(&mut self, point: SamplePoint) -> bool {
        if !point.is_valid() {
            return false;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        true
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Series {
        self.points.iter().copied().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recently appended point.
    pub fn latest(&self) -> Option<&SamplePoint> {
        self.points.back()
    }
}
