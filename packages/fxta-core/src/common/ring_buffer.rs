//! Fixed-capacity f64 window used by the streaming indicators.
//!
//! - no allocation after construction
//! - O(1) push / get / sum
//! - `update_last` for revising the still-forming bar

/// Ring buffer over the most recent `capacity` values.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    data: Vec<f64>,
    capacity: usize,
    head: usize,
    len: usize,
    running_sum: f64,
}

impl RingBuffer {
    /// Creates an empty buffer. A zero capacity is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            capacity,
            head: 0,
            len: 0,
            running_sum: 0.0,
        }
    }

    /// Appends a value, evicting the oldest one when full.
    #[inline]
    pub fn push(&mut self, value: f64) {
        if self.len == self.capacity {
            self.running_sum -= self.data[self.head];
        } else {
            self.len += 1;
        }

        self.data[self.head] = value;
        self.running_sum += value;
        self.head = (self.head + 1) % self.capacity;
    }

    /// Value at `index`: 0 is the oldest, -1 the newest. Out of range is NaN.
    #[inline]
    pub fn get(&self, index: i32) -> f64 {
        match self.slot(index) {
            Some(idx) => self.data[idx],
            None => f64::NAN,
        }
    }

    fn slot(&self, index: i32) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        if index < 0 {
            let back = index.unsigned_abs() as usize;
            if back > self.len {
                return None;
            }
            Some((self.head + self.capacity - back) % self.capacity)
        } else {
            let idx = index as usize;
            if idx >= self.len {
                return None;
            }
            Some((self.head + self.capacity - self.len + idx) % self.capacity)
        }
    }

    #[inline]
    pub fn last(&self) -> f64 {
        self.get(-1)
    }

    #[inline]
    pub fn first(&self) -> f64 {
        self.get(0)
    }

    /// Running sum of the window (O(1)).
    #[inline]
    pub fn sum(&self) -> f64 {
        self.running_sum
    }

    #[inline]
    pub fn mean(&self) -> f64 {
        if self.len == 0 {
            f64::NAN
        } else {
            self.running_sum / self.len as f64
        }
    }

    /// Largest value in the window (O(n)).
    pub fn max(&self) -> f64 {
        self.iter().fold(f64::NAN, f64::max)
    }

    /// Smallest value in the window (O(n)).
    pub fn min(&self) -> f64 {
        self.iter().fold(f64::NAN, f64::min)
    }

    /// Replaces the newest value, keeping the running sum consistent.
    #[inline]
    pub fn update_last(&mut self, value: f64) {
        if self.len == 0 {
            return;
        }
        let last_idx = (self.head + self.capacity - 1) % self.capacity;
        self.running_sum += value - self.data[last_idx];
        self.data[last_idx] = value;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.running_sum = 0.0;
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> RingBufferIter<'_> {
        RingBufferIter {
            buffer: self,
            index: 0,
        }
    }
}

pub struct RingBufferIter<'a> {
    buffer: &'a RingBuffer,
    index: usize,
}

impl<'a> Iterator for RingBufferIter<'a> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.buffer.len {
            return None;
        }
        let val = self.buffer.get(self.index as i32);
        self.index += 1;
        Some(val)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.buffer.len - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RingBufferIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_get() {
        let mut buf = RingBuffer::new(3);
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);

        assert_eq!(buf.get(0), 1.0);
        assert_eq!(buf.get(-1), 3.0);
        assert_eq!(buf.len(), 3);
        assert!(buf.get(3).is_nan());
        assert!(buf.get(-4).is_nan());
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut buf = RingBuffer::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            buf.push(v);
        }

        assert_eq!(buf.first(), 2.0);
        assert_eq!(buf.last(), 4.0);
        assert_eq!(buf.sum(), 9.0);
        assert_eq!(buf.mean(), 3.0);
        assert_eq!(buf.iter().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_update_last() {
        let mut buf = RingBuffer::new(3);
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);

        buf.update_last(5.0);
        assert_eq!(buf.last(), 5.0);
        assert_eq!(buf.sum(), 8.0);
    }

    #[test]
    fn test_extremes() {
        let mut buf = RingBuffer::new(4);
        assert!(buf.max().is_nan());
        for v in [3.0, -1.0, 7.0, 2.0, 0.5] {
            buf.push(v);
        }
        assert_eq!(buf.max(), 7.0);
        assert_eq!(buf.min(), -1.0);
    }

    #[test]
    fn test_zero_capacity() {
        let mut buf = RingBuffer::new(0);
        buf.push(1.0);
        buf.push(2.0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.last(), 2.0);
    }
}
