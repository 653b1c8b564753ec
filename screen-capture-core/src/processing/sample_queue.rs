use std::collections::VecDeque;

/// Bounded FIFO of interleaved audio samples.
///
/// Overflow drops the oldest samples so a stalled consumer never blocks the
/// audio thread. Wrap in a mutex for cross-thread access.
#[derive(Debug)]
pub struct SampleQueue {
    samples: VecDeque<f32>,
    capacity: usize,
    dropped: u64,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append samples, evicting the oldest ones past capacity.
    pub fn push(&mut self, samples: &[f32]) {
        if self.capacity == 0 || samples.is_empty() {
            return;
        }
        let tail = if samples.len() > self.capacity {
            self.dropped += (samples.len() - self.capacity) as u64;
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let overflow = (self.samples.len() + tail.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.samples.drain(..overflow);
            self.dropped += overflow as u64;
        }
        self.samples.extend(tail.iter().copied());
    }

    /// Remove and return up to `count` samples.
    pub fn pop(&mut self, count: usize) -> Vec<f32> {
        let count = count.min(self.samples.len());
        self.samples.drain(..count).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_in_order() {
        let mut queue = SampleQueue::new(8);
        queue.push(&[1.0, 2.0, 3.0]);
        queue.push(&[4.0]);

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.pop(3), vec![1.0, 2.0, 3.0]);
        assert_eq!(queue.pop(10), vec![4.0]);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut queue = SampleQueue::new(4);
        queue.push(&[1.0, 2.0, 3.0, 4.0]);
        queue.push(&[5.0, 6.0]);

        assert_eq!(queue.pop(4), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(queue.dropped(), 2);
    }

    #[test]
    fn oversized_push_keeps_tail() {
        let mut queue = SampleQueue::new(3);
        queue.push(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(queue.pop(3), vec![3.0, 4.0, 5.0]);
        assert_eq!(queue.dropped(), 2);
    }

    #[test]
    fn clear_and_zero_capacity() {
        let mut queue = SampleQueue::new(4);
        queue.push(&[1.0]);
        queue.clear();
        assert!(queue.pop(1).is_empty());

        let mut none = SampleQueue::new(0);
        none.push(&[1.0]);
        assert!(none.is_empty());
        assert_eq!(none.capacity(), 0);
    }
}
