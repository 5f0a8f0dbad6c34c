//! Bounded sample buffers
//!
//! Fixed-capacity ring buffers for interaction traces. Appends never fail;
//! once full, the oldest sample is evicted.

use crate::behavior::types::{InteractionSample, ScrollSample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Append-only ring buffer with oldest-first eviction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBuffer<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> SampleBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one if the buffer is full
    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Pointer and scroll traces for one analysis run
#[derive(Debug, Clone)]
pub struct InteractionTrace {
    pointer: SampleBuffer<InteractionSample>,
    scroll: SampleBuffer<ScrollSample>,
    /// Timestamp of the previous scroll event
    last_scroll_ms: Option<i64>,
}

impl InteractionTrace {
    pub fn new(pointer_capacity: usize, scroll_capacity: usize) -> Self {
        Self {
            pointer: SampleBuffer::new(pointer_capacity),
            scroll: SampleBuffer::new(scroll_capacity),
            last_scroll_ms: None,
        }
    }

    pub fn record_pointer(&mut self, x: f64, y: f64, timestamp_ms: i64) {
        self.pointer.push(InteractionSample::new(x, y, timestamp_ms));
    }

    /// Record a scroll event, deriving the gap from the previous scroll
    pub fn record_scroll(&mut self, scroll_position: f64, timestamp_ms: i64) {
        let gap = match self.last_scroll_ms {
            Some(prev) => u64::try_from(timestamp_ms.saturating_sub(prev)).unwrap_or(0),
            None => 0,
        };
        self.last_scroll_ms = Some(timestamp_ms);
        self.scroll.push(ScrollSample::new(scroll_position, timestamp_ms, gap));
    }

    pub fn pointer_snapshot(&self) -> Vec<InteractionSample> {
        self.pointer.snapshot()
    }

    pub fn scroll_snapshot(&self) -> Vec<ScrollSample> {
        self.scroll.snapshot()
    }

    pub fn pointer_len(&self) -> usize {
        self.pointer.len()
    }

    pub fn scroll_len(&self) -> usize {
        self.scroll.len()
    }
}
