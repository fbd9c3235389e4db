//! Bounded holding area for events that could not be forwarded.

use std::collections::VecDeque;

use stepcast_config::DeliveryPolicy;

/// Serialized events waiting for the link to come back.
///
/// Under [`DeliveryPolicy::Drop`] nothing is ever held.
#[derive(Debug)]
pub struct Outbox {
    capacity: usize,
    queue: VecDeque<String>,
}

impl Outbox {
    pub fn new(policy: DeliveryPolicy) -> Self {
        let capacity = match policy {
            DeliveryPolicy::Drop => 0,
            DeliveryPolicy::Queue { capacity } => capacity,
        };
        Self {
            capacity,
            queue: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Hold `message`, evicting the oldest when full. Returns false when the
    /// message was not kept.
    pub fn push(&mut self, message: String) -> bool {
        if self.capacity == 0 {
            return false;
        }
        while self.queue.len() >= self.capacity {
            self.queue.pop_front();
        }
        self.queue.push_back(message);
        true
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Put a message back at the head after a failed flush.
    pub fn push_front(&mut self, message: String) {
        if self.capacity > 0 {
            self.queue.push_front(message);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
