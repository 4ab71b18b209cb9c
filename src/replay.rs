use rand::seq::index;
use rand_pcg::Pcg64;
use ringbuffer::{AllocRingBuffer, RingBuffer};

use crate::environment::State;

/// One step of experience. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: usize,
    pub reward: f32,
    pub next_state: State,
    pub done: bool,
}

/// Bounded experience memory. Pushing onto a full buffer evicts the oldest
/// transition; sampling draws uniformly without replacement.
pub struct ReplayBuffer {
    memory: AllocRingBuffer<Transition>,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: AllocRingBuffer::new(capacity),
        }
    }

    pub fn add(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// `None` until at least `batch_size` transitions have accumulated.
    pub fn sample(&self, rng: &mut Pcg64, batch_size: usize) -> Option<Vec<&Transition>> {
        if self.memory.len() < batch_size {
            return None;
        }
        let indices = index::sample(rng, self.memory.len(), batch_size);
        Some(
            indices
                .into_iter()
                .filter_map(|i| self.memory.get(i))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.memory.iter()
    }
}
