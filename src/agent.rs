use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::config::Dqn;
use crate::environment::{State, ACTION_COUNT};
use crate::qnetwork::{CheckpointError, QFunction};
use crate::replay::{ReplayBuffer, Transition};

/// DQN orchestration: epsilon-greedy action selection, experience storage,
/// Bellman-target learning updates, exploration decay, target-network sync.
///
/// Created once per training run and kept across episodes. All randomness
/// flows through the owned, seeded RNG.
pub struct DqnAgent<Q: QFunction> {
    q: Q,
    replay: ReplayBuffer,
    rng: Pcg64,
    epsilon: f32,
    epsilon_min: f32,
    epsilon_decay: f32,
    gamma: f32,
    batch_size: usize,
    greedy: bool,
}

impl<Q: QFunction> DqnAgent<Q> {
    pub fn new(q: Q, config: &Dqn, seed: u64) -> Self {
        Self {
            q,
            replay: ReplayBuffer::new(config.replay_capacity),
            rng: Pcg64::seed_from_u64(seed),
            epsilon: config.epsilon_start,
            epsilon_min: config.epsilon_min,
            epsilon_decay: config.epsilon_decay,
            gamma: config.gamma,
            batch_size: config.batch_size,
            greedy: false,
        }
    }

    /// Epsilon-greedy action index. In greedy mode (evaluation of a trained
    /// policy) exploration is bypassed entirely. Exploitation takes the
    /// first maximal Q-value's index, so ties break deterministically.
    pub fn act(&mut self, state: &State) -> usize {
        if !self.greedy && self.rng.gen::<f32>() < self.epsilon {
            return self.rng.gen_range(0..ACTION_COUNT);
        }
        argmax(&self.q.predict(state))
    }

    pub fn store(&mut self, transition: Transition) {
        self.replay.add(transition);
    }

    /// One learning update. A no-op returning `None` until the buffer holds
    /// a full batch; otherwise samples uniformly, regresses the taken
    /// actions' Q-values toward `reward + gamma * max(target_Q(next))`
    /// (bootstrap zeroed on terminal transitions) and returns the loss.
    pub fn learn(&mut self) -> Option<f32> {
        let batch = self.replay.sample(&mut self.rng, self.batch_size)?;
        let mut targets = Vec::with_capacity(batch.len());
        for transition in &batch {
            let bootstrap = if transition.done {
                0.0
            } else {
                let next = self.q.predict_target(&transition.next_state);
                self.gamma * next.iter().copied().fold(f32::NEG_INFINITY, f32::max)
            };
            targets.push(transition.reward + bootstrap);
        }
        Some(self.q.fit(&batch, &targets))
    }

    /// Multiplicative decay, floored at `epsilon_min`. Called at episode
    /// boundaries (every `training.decay_every` episodes), never per step.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);
    }

    /// Hard copy of the online parameters into the target network.
    pub fn sync_target(&mut self) {
        self.q.sync_target();
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Greedy mode forces pure exploitation regardless of the stored
    /// epsilon schedule.
    pub fn set_greedy(&mut self, greedy: bool) {
        self.greedy = greedy;
    }

    pub fn buffer_len(&self) -> usize {
        self.replay.len()
    }

    /// Writes a checkpoint keyed by episode number, creating the directory
    /// as needed. Returns the path the record was written under.
    pub fn save_checkpoint(&self, dir: &Path, episode: u32) -> Result<PathBuf, CheckpointError> {
        std::fs::create_dir_all(dir).map_err(CheckpointError::Io)?;
        let path = dir.join(format!("model_episode_{episode}"));
        self.q.save(&path)?;
        Ok(path)
    }

    pub fn load_checkpoint(&mut self, path: &Path) -> Result<(), CheckpointError> {
        self.q.load(path)
    }
}

/// Index of the first maximal value.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
