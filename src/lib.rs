//! Drone-drop: a small reinforcement-learning testbed.
//!
//! A drone carries a projectile over a 2D world and must release it so it
//! lands on a ground target, fighting gravity, quadratic air drag, and a
//! per-episode horizontal wind. A DQN agent (replay buffer, epsilon-greedy
//! exploration, hard-synced target network) learns the release policy from
//! simulated episodes.
//!
//! The simulation is fully synchronous and deterministic: every random
//! draw (wind, placement, exploration, replay sampling) flows through
//! explicitly seeded PCG generators, so a fixed seed reproduces episode
//! trajectories bit for bit.

pub mod agent;
pub mod config;
pub mod entities;
pub mod environment;
pub mod qnetwork;
pub mod replay;
pub mod vector;
