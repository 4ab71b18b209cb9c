use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Full configuration surface. Every constant the simulation or the agent
/// depends on is tunable from `config.toml`; `Default` carries the stock
/// values.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Config {
    pub sim: Sim,
    pub physics: Physics,
    pub drone: DroneParams,
    pub projectile: ProjectileParams,
    pub target: TargetParams,
    pub reward: Reward,
    pub dqn: Dqn,
    pub training: Training,
}

/// World geometry and stepping. y grows downward; the ground plane sits at
/// `y == height`.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Sim {
    /// World width in meters.
    pub width: f32,
    /// World height in meters; also the ground plane.
    pub height: f32,
    /// Fixed integration time step in seconds.
    pub dt: f32,
    /// Episode step cap; exceeding it truncates the episode.
    pub max_steps: u32,
    /// Fraction of the world height the drone spawns above, at minimum.
    pub drone_min_altitude: f32,
    /// World-to-screen scale, consumed only by the render hook.
    pub pixels_per_meter: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Physics {
    /// m/s^2
    pub gravity: f32,
    /// kg/m^3
    pub air_density: f32,
    /// Wind x-velocity is drawn uniformly from [-max, max] per episode. m/s
    pub wind_force_max: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct DroneParams {
    /// Lateral speed in m/s.
    pub speed: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct ProjectileParams {
    /// kg
    pub mass: f32,
    /// m
    pub radius: f32,
    /// Dimensionless; 0.47 for a sphere.
    pub drag_coefficient: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct TargetParams {
    pub width: f32,
    pub height: f32,
    /// Target x is drawn uniformly from [margin, world width - margin].
    pub margin: f32,
}

/// Terminal reward tiers plus the per-step shaping penalty.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Reward {
    /// Paid when the landing distance is exactly zero.
    pub direct_hit: f32,
    /// Landing within this distance earns the decaying near-miss reward.
    pub near_threshold: f32,
    pub near_base: f32,
    pub near_slope: f32,
    /// Beyond the threshold the penalty grows with distance...
    pub miss_slope: f32,
    /// ...down to this floor.
    pub miss_floor: f32,
    /// Paid every airborne step.
    pub step_penalty: f32,
    /// Paid once when the step cap truncates the episode.
    pub truncation_penalty: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Dqn {
    pub hidden_size: usize,
    pub replay_capacity: usize,
    pub batch_size: usize,
    pub gamma: f32,
    pub learning_rate: f64,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(default)]
pub struct Training {
    pub episodes: u32,
    /// Epsilon decays once every this many episodes.
    pub decay_every: u32,
    /// Target network hard-syncs every this many episodes.
    pub sync_every: u32,
    /// A checkpoint is written every this many episodes.
    pub checkpoint_every: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sim: Sim::default(),
            physics: Physics::default(),
            drone: DroneParams::default(),
            projectile: ProjectileParams::default(),
            target: TargetParams::default(),
            reward: Reward::default(),
            dqn: Dqn::default(),
            training: Training::default(),
        }
    }
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            width: 150.0,
            height: 190.0,
            dt: 0.1,
            max_steps: 200,
            drone_min_altitude: 0.5,
            pixels_per_meter: 5.0,
        }
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            air_density: 1.225,
            wind_force_max: 35.0,
        }
    }
}

impl Default for DroneParams {
    fn default() -> Self {
        Self {
            speed: 10.0,
            width: 5.0,
            height: 2.0,
        }
    }
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self {
            mass: 0.4,
            radius: 0.032,
            drag_coefficient: 0.47,
        }
    }
}

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
            margin: 40.0,
        }
    }
}

impl Default for Reward {
    fn default() -> Self {
        Self {
            direct_hit: 1000.0,
            near_threshold: 10.0,
            near_base: 100.0,
            near_slope: 10.0,
            miss_slope: 10.0,
            miss_floor: -1000.0,
            step_penalty: -1.0,
            truncation_penalty: -1000.0,
        }
    }
}

impl Default for Dqn {
    fn default() -> Self {
        Self {
            hidden_size: 128,
            replay_capacity: 2000,
            batch_size: 32,
            gamma: 0.99,
            learning_rate: 1e-3,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
        }
    }
}

impl Default for Training {
    fn default() -> Self {
        Self {
            episodes: 5000,
            decay_every: 2,
            sync_every: 10,
            checkpoint_every: 250,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to deserialize config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Loads configuration from a toml file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        log::debug!("Loaded config: {:#?}", config);
        Ok(config)
    }
}
