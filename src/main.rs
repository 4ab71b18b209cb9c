use std::path::{Path, PathBuf};
use std::process::ExitCode;

use burn::prelude::Backend as _;
use clap::{Parser, Subcommand};

use drone_drop::agent::DqnAgent;
use drone_drop::config::Config;
use drone_drop::environment::{Action, Environment};
use drone_drop::qnetwork::{QNetwork, QNetworkConfig};
use drone_drop::replay::Transition;

type Backend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;

#[derive(Parser, Debug)]
#[command(name = "drone-drop", about = "DQN release-policy training for the drone drop testbed")]
struct Cli {
    /// Configuration file; defaults are used when it does not exist.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a release policy from scratch.
    Train {
        /// Master seed for the backend, environment, and agent RNGs. The
        /// same seed reproduces the run exactly.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Directory checkpoints are written into.
        #[arg(long, default_value = "brains")]
        checkpoint_dir: PathBuf,
    },
    /// Run greedy evaluation trials from a saved checkpoint.
    Eval {
        /// Checkpoint path (without the record file extension).
        #[arg(long)]
        checkpoint: PathBuf,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 10)]
        trials: u32,
        /// Log a render frame every step instead of running headless.
        #[arg(long)]
        render: bool,
    },
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        log::info!(
            "no config file at {}, using built-in defaults",
            cli.config.display()
        );
        Config::default()
    };

    match cli.command {
        Command::Train {
            seed,
            checkpoint_dir,
        } => train(config, seed, &checkpoint_dir),
        Command::Eval {
            checkpoint,
            seed,
            trials,
            render,
        } => eval(config, &checkpoint, seed, trials, render),
    }
}

fn build_agent(config: &Config, seed: u64) -> DqnAgent<QNetwork<Backend>> {
    Backend::seed(seed);
    let device = Default::default();
    let qnetwork = QNetworkConfig::new(config.dqn.hidden_size, config.dqn.learning_rate)
        .init::<Backend>(&device);
    DqnAgent::new(qnetwork, &config.dqn, seed.wrapping_add(1))
}

fn train(config: Config, seed: u64, checkpoint_dir: &Path) -> ExitCode {
    let mut agent = build_agent(&config, seed);
    let mut env = Environment::new(config, seed.wrapping_add(2), false);
    log::info!(
        "training for {} episodes (seed {seed})",
        config.training.episodes
    );

    for episode in 1..=config.training.episodes {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0u32;

        loop {
            let action_index = agent.act(&state);
            let action = match Action::from_index(action_index) {
                Some(action) => action,
                None => unreachable!(),
            };
            let step = env
                .step(action)
                .expect("environment is reset at the top of the episode");
            agent.store(Transition {
                state,
                action: action_index,
                reward: step.reward,
                next_state: step.observation,
                done: step.done,
            });
            if let Some(loss) = agent.learn() {
                log::trace!("episode {episode} step {steps}: loss {loss:.5}");
            }
            total_reward += step.reward;
            steps += 1;
            state = step.observation;
            if step.done {
                if step.truncated {
                    log::debug!("episode {episode} truncated at {steps} steps");
                }
                break;
            }
        }

        if episode % config.training.decay_every == 0 {
            agent.decay_epsilon();
        }
        if episode % config.training.sync_every == 0 {
            agent.sync_target();
        }
        log::info!(
            "episode {episode}/{}: reward {total_reward:.1}, steps {steps}, epsilon {:.3}, buffer {}",
            config.training.episodes,
            agent.epsilon(),
            agent.buffer_len()
        );

        if episode % config.training.checkpoint_every == 0 {
            match agent.save_checkpoint(checkpoint_dir, episode) {
                Ok(path) => log::info!("saved checkpoint to {}", path.display()),
                Err(e) => {
                    log::error!("failed to save checkpoint: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}

fn eval(config: Config, checkpoint: &Path, seed: u64, trials: u32, render: bool) -> ExitCode {
    let mut agent = build_agent(&config, seed);
    if let Err(e) = agent.load_checkpoint(checkpoint) {
        log::error!("cannot evaluate: {e}");
        return ExitCode::FAILURE;
    }
    agent.set_greedy(true);

    let mut env = Environment::new(config, seed.wrapping_add(2), render);
    for trial in 1..=trials {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        loop {
            let action = match Action::from_index(agent.act(&state)) {
                Some(action) => action,
                None => unreachable!(),
            };
            let step = env.step(action).expect("environment was reset");
            if render {
                match env.render() {
                    Ok(frame) => log::debug!("{frame:?}"),
                    Err(e) => log::warn!("render failed: {e}"),
                }
            }
            total_reward += step.reward;
            state = step.observation;
            if step.done {
                break;
            }
        }
        log::info!("trial {trial}/{trials}: reward {total_reward:.1}");
    }
    env.close();
    ExitCode::SUCCESS
}
