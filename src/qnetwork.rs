use std::fmt;
use std::path::{Path, PathBuf};

use burn::{
    grad_clipping::GradientClippingConfig,
    optim::{adaptor::OptimizerAdaptor, AdamW, AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{CompactRecorder, RecorderError},
    tensor::backend::AutodiffBackend,
};
use nn::loss::{MseLoss, Reduction};

use crate::environment::{State, ACTION_COUNT, STATE_DIM};
use crate::replay::Transition;

/// Trainable state -> action-value mapping, plus the delayed copy used for
/// bootstrap targets. The agent only ever talks to this seam; any
/// differentiable approximator that regresses the taken actions' values
/// toward supplied targets satisfies it.
pub trait QFunction {
    /// Q-values of the online network, one per action.
    fn predict(&self, state: &State) -> Vec<f32>;

    /// Q-values of the target network.
    fn predict_target(&self, state: &State) -> Vec<f32>;

    /// One gradient step minimizing the mean-squared error between the
    /// taken actions' predicted values and `targets` (aligned with
    /// `batch`). Other actions contribute no gradient. Returns the loss.
    fn fit(&mut self, batch: &[&Transition], targets: &[f32]) -> f32;

    /// Hard copy of the online parameters into the target network.
    fn sync_target(&mut self);

    fn save(&self, path: &Path) -> Result<(), CheckpointError>;
    fn load(&mut self, path: &Path) -> Result<(), CheckpointError>;
}

#[derive(Debug)]
pub enum CheckpointError {
    Missing(PathBuf),
    Io(std::io::Error),
    Recorder(RecorderError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Missing(path) => {
                write!(f, "checkpoint not found at {}", path.display())
            }
            CheckpointError::Io(e) => write!(f, "checkpoint directory error: {e}"),
            CheckpointError::Recorder(e) => write!(f, "checkpoint record error: {e}"),
        }
    }
}

impl std::error::Error for CheckpointError {}

#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    linear0: nn::Linear<B>,
    linear1: nn::Linear<B>,
    linear2: nn::Linear<B>,
    activation: nn::Relu,
}

impl<B: Backend> Model<B> {
    fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.linear0.forward(x));
        let x = self.activation.forward(self.linear1.forward(x));
        // No activation on the output: Q-values carry miss penalties and
        // must be free to go negative.
        self.linear2.forward(x)
    }
}

/// MLP value approximator with an AdamW optimizer and a hard-synced target
/// copy.
pub struct QNetwork<B: AutodiffBackend> {
    online: Model<B>,
    target: Model<B>,
    optimizer: OptimizerAdaptor<AdamW<B::InnerBackend>, Model<B>, B>,
    device: B::Device,
    learning_rate: f64,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    hidden_size: usize,
    learning_rate: f64,
}

impl QNetworkConfig {
    /// Returns the initialized network pair; target starts as an exact copy
    /// of the online network.
    pub fn init<B: AutodiffBackend>(&self, device: &B::Device) -> QNetwork<B> {
        let model = Model {
            linear0: nn::LinearConfig::new(STATE_DIM, self.hidden_size).init(device),
            linear1: nn::LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            linear2: nn::LinearConfig::new(self.hidden_size, ACTION_COUNT).init(device),
            activation: nn::Relu::new(),
        };
        let optimizer = AdamWConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Value(100.0)))
            .init();
        QNetwork {
            online: model.clone(),
            target: model,
            optimizer,
            device: device.clone(),
            learning_rate: self.learning_rate,
        }
    }
}

impl<B: AutodiffBackend> QNetwork<B> {
    fn values(model: &Model<B>, state: &State, device: &B::Device) -> Vec<f32> {
        let x = Tensor::<B, 1>::from_floats(state.as_slice(), device);
        model
            .forward(x.unsqueeze())
            .into_data()
            .to_vec::<f32>()
            .unwrap()
    }
}

impl<B: AutodiffBackend> QFunction for QNetwork<B> {
    fn predict(&self, state: &State) -> Vec<f32> {
        Self::values(&self.online, state, &self.device)
    }

    fn predict_target(&self, state: &State) -> Vec<f32> {
        Self::values(&self.target, state, &self.device)
    }

    fn fit(&mut self, batch: &[&Transition], targets: &[f32]) -> f32 {
        let n = batch.len();
        let mut states: Vec<Tensor<B, 2>> = Vec::with_capacity(n);
        let mut actions: Vec<i32> = Vec::with_capacity(n);
        for transition in batch {
            states.push(
                Tensor::<B, 1>::from_floats(transition.state.as_slice(), &self.device).unsqueeze(),
            );
            actions.push(transition.action as i32);
        }
        let states = Tensor::cat(states, 0);
        let actions =
            Tensor::<B, 1, Int>::from_ints(actions.as_slice(), &self.device).reshape([n as i32, 1]);
        let targets =
            Tensor::<B, 1>::from_floats(targets, &self.device).reshape([n as i32, 1]);

        let predicted = self.online.forward(states).gather(1, actions);
        let loss = MseLoss.forward(predicted, targets, Reduction::Mean);
        let loss_value = loss.clone().into_data().to_vec::<f32>().unwrap()[0];

        let gradients = loss.backward();
        let gradient_params = GradientsParams::from_grads(gradients, &self.online);
        self.online = self
            .optimizer
            .step(self.learning_rate, self.online.clone(), gradient_params);
        loss_value
    }

    fn sync_target(&mut self) {
        self.target = self.online.clone();
    }

    fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        self.online
            .clone()
            .save_file(path, &CompactRecorder::new())
            .map_err(CheckpointError::Recorder)
    }

    fn load(&mut self, path: &Path) -> Result<(), CheckpointError> {
        let file = path.with_extension("mpk");
        if !file.exists() {
            return Err(CheckpointError::Missing(file));
        }
        self.online = self
            .online
            .clone()
            .load_file(path, &CompactRecorder::new(), &self.device)
            .map_err(CheckpointError::Recorder)?;
        self.target = self.online.clone();
        Ok(())
    }
}
