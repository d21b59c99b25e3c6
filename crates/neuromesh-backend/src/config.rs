//! Network architecture configuration.

use crate::error::{BackendError, Result};
use serde::{Deserialize, Serialize};

/// The activation function applied after each layer's affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// `1 / (1 + e^-x)`.
    Sigmoid,
    /// `max(0, x)`.
    ReLu,
}

impl Activation {
    pub(crate) fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::ReLu => x.max(0.0),
        }
    }

    pub(crate) fn derivative(self, activated: f32) -> f32 {
        match self {
            Activation::Sigmoid => activated * (1.0 - activated),
            Activation::ReLu => {
                if activated > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// The architecture family an agent's network is described as. Allocation,
/// forward, and train are a single feedforward kernel today regardless of
/// which kind is configured — `network_kind` is carried through as agent
/// metadata for callers and the mesh UI, not yet dispatched on internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkKind {
    /// Plain multilayer perceptron.
    Mlp,
    /// Long short-term memory network.
    Lstm,
    /// Convolutional network.
    Cnn,
    /// Transformer.
    Transformer,
}

/// Describes the architecture to allocate: layer widths and the PRNG seed used
/// for weight initialization and training, so `train` is deterministic given
/// the same config and samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// The architecture family this network is described as.
    pub network_kind: NetworkKind,
    /// Layer widths, including the input layer at index 0 and the output layer at the end.
    /// Must contain at least two entries, all non-zero.
    pub layer_sizes: Vec<usize>,
    /// Seed for weight initialization and sample ordering during training.
    pub seed: u64,
    /// Activation applied after every layer (including the output layer).
    pub activation: Activation,
    /// Learning rate used during `train`.
    pub learning_rate: f32,
}

impl NetworkConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 {
            return Err(BackendError::InvalidArchitecture(
                "network must have at least an input and output layer".into(),
            ));
        }
        if self.layer_sizes.iter().any(|&w| w == 0) {
            return Err(BackendError::InvalidArchitecture(
                "layer widths must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Total number of weight + bias elements this architecture requires.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.layer_sizes
            .windows(2)
            .map(|w| w[0] * w[1] + w[1])
            .sum()
    }
}
