//! The in-memory weight/bias layout and the forward/train/codec math that
//! operates on it, generic over the dot-product strategy in use.

use crate::config::{Activation, NetworkConfig};
use crate::dot::DotProduct;
use crate::error::{BackendError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One allocated network: weight matrices and bias vectors per layer, plus
/// the architecture metadata needed to validate shapes on every call.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) layer_sizes: Vec<usize>,
    pub(crate) activation: Activation,
    pub(crate) learning_rate: f32,
    /// `weights[l]` is the `layer_sizes[l+1] x layer_sizes[l]` matrix, row-major.
    pub(crate) weights: Vec<Vec<f32>>,
    pub(crate) biases: Vec<Vec<f32>>,
}

/// A single labeled training example.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Input activations, length must equal `layer_sizes[0]`.
    pub inputs: Vec<f32>,
    /// Target outputs, length must equal the last layer's width.
    pub targets: Vec<f32>,
}

/// Result of a `train` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOutcome {
    /// Final accuracy over the training set, in `[0, 1]`.
    pub final_accuracy: f32,
    /// The epoch at which the loss dropped below the convergence threshold,
    /// or the last epoch run if it never did.
    pub convergence_epoch: u32,
}

const CONVERGENCE_MSE: f32 = 0.01;

impl Network {
    pub(crate) fn allocate(config: &NetworkConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut weights = Vec::with_capacity(config.layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(config.layer_sizes.len() - 1);
        for window in config.layer_sizes.windows(2) {
            let (fan_in, fan_out) = (window[0], window[1]);
            let bound = 1.0 / (fan_in as f32).sqrt();
            weights.push(
                (0..fan_in * fan_out)
                    .map(|_| rng.gen_range(-bound..=bound))
                    .collect(),
            );
            biases.push((0..fan_out).map(|_| rng.gen_range(-bound..=bound)).collect());
        }
        Self {
            layer_sizes: config.layer_sizes.clone(),
            activation: config.activation,
            learning_rate: config.learning_rate,
            weights,
            biases,
        }
    }

    pub(crate) fn input_width(&self) -> usize {
        self.layer_sizes[0]
    }

    pub(crate) fn output_width(&self) -> usize {
        *self.layer_sizes.last().unwrap()
    }

    /// Runs the forward pass, returning activations for every layer
    /// (including the input), which `train` reuses for backpropagation.
    pub(crate) fn forward_activations<D: DotProduct>(&self, inputs: &[f32]) -> Vec<Vec<f32>> {
        let mut activations = Vec::with_capacity(self.weights.len() + 1);
        activations.push(inputs.to_vec());
        for (weights, biases) in self.weights.iter().zip(&self.biases) {
            let current = activations.last().unwrap();
            let fan_in = current.len();
            let fan_out = biases.len();
            let mut next = Vec::with_capacity(fan_out);
            for j in 0..fan_out {
                let row = &weights[j * fan_in..(j + 1) * fan_in];
                let z = D::dot(row, current) + biases[j];
                next.push(self.activation.apply(z));
            }
            activations.push(next);
        }
        activations
    }

    pub(crate) fn forward<D: DotProduct>(&self, inputs: &[f32]) -> Result<Vec<f32>> {
        if inputs.len() != self.input_width() {
            return Err(BackendError::ShapeMismatch {
                expected: self.input_width(),
                actual: inputs.len(),
            });
        }
        Ok(self
            .forward_activations::<D>(inputs)
            .pop()
            .expect("forward always produces at least the output layer"))
    }

    /// Batch gradient descent over `samples` for up to `epochs` rounds.
    pub(crate) fn train<D: DotProduct>(
        &mut self,
        samples: &[Sample],
        epochs: u32,
    ) -> Result<TrainingOutcome> {
        for sample in samples {
            if sample.inputs.len() != self.input_width() {
                return Err(BackendError::ShapeMismatch {
                    expected: self.input_width(),
                    actual: sample.inputs.len(),
                });
            }
            if sample.targets.len() != self.output_width() {
                return Err(BackendError::ShapeMismatch {
                    expected: self.output_width(),
                    actual: sample.targets.len(),
                });
            }
        }
        if samples.is_empty() {
            return Ok(TrainingOutcome {
                final_accuracy: 0.0,
                convergence_epoch: 0,
            });
        }

        let mut convergence_epoch = epochs;
        let mut last_mse = f32::MAX;
        for epoch in 0..epochs {
            last_mse = self.train_epoch::<D>(samples);
            if last_mse < CONVERGENCE_MSE {
                convergence_epoch = epoch + 1;
                break;
            }
        }

        let accuracy = self.accuracy::<D>(samples);
        let _ = last_mse;
        Ok(TrainingOutcome {
            final_accuracy: accuracy,
            convergence_epoch,
        })
    }

    fn train_epoch<D: DotProduct>(&mut self, samples: &[Sample]) -> f32 {
        let mut total_mse = 0.0;
        for sample in samples {
            let activations = self.forward_activations::<D>(&sample.inputs);
            let output = activations.last().unwrap();

            let mut deltas: Vec<f32> = output
                .iter()
                .zip(&sample.targets)
                .map(|(o, t)| (o - t) * self.activation.derivative(*o))
                .collect();
            total_mse += output
                .iter()
                .zip(&sample.targets)
                .map(|(o, t)| (o - t).powi(2))
                .sum::<f32>()
                / output.len() as f32;

            for layer in (0..self.weights.len()).rev() {
                let prev_activations = &activations[layer];
                let fan_in = prev_activations.len();
                let fan_out = self.biases[layer].len();

                let mut next_deltas = vec![0.0_f32; fan_in];
                for j in 0..fan_out {
                    let delta = deltas[j];
                    for k in 0..fan_in {
                        let w_idx = j * fan_in + k;
                        next_deltas[k] += self.weights[layer][w_idx] * delta;
                        self.weights[layer][w_idx] -=
                            self.learning_rate * delta * prev_activations[k];
                    }
                    self.biases[layer][j] -= self.learning_rate * delta;
                }

                if layer > 0 {
                    let layer_activations = &activations[layer];
                    deltas = next_deltas
                        .into_iter()
                        .zip(layer_activations)
                        .map(|(d, a)| d * self.activation.derivative(*a))
                        .collect();
                }
            }
        }
        total_mse / samples.len() as f32
    }

    fn accuracy<D: DotProduct>(&self, samples: &[Sample]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let total: f32 = samples
            .iter()
            .map(|s| {
                let output = self.forward::<D>(&s.inputs).expect("shape already validated");
                let per_output: f32 = output
                    .iter()
                    .zip(&s.targets)
                    .map(|(o, t)| 1.0 - (o - t).abs().min(1.0))
                    .sum::<f32>()
                    / output.len() as f32;
                per_output
            })
            .sum();
        (total / samples.len() as f32).clamp(0.0, 1.0)
    }

    /// Flattens weights and biases into a self-describing byte blob:
    /// layer count, each layer width, then every weight and bias as
    /// little-endian `f32`.
    pub(crate) fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.layer_sizes.len() as u32).to_le_bytes());
        for &width in &self.layer_sizes {
            bytes.extend_from_slice(&(width as u32).to_le_bytes());
        }
        for layer_weights in &self.weights {
            for w in layer_weights {
                bytes.extend_from_slice(&w.to_le_bytes());
            }
        }
        for layer_biases in &self.biases {
            for b in layer_biases {
                bytes.extend_from_slice(&b.to_le_bytes());
            }
        }
        bytes
    }

    /// Decodes a blend source network and mixes `w' = (1-blend)*w + blend*w_other`
    /// element-wise into `self`, validating that architectures match.
    pub(crate) fn blend_from(&mut self, bytes: &[u8], blend: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&blend) {
            return Err(BackendError::InvalidBlend(blend));
        }
        let other_sizes = decode_layer_sizes(bytes)?;
        if other_sizes != self.layer_sizes {
            return Err(BackendError::ShapeMismatch {
                expected: self.layer_sizes.iter().sum(),
                actual: other_sizes.iter().sum(),
            });
        }

        let mut cursor = 4 + other_sizes.len() * 4;
        for layer_weights in &mut self.weights {
            for w in layer_weights.iter_mut() {
                let other = read_f32(bytes, cursor)?;
                *w = (1.0 - blend) * *w + blend * other;
                cursor += 4;
            }
        }
        for layer_biases in &mut self.biases {
            for b in layer_biases.iter_mut() {
                let other = read_f32(bytes, cursor)?;
                *b = (1.0 - blend) * *b + blend * other;
                cursor += 4;
            }
        }
        Ok(())
    }
}

fn decode_layer_sizes(bytes: &[u8]) -> Result<Vec<usize>> {
    if bytes.len() < 4 {
        return Err(BackendError::Malformed("truncated header".into()));
    }
    let count = u32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
    let mut sizes = Vec::with_capacity(count);
    for i in 0..count {
        let offset = 4 + i * 4;
        sizes.push(read_u32(bytes, offset)? as usize);
    }
    Ok(sizes)
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|s| u32::from_le_bytes(s.try_into().unwrap()))
        .ok_or_else(|| BackendError::Malformed("truncated body".into()))
}

fn read_f32(bytes: &[u8], offset: usize) -> Result<f32> {
    read_u32(bytes, offset).map(f32::from_bits)
}
