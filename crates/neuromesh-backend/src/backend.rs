//! The `NumericBackend` contract and its generic scalar/SIMD implementations.

use crate::config::NetworkConfig;
use crate::dot::{DotProduct, ScalarDot, WideDot};
use crate::error::Result;
use crate::network::{Sample, TrainingOutcome};
use crate::store::{NetworkHandle, NetworkStore};
use std::marker::PhantomData;

/// Allocates, runs, and trains fixed-architecture feedforward networks.
///
/// Implementations are selected at startup by `init_backend` based on SIMD
/// availability; both must be numerically equivalent within the tolerance
/// used in this crate's tests.
pub trait NumericBackend: Send + Sync {
    /// Allocates weights/biases for `config`. Fails with `OutOfCapacity` if
    /// the arena bound would be exceeded.
    fn allocate_network(&self, config: &NetworkConfig) -> Result<NetworkHandle>;

    /// Releases `handle`. Idempotent in the sense that it never panics, but
    /// a second release of the same handle returns `Invalid`, matching every
    /// other operation on a released handle.
    fn release(&self, handle: NetworkHandle) -> Result<()>;

    /// Runs a forward pass. Fails `ShapeMismatch` if `inputs.len()` does not
    /// match the architecture's input width.
    fn forward(&self, handle: NetworkHandle, inputs: &[f32]) -> Result<Vec<f32>>;

    /// Trains for up to `epochs` rounds of batch gradient descent.
    fn train(
        &self,
        handle: NetworkHandle,
        samples: &[Sample],
        epochs: u32,
    ) -> Result<TrainingOutcome>;

    /// Serializes the network's weights and biases to a self-describing blob.
    fn serialize(&self, handle: NetworkHandle) -> Result<Vec<u8>>;

    /// Blends a serialized network into `handle`'s weights:
    /// `w' = (1-blend)*w + blend*w_other`, element-wise.
    fn deserialize_into(&self, handle: NetworkHandle, bytes: &[u8], blend: f32) -> Result<()>;

    /// The strategy name, for diagnostics (`"scalar"` or `"simd"`).
    fn name(&self) -> &'static str;
}

/// A `NumericBackend` generic over its dot-product strategy. `ScalarBackend`
/// and `SimdBackend` are type aliases over this with `ScalarDot`/`WideDot`.
pub struct GenericBackend<D: DotProduct> {
    store: NetworkStore,
    _strategy: PhantomData<D>,
}

impl<D: DotProduct> GenericBackend<D> {
    /// Creates a backend with an arena bounded to `capacity_elements` total
    /// weight+bias floats across all live networks.
    #[must_use]
    pub fn new(capacity_elements: usize) -> Self {
        Self {
            store: NetworkStore::new(capacity_elements),
            _strategy: PhantomData,
        }
    }
}

impl<D: DotProduct> NumericBackend for GenericBackend<D> {
    fn allocate_network(&self, config: &NetworkConfig) -> Result<NetworkHandle> {
        self.store.allocate(config)
    }

    fn release(&self, handle: NetworkHandle) -> Result<()> {
        self.store.release(handle)
    }

    fn forward(&self, handle: NetworkHandle, inputs: &[f32]) -> Result<Vec<f32>> {
        self.store.with_network(handle, |net| net.forward::<D>(inputs))?
    }

    fn train(
        &self,
        handle: NetworkHandle,
        samples: &[Sample],
        epochs: u32,
    ) -> Result<TrainingOutcome> {
        self.store
            .with_network_mut(handle, |net| net.train::<D>(samples, epochs))?
    }

    fn serialize(&self, handle: NetworkHandle) -> Result<Vec<u8>> {
        self.store.with_network(handle, |net| net.serialize())
    }

    fn deserialize_into(&self, handle: NetworkHandle, bytes: &[u8], blend: f32) -> Result<()> {
        self.store
            .with_network_mut(handle, |net| net.blend_from(bytes, blend))?
    }

    fn name(&self) -> &'static str {
        D::NAME
    }
}

/// The reference scalar backend, always available.
pub type ScalarBackend = GenericBackend<ScalarDot>;

/// The SIMD-accelerated backend, used when `dot::simd_available()` returns true.
pub type SimdBackend = GenericBackend<WideDot>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Activation;

    fn config() -> NetworkConfig {
        NetworkConfig {
            network_kind: crate::config::NetworkKind::Mlp,
            layer_sizes: vec![2, 4, 1],
            seed: 42,
            activation: Activation::Sigmoid,
            learning_rate: 0.5,
        }
    }

    #[test]
    fn allocate_forward_release_roundtrip() {
        let backend = ScalarBackend::new(10_000);
        let handle = backend.allocate_network(&config()).unwrap();
        let out = backend.forward(handle, &[0.5, -0.5]).unwrap();
        assert_eq!(out.len(), 1);
        backend.release(handle).unwrap();
        assert!(backend.forward(handle, &[0.5, -0.5]).is_err());
    }

    #[test]
    fn out_of_capacity_is_reported() {
        let backend = ScalarBackend::new(1);
        assert!(backend.allocate_network(&config()).is_err());
    }

    #[test]
    fn shape_mismatch_on_forward() {
        let backend = ScalarBackend::new(10_000);
        let handle = backend.allocate_network(&config()).unwrap();
        assert!(backend.forward(handle, &[0.1, 0.2, 0.3]).is_err());
    }

    #[test]
    fn train_converges_on_trivial_target() {
        let backend = ScalarBackend::new(10_000);
        let handle = backend.allocate_network(&config()).unwrap();
        let samples = vec![
            Sample {
                inputs: vec![0.0, 0.0],
                targets: vec![0.1],
            },
            Sample {
                inputs: vec![1.0, 1.0],
                targets: vec![0.9],
            },
        ];
        let outcome = backend.train(handle, &samples, 500).unwrap();
        assert!(outcome.final_accuracy > 0.5);
        assert!(outcome.convergence_epoch <= 500);
    }

    #[test]
    fn serialize_then_blend_is_identity_at_blend_zero() {
        let backend = ScalarBackend::new(10_000);
        let a = backend.allocate_network(&config()).unwrap();
        let b = backend.allocate_network(&config()).unwrap();
        let before = backend.forward(a, &[0.3, 0.7]).unwrap();
        let bytes = backend.serialize(b).unwrap();
        backend.deserialize_into(a, &bytes, 0.0).unwrap();
        let after = backend.forward(a, &[0.3, 0.7]).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn blend_rejects_out_of_range() {
        let backend = ScalarBackend::new(10_000);
        let a = backend.allocate_network(&config()).unwrap();
        let bytes = backend.serialize(a).unwrap();
        assert!(backend.deserialize_into(a, &bytes, 1.5).is_err());
    }
}
