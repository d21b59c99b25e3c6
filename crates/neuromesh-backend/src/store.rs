//! Handle allocation and the arena capacity bound, shared by every backend
//! strategy so `ScalarBackend` and `SimdBackend` account against the same pool.

use crate::config::NetworkConfig;
use crate::error::{BackendError, Result};
use crate::network::Network;
use neuromesh_core::HandleId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque reference to an allocated network. Stable for the lifetime
/// between `allocate_network` and `release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkHandle(HandleId);

impl NetworkHandle {
    fn new() -> Self {
        Self(HandleId::generate())
    }
}

impl std::fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns every allocated `Network`, bounded by a total element-count arena.
pub(crate) struct NetworkStore {
    capacity_elements: usize,
    used_elements: AtomicUsize,
    networks: RwLock<HashMap<NetworkHandle, Network>>,
}

impl NetworkStore {
    pub(crate) fn new(capacity_elements: usize) -> Self {
        Self {
            capacity_elements,
            used_elements: AtomicUsize::new(0),
            networks: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn allocate(&self, config: &NetworkConfig) -> Result<NetworkHandle> {
        config.validate()?;
        let needed = config.element_count();
        loop {
            let used = self.used_elements.load(Ordering::Acquire);
            let available = self.capacity_elements.saturating_sub(used);
            if needed > available {
                return Err(BackendError::OutOfCapacity {
                    requested: needed,
                    available,
                });
            }
            if self
                .used_elements
                .compare_exchange(
                    used,
                    used + needed,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                break;
            }
        }

        let handle = NetworkHandle::new();
        self.networks
            .write()
            .insert(handle, Network::allocate(config));
        Ok(handle)
    }

    pub(crate) fn release(&self, handle: NetworkHandle) -> Result<()> {
        let network = self
            .networks
            .write()
            .remove(&handle)
            .ok_or(BackendError::Invalid)?;
        let freed = network.layer_sizes.windows(2).map(|w| w[0] * w[1] + w[1]).sum();
        self.used_elements.fetch_sub(freed, Ordering::AcqRel);
        Ok(())
    }

    pub(crate) fn with_network<R>(
        &self,
        handle: NetworkHandle,
        f: impl FnOnce(&Network) -> R,
    ) -> Result<R> {
        let guard = self.networks.read();
        let network = guard.get(&handle).ok_or(BackendError::Invalid)?;
        Ok(f(network))
    }

    pub(crate) fn with_network_mut<R>(
        &self,
        handle: NetworkHandle,
        f: impl FnOnce(&mut Network) -> R,
    ) -> Result<R> {
        let mut guard = self.networks.write();
        let network = guard.get_mut(&handle).ok_or(BackendError::Invalid)?;
        Ok(f(network))
    }
}
