//! Combined health snapshot: Agent Manager metrics plus whatever mesh-wide
//! telemetry the caller (typically `neuromesh-node`, which alone drives
//! Topology) chooses to pass in.

use neuromesh_agent::ManagerMetrics;
use neuromesh_consensus::EngineState;
use neuromesh_topology::MeshMetrics;
use serde::Serialize;

/// A point-in-time health snapshot combining local agent health with
/// optional mesh and consensus telemetry.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// The Agent Manager's own metrics.
    pub agents: ManagerMetrics,
    /// Mesh-wide connectivity metrics, if the caller supplied a `Topology`
    /// snapshot (this crate does not own one itself).
    pub mesh: Option<MeshMetrics>,
    /// The consensus engine's current state, if consensus is enabled.
    pub consensus_state: Option<String>,
    /// The latest finalized block height, if consensus is enabled.
    pub consensus_height: Option<u64>,
    /// Composite score in `[0, 100]`: the mean of `agents.health_score` and
    /// `mesh.network_health` (when present).
    pub overall: u8,
}

impl HealthSnapshot {
    pub(crate) fn new(
        agents: ManagerMetrics,
        mesh: Option<MeshMetrics>,
        consensus_state: Option<EngineState>,
        consensus_height: Option<u64>,
    ) -> Self {
        let consensus_state = consensus_state.map(|state| format!("{state:?}"));
        let overall = match mesh {
            Some(mesh) => ((f64::from(agents.health_score) + mesh.network_health) / 2.0) as u8,
            None => agents.health_score,
        };
        Self {
            agents,
            mesh,
            consensus_state,
            consensus_height,
            overall,
        }
    }
}
