//! # Neuromesh P2P
//!
//! Transport layer for the mesh: peer sessions over an in-process network,
//! heartbeat liveness, and dispatch of the wire envelopes defined in
//! `neuromesh-protocol` to the subsystem that owns each [`MessageKind`].
//!
//! ```
//! use neuromesh_p2p::{sink::NullSink, InProcessNetwork, Transport, TransportConfig};
//! use neuromesh_identity::Keypair;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let network = InProcessNetwork::new();
//! let keypair = Keypair::generate();
//! let (transport, inbox, _events) = Transport::new(
//!     keypair,
//!     TransportConfig::default(),
//!     network,
//!     vec!["inference".to_string()],
//!     Arc::new(NullSink),
//! );
//! transport.run(inbox);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod dedup;
mod error;
mod events;
mod network;
mod peer;
pub mod sink;
mod transport;

pub use config::TransportConfig;
pub use connection::{Connection, ConnectionState};
pub use error::{P2pError, Result};
pub use events::TransportEvent;
pub use network::InProcessNetwork;
pub use peer::Peer;
pub use sink::MessageSink;
pub use transport::Transport;
