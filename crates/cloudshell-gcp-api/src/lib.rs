// cloudshell-gcp-api: Async Rust client for the Compute Engine v1 REST API
//
// Only the surface the sandbox driver needs is covered: global firewall
// rules and the global operations that track their creation and deletion.

pub mod compute;
pub mod error;
pub mod transport;

pub use compute::ComputeClient;
pub use compute::types::{
    Firewall, FirewallList, Lookup, Operation, OperationError, OperationErrorEntry,
    OperationStatus, PortRule,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
