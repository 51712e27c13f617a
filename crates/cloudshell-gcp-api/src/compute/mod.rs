// Compute Engine v1 client.
//
// Hand-crafted async HTTP client for the global firewall and global
// operation endpoints. Auth is an OAuth2 bearer token.

pub mod client;
pub mod types;

pub use client::ComputeClient;
