// modelfs-api: Async Rust client for the modelfs console API (REST + SSE)

pub mod client;
pub mod error;
pub mod sse;
pub mod transport;
pub mod types;

pub use client::Client;
pub use error::Error;
pub use sse::{EventChannelHandle, ReconnectConfig};
pub use transport::{TlsMode, TransportConfig};
