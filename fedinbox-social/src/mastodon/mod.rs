//! Mastodon API integration surface exposed to the gateway and the client.
//!
//! Submodules provide the HTTP client wrapper, the upstream trait the gateway
//! depends on, and typed models for the bits of a status the inbox renders.
pub mod client;
pub mod types;
pub mod upstream;

pub use client::MastodonApi;
pub use types::{Account, Status};
pub use upstream::{TimelineUpstream, UpstreamError};
