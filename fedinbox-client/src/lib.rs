//! Inbox core: everything the terminal front-end needs except drawing.
//!
//! - [`store`]: locally persisted archived/favorited id sets
//! - [`render`]: turns fetched posts plus local state into an [`InboxView`]
//! - [`favorite`]: per-post favorite toggle state machine
//! - [`share`]: tag stripping and attribution for re-sharing a post
//! - [`gateway`]: HTTP client for the timeline gateway
//! - [`inbox`]: the controller tying the pieces together
pub mod error;
pub mod favorite;
pub mod gateway;
pub mod inbox;
pub mod render;
pub mod share;
pub mod store;

pub use error::ClientError;
pub use favorite::{FavoriteAction, FavoriteControl, FavoriteState};
pub use gateway::{GatewayClient, TimelineGateway};
pub use inbox::{Inbox, Notice, NoticeKind};
pub use render::{InboxView, PostCard, render};
pub use store::{ClientStore, FileStore, KeyValueStore, MemoryStore, StoreError};
