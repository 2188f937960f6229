//! Live viewer plumbing: connection state, the broadcast hub, and the
//! per-viewer session loop.

pub mod broadcast;
pub mod connection;
pub mod session;

pub use broadcast::{BroadcastHub, FanOutReport};
pub use connection::{DeliveryError, Frame, ViewerConnection, ViewerState};
pub use session::{SessionDeps, run_viewer_session};
