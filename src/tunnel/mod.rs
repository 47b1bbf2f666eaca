pub mod control;
pub mod manager;
pub mod status;

pub use control::TunnelControl;
pub use manager::{ProfileListing, TunnelManager};
pub use status::TunnelStatus;
