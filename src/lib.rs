pub mod cli;
pub mod config;
pub mod error;
pub mod geoip;
pub mod handlers;
pub mod logging;
pub mod profile;
pub mod state;
pub mod tunnel;

pub use error::{AppError, Result};
