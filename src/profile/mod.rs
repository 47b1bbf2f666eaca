pub mod policy;
pub mod store;

pub use store::{ProfileStore, StoredProfile};
