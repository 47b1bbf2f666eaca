// Auxiliary durable state: small JSON side-files, each read-tolerant of
// absence or corruption and written through on every mutation.

pub mod favorites;
pub mod history;
pub mod names;

pub use favorites::Favorites;
pub use history::{HistoryAction, HistoryEntry, HistoryLog, HISTORY_CAP};
pub use names::CustomNames;
