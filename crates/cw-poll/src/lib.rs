pub mod cache;
pub mod config;
pub mod error;
pub mod poller;

pub use crate::cache::CachedView;
pub use crate::config::WatchConfig;
pub use crate::error::PollError;
pub use crate::poller::{PollOutcome, Poller, PollerView};
