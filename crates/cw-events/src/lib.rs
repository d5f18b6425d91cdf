pub mod bus;
pub mod normalize;
pub mod types;

pub use crate::normalize::{normalize, NormalizeError};
pub use crate::types::{DtmfAction, EventKind, EventRecord, EventSource};
