pub mod backend;
pub mod http;

pub use crate::backend::{
    CallDirection, CallProvider, CallRecord, ProviderError, TimeWindow, UnconfiguredProvider,
};
pub use crate::http::HttpCallProvider;
