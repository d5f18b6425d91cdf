use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("transport error: {message}")]
    Transport { message: String },
    #[error("cache error: {message}")]
    Cache { message: String },
    #[error("invalid config: {message}")]
    Config { message: String },
}
