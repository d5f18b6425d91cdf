use crate::error::CallwatchError;
use crate::events::EventRepository;

pub trait Store {
    type Events<'a>: EventRepository
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, CallwatchError>
    where
        F: FnOnce(&Self) -> Result<T, CallwatchError>;
}
