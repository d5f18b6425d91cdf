use crate::event_repo::EventRepo;
use cw_core::error::{CallwatchError, StoreError};
use cw_core::store::Store;
use rusqlite::Connection;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Store for DbStore {
    type Events<'a>
        = EventRepo<'a>
    where
        Self: 'a;

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, CallwatchError>
    where
        F: FnOnce(&Self) -> Result<T, CallwatchError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE").map_err(|err| {
            CallwatchError::Store(StoreError::Unavailable {
                message: err.to_string(),
            })
        })?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(|err| {
                    CallwatchError::Store(StoreError::Unavailable {
                        message: err.to_string(),
                    })
                })?;
                Ok(value)
            }
            Err(err) => {
                self.conn.execute_batch("ROLLBACK").map_err(|rollback_err| {
                    CallwatchError::Store(StoreError::Unavailable {
                        message: rollback_err.to_string(),
                    })
                })?;
                Err(err)
            }
        }
    }
}
