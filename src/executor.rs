use thiserror::Error as ThisError;

use crate::command::Command;
use crate::response::Response;
use crate::store::{Cache, CacheItem, Store};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ExecuteError {
    #[error("item not found, key={0}")]
    NotFound(String),
    #[error("invalid command received")]
    InvalidCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{0}")]
    Store(String),
}

pub trait Execute {
    fn execute(&self, cmd: Command) -> Response;
}

/// The one production executor: commands either touch the cache (`get`,
/// `set`) or produce a fixed reply (`ping`, `echo`). Everything else is
/// rejected with an error response; execution never tears down a connection.
#[derive(Clone)]
pub struct StoreExecutor<C = Store> {
    cache: C,
}

impl<C: Cache> StoreExecutor<C> {
    pub fn new(cache: C) -> StoreExecutor<C> {
        StoreExecutor { cache }
    }
}

impl<C: Cache> Execute for StoreExecutor<C> {
    fn execute(&self, cmd: Command) -> Response {
        match cmd {
            Command::Get(get) => match self.cache.get(&get.key) {
                Some(item) => Response::item(item),
                None => Response::error(ExecuteError::NotFound(get.key)),
            },
            Command::Set(set) => {
                let item = CacheItem {
                    key: set.key.clone(),
                    value: set.value,
                    data_type: set.data_type,
                };
                match self.cache.set(set.key, item) {
                    Ok(()) => Response::ok(),
                    Err(e) => Response::error(ExecuteError::Store(e.to_string())),
                }
            }
            Command::Ping => Response::item(CacheItem::bulk("ping", "PONG")),
            Command::Echo(echo) => Response::item(CacheItem::bulk("echo", echo.value)),
            Command::Unknown(name) => Response::error(ExecuteError::UnknownCommand(name)),
            Command::Exit | Command::Invalid => Response::error(ExecuteError::InvalidCommand),
        }
    }
}
