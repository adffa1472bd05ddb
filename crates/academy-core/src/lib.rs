pub mod config;
pub mod envelope;
pub mod error;
pub mod io;
pub mod paths;
pub mod progress;
pub mod storage;
pub mod types;

pub use config::{ClientConfig, RetrySettings};
pub use error::{CoreError, Result};
pub use storage::{SessionStorage, StorageKey};
