pub mod environment;

pub use environment::{ApiConfig, EnvironmentConfig, StorageConfig};
