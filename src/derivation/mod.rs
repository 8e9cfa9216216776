pub mod blob_source;
pub mod error;
pub mod system_config;
pub mod types;
