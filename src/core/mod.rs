pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod pipeline;
pub mod signal;
pub mod source;
pub mod trend;
pub mod window;
