pub mod signal;
pub mod summary;
pub mod trend;
