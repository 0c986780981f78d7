pub mod cache_cmd;
pub mod config_cmd;
pub mod output;
pub mod overview_cmd;
pub mod renderer;
pub mod signals_cmd;
