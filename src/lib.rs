pub mod config;
pub mod format;
pub mod logging;
pub mod monitor;
pub mod sink;
pub mod system;
