// NetTune Core - Domain Logic & Ports
// NO infrastructure dependencies: process spawning, HTTP and sysinfo live in adapters

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use config::Settings;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
