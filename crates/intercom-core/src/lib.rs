pub mod config;
pub mod constants;
pub mod error;

pub use config::{ControlSettings, MqttSettings, Settings};
pub use error::{Error, Result};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
