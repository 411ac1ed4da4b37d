pub mod config_loader;
pub mod constants;
pub mod logging;

pub use config_loader::{ConfigSection, LoadConfigError};
pub use constants::*;
pub use logging::init_tracing;
