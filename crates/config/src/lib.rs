// Configuration loading

pub mod settings;

pub use settings::{ConfigError, ControllerSettings, DEFAULT_MAX_HISTORY};
