pub mod app_config;
pub mod events;

pub use app_config::{BusinessRules, Config};
pub use config::ConfigError;
pub use events::EventProducer;
