//! # stepcast Config
//!
//! Configuration for the relay, bridge, consumer and observer.

mod error;
mod loader;
mod schema;
mod settings;
mod validator;

pub use error::ConfigError;
pub use loader::{stepcast_dir, ConfigLoader, PORT_ENV_VAR};
pub use schema::*;
pub use settings::ConsumerSettings;
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
