//! Configuration validation.

use stepcast_protocols::relay_url_problem;

use crate::schema::{Config, DeliveryPolicy};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_relay(config, &mut result);
        Self::validate_bridge(config, &mut result);
        Self::validate_consumer(config, &mut result);

        result
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        if config.relay.host.is_empty() {
            result.add_error(ValidationError::new("relay.host", "Host cannot be empty"));
        }
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        let url = &config.bridge.url;
        if let Some(reason) = relay_url_problem(url) {
            result.add_error(ValidationError::new(
                "bridge.url",
                format!("'{}' is not a relay URL: {}", url, reason),
            ));
        }

        if let DeliveryPolicy::Queue { capacity: 0 } = config.bridge.delivery {
            result.add_error(ValidationError::new(
                "bridge.delivery",
                "Queue capacity must be greater than 0",
            ));
        }
    }

    fn validate_consumer(config: &Config, result: &mut ValidationResult) {
        if config.consumer.port == 0 {
            result.add_error(ValidationError::new("consumer.port", "Port cannot be 0"));
        } else if let Some(reason) = relay_url_problem(&config.consumer.url()) {
            result.add_error(ValidationError::new(
                "consumer.host",
                format!("'{}' does not form a relay URL: {}", config.consumer.host, reason),
            ));
        }

        if config.consumer.dedup_capacity == 0 {
            result.add_error(ValidationError::new(
                "consumer.dedup_capacity",
                "Dedup capacity must be greater than 0",
            ));
        }
    }
}
