//! User-settable consumer settings, persisted between runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::stepcast_dir;
use crate::schema::DEFAULT_PORT;

/// Settings the consumer user can change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerSettings {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl ConsumerSettings {
    pub fn default_path() -> PathBuf {
        stepcast_dir().join("consumer.toml")
    }

    /// Load saved settings; a missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str::<Self>(&content).ok())
            .map(Self::sanitized)
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    /// Port 0 is never a usable client port.
    fn sanitized(self) -> Self {
        if self.port == 0 {
            Self::default()
        } else {
            self
        }
    }
}
