//! Delivery of approved configs to network devices.
//!
//! The gateway is a boolean boundary: every failure during a device
//! session is logged and reported as `false`, never raised.

pub mod command;
pub mod rules;

use async_trait::async_trait;

pub use command::{CommandPushGateway, PushConfig};
pub use rules::{DeviceType, classify};

/// The device a config is pushed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub device_ip: String,
    pub device_name: String,
    pub vendor: String,
    pub model: String,
}

impl PushTarget {
    pub fn device_type(&self) -> DeviceType {
        classify(&self.vendor, &self.model)
    }
}

/// Management-session credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&PushConfig> for Credentials {
    fn from(config: &PushConfig) -> Self {
        Self {
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
        }
    }
}

/// Sends configuration lines to a device.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Returns `true` only when the device accepted the config.
    async fn push(&self, target: &PushTarget, credentials: &Credentials, config_text: &str) -> bool;
}
