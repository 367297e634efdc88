//! Provider configuration.
//!
//! The configuration block is deserialized from the JSON handed to
//! `configure`; every field left empty falls back to a `JUNOS_*` environment
//! variable and then to a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Default NETCONF port.
pub const DEFAULT_PORT: u16 = 830;
/// Default login.
pub const DEFAULT_USERNAME: &str = "netconf";
/// Default pause between commands, in milliseconds.
pub const DEFAULT_SLEEP_SHORT_MS: u64 = 100;
/// Default pause between two lock attempts, in seconds.
pub const DEFAULT_SLEEP_LOCK_SECS: u64 = 10;
/// Default upper bound on waiting for the lock, in seconds.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 600;

/// Settings for reaching the device and for the lifecycle engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Device address.
    pub ip: String,
    /// NETCONF port.
    pub port: Option<u16>,
    /// Login.
    pub username: String,
    /// Password.
    #[serde(skip_serializing)]
    pub password: String,
    /// SSH private key file.
    pub sshkey_file: String,
    /// Passphrase of the private key.
    #[serde(skip_serializing)]
    pub keypass: String,
    /// Pause between commands, in milliseconds. Applied by the transport
    /// sessions built from this configuration.
    pub cmd_sleep_short: Option<u64>,
    /// Pause between two lock attempts, in seconds.
    pub cmd_sleep_lock: Option<u64>,
    /// Upper bound on waiting for the lock, in seconds.
    pub lock_timeout: Option<u64>,
    /// Write debug logs to this file.
    pub file_debug: String,
    /// Append rendered lines to this file instead of creating on the device.
    pub fake_create_with_setfile: String,
    /// Also route updates to the set file.
    pub fake_update_also: bool,
    /// Also route deletes to the set file.
    pub fake_delete_also: bool,
}

impl ProviderConfig {
    /// Parse the configuration JSON and apply environment fallbacks.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProviderError> {
        let config = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value)?
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Fill empty fields from `lookup` (the environment in production).
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |field: &mut String, key: &str| {
            if field.is_empty() {
                if let Some(v) = lookup(key) {
                    *field = v;
                }
            }
        };
        text(&mut self.ip, "JUNOS_HOST");
        text(&mut self.username, "JUNOS_USERNAME");
        text(&mut self.password, "JUNOS_PASSWORD");
        text(&mut self.sshkey_file, "JUNOS_KEYFILE");
        text(&mut self.keypass, "JUNOS_KEYPASS");
        text(&mut self.file_debug, "JUNOS_FILE_DEBUG");
        text(&mut self.fake_create_with_setfile, "JUNOS_FAKECREATE_SETFILE");

        if self.port.is_none() {
            self.port = env_number(&lookup, "JUNOS_PORT")?;
        }
        if self.cmd_sleep_short.is_none() {
            self.cmd_sleep_short = env_number(&lookup, "JUNOS_SLEEP_SHORT")?;
        }
        if self.cmd_sleep_lock.is_none() {
            self.cmd_sleep_lock = env_number(&lookup, "JUNOS_SLEEP_LOCK")?;
        }
        if !self.fake_update_also {
            self.fake_update_also = env_flag(&lookup, "JUNOS_FAKEUPDATE_ALSO");
        }
        if !self.fake_delete_also {
            self.fake_delete_also = env_flag(&lookup, "JUNOS_FAKEDELETE_ALSO");
        }
        if self.username.is_empty() {
            self.username = DEFAULT_USERNAME.to_string();
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ProviderError> {
        if self.fake_create_with_setfile.is_empty() {
            if self.fake_update_also {
                return Err(ProviderError::Configuration(
                    "fake_update_also requires fake_create_with_setfile".to_string(),
                ));
            }
            if self.fake_delete_also {
                return Err(ProviderError::Configuration(
                    "fake_delete_also requires fake_create_with_setfile".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// NETCONF port with the default applied.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Pause between commands.
    pub fn sleep_short(&self) -> Duration {
        Duration::from_millis(self.cmd_sleep_short.unwrap_or(DEFAULT_SLEEP_SHORT_MS))
    }

    /// Pause between two lock attempts.
    pub fn sleep_lock(&self) -> Duration {
        Duration::from_secs(self.cmd_sleep_lock.unwrap_or(DEFAULT_SLEEP_LOCK_SECS))
    }

    /// Upper bound on waiting for the lock.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout.unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS))
    }

    /// Set file for create, if set-file mode is on.
    pub fn setfile(&self) -> Option<PathBuf> {
        (!self.fake_create_with_setfile.is_empty())
            .then(|| PathBuf::from(&self.fake_create_with_setfile))
    }

    /// Schema of the provider configuration block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute("ip", Attribute::optional_string())
            .with_attribute("port", Attribute::optional_int64().with_int_range(1, 65535))
            .with_attribute("username", Attribute::optional_string())
            .with_attribute("password", Attribute::optional_string().sensitive())
            .with_attribute("sshkey_file", Attribute::optional_string())
            .with_attribute("keypass", Attribute::optional_string().sensitive())
            .with_attribute("cmd_sleep_short", Attribute::optional_int64().with_int_range(0, 60_000))
            .with_attribute("cmd_sleep_lock", Attribute::optional_int64().with_int_range(0, 600))
            .with_attribute("lock_timeout", Attribute::optional_int64().with_int_range(1, 86_400))
            .with_attribute("file_debug", Attribute::optional_string())
            .with_attribute("fake_create_with_setfile", Attribute::optional_string())
            .with_attribute("fake_update_also", Attribute::optional_bool())
            .with_attribute("fake_delete_also", Attribute::optional_bool())
    }
}

fn env_number<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ProviderError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ProviderError::Configuration(format!("{} must be a number, got '{}'", key, raw))
        }),
    }
}

fn env_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).is_some_and(|v| matches!(v.trim(), "true" | "1" | "yes"))
}
