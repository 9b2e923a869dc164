//! Runtime configuration.
//!
//! Everything the controller paces or counts is overridable from a TOML
//! file; the defaults reproduce the production station setup (13 boards,
//! 80 kB memory window, one command per minute). Chat credentials can also
//! come from the environment so they stay out of committed config files.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment override for the Telegram bot token.
pub const ENV_TELEGRAM_TOKEN: &str = "SCANBENCH_TELEGRAM_TOKEN";
/// Environment override for the Telegram destination chat.
pub const ENV_TELEGRAM_CHAT_ID: &str = "SCANBENCH_TELEGRAM_CHAT_ID";

/// Station endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Base URL of the station HTTP service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8123".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Telegram notification settings. With no token or chat id configured the
/// process falls back to log-only notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Publish timeout in seconds; bounds how long one notification may
    /// stall the scan schedule.
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notify_timeout_secs() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            chat_id: None,
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Both halves of the credential, when configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Board chain expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardsConfig {
    /// Number of boards the chain must enumerate before scanning starts.
    #[serde(default = "default_expected_boards")]
    pub expected: u32,
    /// Highest slot eligible for write-invert commands. Defaults to the
    /// lower half of the chain when unset.
    #[serde(default)]
    pub write_enabled_max: Option<u32>,
}

fn default_expected_boards() -> u32 {
    13
}

impl Default for BoardsConfig {
    fn default() -> Self {
        Self {
            expected: default_expected_boards(),
            write_enabled_max: None,
        }
    }
}

impl BoardsConfig {
    pub fn write_enabled_max(&self) -> u32 {
        self.write_enabled_max.unwrap_or(self.expected / 2)
    }
}

/// Memory address windows for the two scan phases.
///
/// The boards expose an 80 kB region. Reads cover all of it; writes keep a
/// margin at both ends so reserved values are never inverted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_read_start")]
    pub read_start: u32,
    #[serde(default = "default_read_end")]
    pub read_end: u32,
    #[serde(default = "default_write_start")]
    pub write_start: u32,
    #[serde(default = "default_write_end")]
    pub write_end: u32,
    /// Address increment between consecutive commands, in bytes.
    #[serde(default = "default_step")]
    pub step: u32,
}

fn default_read_start() -> u32 {
    0x0000
}

fn default_read_end() -> u32 {
    0x14000
}

fn default_write_start() -> u32 {
    0x1000
}

fn default_write_end() -> u32 {
    0x13400
}

fn default_step() -> u32 {
    512
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            read_start: default_read_start(),
            read_end: default_read_end(),
            write_start: default_write_start(),
            write_end: default_write_end(),
            step: default_step(),
        }
    }
}

/// Pacing for every wait the controller performs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait between consecutive memory commands.
    #[serde(default = "default_cmd_wait_secs")]
    pub cmd_wait_secs: u64,
    /// Wait after power-off, letting the chain fully de-energize.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Wait after power-on before touching the station again.
    #[serde(default = "default_power_settle_secs")]
    pub power_settle_secs: u64,
    /// Wait between port registration and the port listing.
    #[serde(default = "default_port_settle_secs")]
    pub port_settle_secs: u64,
    /// Wait between the port listing and device registration.
    #[serde(default = "default_register_settle_secs")]
    pub register_settle_secs: u64,
    /// Wait between device registration and the device-map fetch.
    #[serde(default = "default_device_settle_secs")]
    pub device_settle_secs: u64,
}

fn default_cmd_wait_secs() -> u64 {
    60
}

fn default_cooldown_secs() -> u64 {
    5 * 60
}

fn default_power_settle_secs() -> u64 {
    10
}

fn default_port_settle_secs() -> u64 {
    1
}

fn default_register_settle_secs() -> u64 {
    5
}

fn default_device_settle_secs() -> u64 {
    30
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cmd_wait_secs: default_cmd_wait_secs(),
            cooldown_secs: default_cooldown_secs(),
            power_settle_secs: default_power_settle_secs(),
            port_settle_secs: default_port_settle_secs(),
            register_settle_secs: default_register_settle_secs(),
            device_settle_secs: default_device_settle_secs(),
        }
    }
}

impl TimingConfig {
    pub fn cmd_wait(&self) -> Duration {
        Duration::from_secs(self.cmd_wait_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn power_settle(&self) -> Duration {
        Duration::from_secs(self.power_settle_secs)
    }

    pub fn port_settle(&self) -> Duration {
        Duration::from_secs(self.port_settle_secs)
    }

    pub fn register_settle(&self) -> Duration {
        Duration::from_secs(self.register_settle_secs)
    }

    pub fn device_settle(&self) -> Duration {
        Duration::from_secs(self.device_settle_secs)
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub boards: BoardsConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read configuration from a file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file '{path}'"))?;
        Self::from_toml(&content)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("cannot serialize configuration")
    }

    /// Pull chat credentials from the environment, overriding file values.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = Some(token);
        }
        if let Ok(chat_id) = std::env::var(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    /// Reject configurations the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.boards.expected == 0 {
            bail!("boards.expected must be at least 1");
        }
        if self.boards.write_enabled_max() > self.boards.expected {
            bail!(
                "boards.write_enabled_max ({}) exceeds boards.expected ({})",
                self.boards.write_enabled_max(),
                self.boards.expected
            );
        }
        if self.scan.step == 0 {
            bail!("scan.step must be non-zero");
        }
        if self.scan.read_start >= self.scan.read_end {
            bail!(
                "empty read window: 0x{:x}..0x{:x}",
                self.scan.read_start,
                self.scan.read_end
            );
        }
        if self.scan.write_start >= self.scan.write_end {
            bail!(
                "empty write window: 0x{:x}..0x{:x}",
                self.scan.write_start,
                self.scan.write_end
            );
        }
        // Misaligned windows would let the scheduler step past the end
        // bound and touch addresses outside the protected region.
        if (self.scan.read_end - self.scan.read_start) % self.scan.step != 0 {
            bail!(
                "read window 0x{:x}..0x{:x} is not a multiple of step {}",
                self.scan.read_start,
                self.scan.read_end,
                self.scan.step
            );
        }
        if (self.scan.write_end - self.scan.write_start) % self.scan.step != 0 {
            bail!(
                "write window 0x{:x}..0x{:x} is not a multiple of step {}",
                self.scan.write_start,
                self.scan.write_end,
                self.scan.step
            );
        }
        Ok(())
    }
}
