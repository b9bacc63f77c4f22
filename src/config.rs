use clap::Parser;
use once_cell::sync::Lazy;
use std::time::Duration;
use validator::Validate;

use crate::common::UserId;
use crate::errors::Error;

pub static APP_CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    Config::parse()
});

#[derive(Debug, Parser)]
pub struct Config {
    #[clap(long, env)]
    pub api_base_url: String,

    #[clap(long, env)]
    pub access_token: Option<String>,

    #[clap(long, env, default_value_t = 0)]
    pub user_id: u64,

    #[clap(long, env, default_value = "info")]
    pub log_level: String,

    #[clap(long, env, default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[clap(long, env, default_value_t = 500)]
    pub reconnect_base_delay_ms: u64,

    #[clap(long, env, default_value_t = 30_000)]
    pub reconnect_max_delay_ms: u64,

    #[clap(long, env, default_value = "local")]
    pub app_env: String,
}

impl Config {
    pub fn user(&self) -> UserId {
        UserId(self.user_id)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            request_timeout_secs: self.request_timeout_secs,
            reconnect_base_delay_ms: self.reconnect_base_delay_ms,
            reconnect_max_delay_ms: self.reconnect_max_delay_ms,
        }
    }
}

/// Timing knobs shared by the HTTP client and the push channel.
///
/// Reconnect delays grow as `base * 2^n` and are capped at the max delay.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct SyncConfig {
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    #[validate(range(min = 1))]
    pub reconnect_base_delay_ms: u64,

    #[validate(range(min = 1))]
    pub reconnect_max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            reconnect_base_delay_ms: 500,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

impl SyncConfig {
    pub fn validated(self) -> Result<Self, Error> {
        self.validate()?;
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "reconnect_max_delay_ms ({}) is below reconnect_base_delay_ms ({})",
                self.reconnect_max_delay_ms, self.reconnect_base_delay_ms
            )));
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_max_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_delay_ms)
    }
}
