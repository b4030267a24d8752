//! Configuration management for the nsguard CLI
//!
//! Values are layered: `conf/nsguard.yml` (optional), then `NSGUARD_*`
//! environment variables, then command line flags.

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use nsguard_client::PortalClientConfig;
use nsguard_common::{DEFAULT_EVENT_CAPACITY, DEFAULT_RELOAD_DELAY_MS, Env};
use nsguard_core::GuardConfig;

use crate::logging::LoggingConfig;

pub const DEFAULT_CONFIG_FILE: &str = "conf/nsguard.yml";

pub const PORTAL_ADDRS: &str = "portal.addrs";
pub const PORTAL_TOKEN: &str = "portal.token";
pub const PORTAL_CONTEXT_PATH: &str = "portal.context_path";
pub const PORTAL_CONNECT_TIMEOUT_MS: &str = "portal.connect_timeout_ms";
pub const PORTAL_READ_TIMEOUT_MS: &str = "portal.read_timeout_ms";
pub const GUARD_RELOAD_DELAY_MS: &str = "guard.reload_delay_ms";
pub const GUARD_EVENT_CAPACITY: &str = "guard.event_capacity";
pub const LOG_LEVEL: &str = "log.level";
pub const LOG_DIR: &str = "log.dir";
pub const LOG_CONSOLE: &str = "log.console";
pub const LOG_FILE: &str = "log.file";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "nsguard", version, about = "Guarded deletion of configuration namespaces")]
pub struct Cli {
    /// Configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,
    /// Portal addresses, comma separated
    #[arg(long = "portal")]
    pub portal: Option<String>,
    /// Portal access token
    #[arg(long = "token", env = "NSGUARD_PORTAL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[arg(long = "log-level")]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check and delete a namespace
    Delete(DeleteArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    #[arg(short = 'a', long = "app")]
    pub app: String,
    /// Environment: LOCAL, DEV, FAT (FWS), UAT, LPT, PRO (PROD) or TOOLS
    #[arg(short = 'e', long = "env")]
    pub env: Env,
    #[arg(long = "cluster", default_value = "default")]
    pub cluster: String,
    #[arg(short = 'n', long = "namespace")]
    pub namespace: String,
    /// Answer yes to every question
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

/// Application configuration loaded from the config file and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name(&cli.config).required(false))
            .add_source(
                Environment::with_prefix("nsguard")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = &cli.portal {
            builder = builder.set_override(PORTAL_ADDRS, v.as_str())?;
        }
        if let Some(v) = &cli.token {
            builder = builder.set_override(PORTAL_TOKEN, v.as_str())?;
        }
        if let Some(v) = &cli.log_level {
            builder = builder.set_override(LOG_LEVEL, v.as_str())?;
        }

        Ok(Configuration {
            config: builder.build()?,
        })
    }

    // ========================================================================
    // Portal Configuration
    // ========================================================================

    /// Portal addresses, given either as a list or a comma separated string
    pub fn portal_addrs(&self) -> Vec<String> {
        if let Ok(addrs) = self.config.get::<Vec<String>>(PORTAL_ADDRS) {
            return addrs;
        }
        match self.config.get_string(PORTAL_ADDRS) {
            Ok(addrs) => addrs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => PortalClientConfig::default().server_addrs,
        }
    }

    pub fn portal_token(&self) -> Option<String> {
        self.config
            .get_string(PORTAL_TOKEN)
            .ok()
            .filter(|t| !t.is_empty())
    }

    pub fn portal_client_config(&self) -> PortalClientConfig {
        let defaults = PortalClientConfig::default();
        PortalClientConfig {
            server_addrs: self.portal_addrs(),
            access_token: self.portal_token(),
            connect_timeout_ms: self
                .unsigned(PORTAL_CONNECT_TIMEOUT_MS)
                .unwrap_or(defaults.connect_timeout_ms),
            read_timeout_ms: self
                .unsigned(PORTAL_READ_TIMEOUT_MS)
                .unwrap_or(defaults.read_timeout_ms),
            context_path: self
                .config
                .get_string(PORTAL_CONTEXT_PATH)
                .unwrap_or(defaults.context_path),
        }
    }

    // ========================================================================
    // Guard Configuration
    // ========================================================================

    pub fn guard_config(&self) -> GuardConfig {
        GuardConfig::default()
            .with_reload_delay(
                self.unsigned(GUARD_RELOAD_DELAY_MS)
                    .unwrap_or(DEFAULT_RELOAD_DELAY_MS),
            )
            .with_event_capacity(
                self.unsigned(GUARD_EVENT_CAPACITY)
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(DEFAULT_EVENT_CAPACITY)
                    .max(1),
            )
    }

    /// Read a non-negative integer; negative or malformed values are ignored
    fn unsigned(&self, key: &str) -> Option<u64> {
        match self.config.get_int(key) {
            Ok(v) => match u64::try_from(v) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(key, value = v, "Ignoring negative configuration value");
                    None
                }
            },
            Err(_) => None,
        }
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        let defaults = LoggingConfig::from_env();
        LoggingConfig::from_config(
            self.config.get_string(LOG_DIR).ok(),
            self.config
                .get_bool(LOG_CONSOLE)
                .unwrap_or(defaults.console_output),
            self.config.get_bool(LOG_FILE).unwrap_or(defaults.file_logging),
            self.config
                .get_string(LOG_LEVEL)
                .unwrap_or_else(|_| defaults.level.to_string()),
        )
    }
}
