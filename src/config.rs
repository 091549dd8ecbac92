//! Environment-specific settings for a harness run.
//!
//! Values are layered: built-in defaults for the public demo storefront, then an
//! optional JSON file named by `STOREFRONT_CONFIG`, then `STOREFRONT_*`
//! environment variables. The result is resolved once per process.

use crate::error::{HarnessError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable naming an optional JSON config file
pub const CONFIG_FILE_ENV: &str = "STOREFRONT_CONFIG";

const ENV_USER_NAME: &str = "STOREFRONT_USER_NAME";
const ENV_PASSWORD: &str = "STOREFRONT_PASSWORD";
const ENV_HOME_URL: &str = "STOREFRONT_HOME_URL";
const ENV_INVENTORY_URL: &str = "STOREFRONT_INVENTORY_URL";
const ENV_ELEMENT_TIMEOUT_MS: &str = "STOREFRONT_ELEMENT_TIMEOUT_MS";
const ENV_POLL_INTERVAL_MS: &str = "STOREFRONT_POLL_INTERVAL_MS";
const ENV_HEADLESS: &str = "STOREFRONT_HEADLESS";
const ENV_NO_SANDBOX: &str = "STOREFRONT_NO_SANDBOX";
const ENV_CHROME_PATH: &str = "STOREFRONT_CHROME_PATH";
const ENV_SCREENSHOT_DIR: &str = "STOREFRONT_SCREENSHOT_DIR";
const ENV_DEBUG_PORT: &str = "STOREFRONT_DEBUG_PORT";

const DEFAULT_HOME_URL: &str = "https://www.saucedemo.com/";
const DEFAULT_INVENTORY_URL: &str = "https://www.saucedemo.com/inventory.html";
const DEFAULT_USER_NAME: &str = "standard_user";
const DEFAULT_PASSWORD: &str = "secret_sauce";
pub const DEFAULT_ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

static GLOBAL: OnceLock<AppConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Account name the "valid e-mail" step enters
    pub user_name: String,
    /// Password the "valid password" step enters
    pub password: String,
    pub home_page_url: String,
    /// URL a successful login must land on
    pub inventory_page_url: String,
    /// How long element lookups and URL checks wait before giving up
    pub element_timeout: Duration,
    pub poll_interval: Duration,
    pub headless: bool,
    pub no_sandbox: bool,
    pub chrome_path: Option<String>,
    /// Where failed scenarios leave a screenshot (disabled when unset)
    pub screenshot_dir: Option<PathBuf>,
    /// Attach to a Chrome already listening on this remote-debugging port
    pub debug_port: Option<u16>,
}

/// On-disk shape of the optional config file. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub user_name: Option<String>,
    pub password: Option<String>,
    pub home_page_url: Option<String>,
    pub inventory_page_url: Option<String>,
    pub element_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub headless: Option<bool>,
    pub no_sandbox: Option<bool>,
    pub chrome_path: Option<String>,
    pub screenshot_dir: Option<PathBuf>,
    pub debug_port: Option<u16>,
}

impl ConfigFile {
    /// Read a config file. A missing file is a `Config` error naming the path;
    /// malformed JSON surfaces as `Json`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl AppConfig {
    /// Defaults for the public demo storefront
    ///
    /// Headless and no-sandbox are switched on when `lookup` reports a CI
    /// environment.
    pub fn defaults(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let ci = running_in_ci(lookup);
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            home_page_url: DEFAULT_HOME_URL.to_string(),
            inventory_page_url: DEFAULT_INVENTORY_URL.to_string(),
            element_timeout: DEFAULT_ELEMENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            headless: ci,
            no_sandbox: ci,
            chrome_path: None,
            screenshot_dir: None,
            debug_port: None,
        }
    }

    /// Build a config from an optional file layer and a variable lookup
    pub fn from_lookup(
        file: Option<ConfigFile>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::defaults(&lookup);

        if let Some(file) = file {
            config.apply_file(file);
        }

        if let Some(v) = lookup(ENV_USER_NAME) {
            config.user_name = v;
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            config.password = v;
        }
        if let Some(v) = lookup(ENV_HOME_URL) {
            config.home_page_url = v;
        }
        if let Some(v) = lookup(ENV_INVENTORY_URL) {
            config.inventory_page_url = v;
        }
        if let Some(v) = lookup(ENV_ELEMENT_TIMEOUT_MS) {
            config.element_timeout = parse_millis(ENV_ELEMENT_TIMEOUT_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = parse_millis(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = lookup(ENV_HEADLESS) {
            config.headless = parse_bool(ENV_HEADLESS, &v)?;
        }
        if let Some(v) = lookup(ENV_NO_SANDBOX) {
            config.no_sandbox = parse_bool(ENV_NO_SANDBOX, &v)?;
        }
        if let Some(v) = lookup(ENV_CHROME_PATH) {
            config.chrome_path = Some(v);
        }
        if let Some(v) = lookup(ENV_SCREENSHOT_DIR) {
            config.screenshot_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup(ENV_DEBUG_PORT) {
            let port = v.trim().parse::<u16>().map_err(|_| {
                HarnessError::Config(format!("{} must be a port number, got '{}'", ENV_DEBUG_PORT, v))
            })?;
            config.debug_port = Some(port);
        }

        if config.poll_interval.is_zero() {
            return Err(HarnessError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// Read the config file (if `STOREFRONT_CONFIG` is set) and the process environment
    pub fn from_env() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        let file = match lookup(CONFIG_FILE_ENV) {
            Some(path) => Some(ConfigFile::load(Path::new(&path))?),
            None => None,
        };
        Self::from_lookup(file, lookup)
    }

    /// Install the process-wide config. Fails if one was already resolved.
    pub fn install(config: AppConfig) -> Result<()> {
        GLOBAL.set(config).map_err(|_| {
            HarnessError::Config("configuration already resolved for this process".to_string())
        })
    }

    /// Process-wide config, resolved from the environment on first use
    pub fn get() -> Result<&'static AppConfig> {
        if let Some(config) = GLOBAL.get() {
            return Ok(config);
        }
        let config = Self::from_env()?;
        log::debug!("Resolved configuration: {:?}", config);
        Ok(GLOBAL.get_or_init(|| config))
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.user_name {
            self.user_name = v;
        }
        if let Some(v) = file.password {
            self.password = v;
        }
        if let Some(v) = file.home_page_url {
            self.home_page_url = v;
        }
        if let Some(v) = file.inventory_page_url {
            self.inventory_page_url = v;
        }
        if let Some(ms) = file.element_timeout_ms {
            self.element_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = file.headless {
            self.headless = v;
        }
        if let Some(v) = file.no_sandbox {
            self.no_sandbox = v;
        }
        if file.chrome_path.is_some() {
            self.chrome_path = file.chrome_path;
        }
        if file.screenshot_dir.is_some() {
            self.screenshot_dir = file.screenshot_dir;
        }
        if file.debug_port.is_some() {
            self.debug_port = file.debug_port;
        }
    }
}

/// True when any of the common CI markers is present
pub fn running_in_ci(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_HOME", "CIRCLECI"]
        .iter()
        .any(|key| lookup(key).is_some())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(HarnessError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            HarnessError::Config(format!(
                "{} must be a number of milliseconds, got '{}'",
                key, value
            ))
        })
}
