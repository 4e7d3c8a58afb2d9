use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TARGET_URL: &str = "https://httpbin.org/ip";
const DEFAULT_NUM_REQUESTS: u32 = 5;
const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(500);

// Parses a duration string (e.g., "500ms", "2s") into a `Duration`.
// Used for deserializing duration values from the config file.
fn parse_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(&s).map_err(serde::de::Error::custom)
}

/// Run configuration passed into the run controller.
/// Corresponds to the [run] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    #[serde(default = "RunConfig::default_target_url")]
    pub target_url: String,

    #[serde(default = "RunConfig::default_num_requests")]
    pub num_requests: u32,

    // Pause inserted between consecutive requests, skipped after the final
    // one.
    #[serde(
        default = "RunConfig::default_inter_request_delay",
        deserialize_with = "parse_duration"
    )]
    pub inter_request_delay: Duration,
}

impl RunConfig {
    fn default_target_url() -> String {
        DEFAULT_TARGET_URL.to_string()
    }

    fn default_num_requests() -> u32 {
        DEFAULT_NUM_REQUESTS
    }

    fn default_inter_request_delay() -> Duration {
        DEFAULT_INTER_REQUEST_DELAY
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: Self::default_target_url(),
            num_requests: Self::default_num_requests(),
            inter_request_delay: Self::default_inter_request_delay(),
        }
    }
}

/// Configuration for the gateway endpoint provider.
/// Corresponds to the [gateway] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    // Directory holding the deployed terraform state.
    #[serde(default = "GatewayConfig::default_state_dir")]
    pub state_dir: PathBuf,
}

impl GatewayConfig {
    fn default_state_dir() -> PathBuf {
        PathBuf::from("terraform-aws")
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            state_dir: Self::default_state_dir(),
        }
    }
}

/// Configuration for the instance endpoint provider.
/// Corresponds to the [instance] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct InstanceConfig {
    // Cloud project the deployed instances live under.
    #[serde(default = "InstanceConfig::default_project")]
    pub project: String,
}

impl InstanceConfig {
    fn default_project() -> String {
        "boring-01".to_string()
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            project: Self::default_project(),
        }
    }
}

/// Configuration for the export collaborators.
/// Corresponds to the [export] section in the TOML config file.
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "ExportConfig::default_csv_path")]
    pub csv_path: PathBuf,

    #[serde(default = "ExportConfig::default_ip_list_path")]
    pub ip_list_path: PathBuf,
}

impl ExportConfig {
    fn default_csv_path() -> PathBuf {
        PathBuf::from("proxy_ips.csv")
    }

    fn default_ip_list_path() -> PathBuf {
        PathBuf::from("proxies.txt")
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_path: Self::default_csv_path(),
            ip_list_path: Self::default_ip_list_path(),
        }
    }
}

/// Represents the overall application configuration, loaded from a TOML file.
/// Every field has a default, so an absent file yields a usable
/// configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub instance: InstanceConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn new(config_path: Option<&PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    // Loads configuration from a TOML file.
    fn load_from_file(config_path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
        toml::from_str::<Config>(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.run.num_requests == 0 {
            bail!("num_requests must be positive");
        }
        url::Url::parse(&self.run.target_url)
            .with_context(|| format!("invalid target url {:?}", self.run.target_url))?;
        Ok(())
    }
}
