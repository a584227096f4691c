use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "WEATHER_API_CONFIG";
pub const HOST_ENV: &str = "WEATHER_API_HOST";
pub const PORT_ENV: &str = "WEATHER_API_PORT";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// File named by `WEATHER_API_CONFIG` (or defaults), then host/port
    /// overrides from the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(HOST_ENV).ok().as_deref(),
            std::env::var(PORT_ENV).ok().as_deref(),
        )?;
        Ok(config)
    }

    fn apply_overrides(&mut self, host: Option<&str>, port: Option<&str>) -> Result<()> {
        if let Some(host) = host {
            self.server.host = host
                .parse()
                .with_context(|| format!("{} is not an IP address: {}", HOST_ENV, host))?;
        }
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .with_context(|| format!("{} is not a port: {}", PORT_ENV, port))?;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}
