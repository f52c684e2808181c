//! Startup settings: layered sources, validation and port resolution.
//!
//! Settings come from (highest precedence first) command-line flags, the
//! environment (`REGIONWATCH_*`), a config file, and finally `HBASE_HOME`
//! for locating `conf/regionservers`. Every problem found here is fatal and
//! reported before the terminal is touched.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::data::duration::parse_duration;
use crate::source::{conf_property, load_server_list, HttpFetcher, REGIONSERVER_INFO_PORT_KEY};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONCURRENCY: usize = 16;
pub const DEFAULT_REGIONSERVER_PORT: u16 = 60030;
pub const DEFAULT_MASTER_PORT: u16 = 60010;

/// Base name of the optional config file looked up in the working directory.
const CONFIG_BASENAME: &str = "regionwatch";
const ENV_PREFIX: &str = "REGIONWATCH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("No regionservers file found: pass --servers or set HBASE_HOME")]
    NoServersFile,

    #[error("Regionservers file {} does not exist", .0.display())]
    ServersFileMissing(PathBuf),

    #[error("Cannot read regionservers file {}: {source}", path.display())]
    ServersFileUnreadable { path: PathBuf, source: io::Error },

    #[error("No regionservers specified in {}", .0.display())]
    NoServers(PathBuf),

    #[error("Invalid {setting} `{value}`: expected a duration such as 10s, 500ms or 2m")]
    InvalidDuration { setting: &'static str, value: String },

    #[error("Invalid concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid master address `{master}`: {reason}")]
    InvalidMaster { master: String, reason: String },

    #[error("Cannot resolve region server port from master {master}: {reason}")]
    MasterUnresolvable { master: String, reason: String },
}

/// Raw, optional settings as read from one layer.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSettings {
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub hbase_home: Option<PathBuf>,
    pub servers: Option<PathBuf>,
    pub master: Option<String>,
    pub port: Option<u16>,
    pub concurrency: Option<usize>,
    pub log_file: Option<PathBuf>,
}

impl RawSettings {
    /// Load the file and environment layers.
    ///
    /// An explicit `path` must exist; otherwise `regionwatch.{toml,json,..}`
    /// in the working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(CONFIG_BASENAME).required(false),
        };

        let settings: RawSettings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Overlay `higher` on top of `self`; set fields of `higher` win.
    pub fn overlay(self, higher: RawSettings) -> RawSettings {
        RawSettings {
            interval: higher.interval.or(self.interval),
            timeout: higher.timeout.or(self.timeout),
            hbase_home: higher.hbase_home.or(self.hbase_home),
            servers: higher.servers.or(self.servers),
            master: higher.master.or(self.master),
            port: higher.port.or(self.port),
            concurrency: higher.concurrency.or(self.concurrency),
            log_file: higher.log_file.or(self.log_file),
        }
    }
}

/// How the region server info port is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSource {
    Fixed(u16),
    /// Ask the master at this `host:port` for its configuration.
    Master(String),
    Default,
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub interval: Duration,
    pub fetch_timeout: Duration,
    pub servers_file: PathBuf,
    pub port: PortSource,
    pub concurrency: usize,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Validate `raw`. `hbase_home_env` is the `HBASE_HOME` environment
    /// variable, consulted only when no home directory is configured.
    pub fn resolve(raw: RawSettings, hbase_home_env: Option<PathBuf>) -> Result<Self, ConfigError> {
        let interval = duration_setting("interval", raw.interval, DEFAULT_INTERVAL)?;
        let fetch_timeout = duration_setting("timeout", raw.timeout, DEFAULT_FETCH_TIMEOUT)?;

        let servers_file = match (raw.servers, raw.hbase_home.or(hbase_home_env)) {
            (Some(file), _) => file,
            (None, Some(home)) => home.join("conf").join("regionservers"),
            (None, None) => return Err(ConfigError::NoServersFile),
        };

        let port = match (raw.port, raw.master) {
            (Some(port), _) => PortSource::Fixed(port),
            (None, Some(master)) => PortSource::Master(master_address(&master)?),
            (None, None) => PortSource::Default,
        };

        let concurrency = raw.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }

        Ok(Self {
            interval,
            fetch_timeout,
            servers_file,
            port,
            concurrency,
            log_file: raw.log_file,
        })
    }

    /// Read the server list, rejecting a missing file or an empty list.
    pub fn load_servers(&self) -> Result<Vec<String>, ConfigError> {
        let path = &self.servers_file;
        if !path.exists() {
            return Err(ConfigError::ServersFileMissing(path.clone()));
        }
        let servers = load_server_list(path).map_err(|source| {
            ConfigError::ServersFileUnreadable {
                path: path.clone(),
                source,
            }
        })?;
        if servers.is_empty() {
            return Err(ConfigError::NoServers(path.clone()));
        }
        Ok(servers)
    }
}

/// Determine the region server info port, asking the master if configured.
pub async fn resolve_port(source: &PortSource, fetcher: &HttpFetcher) -> Result<u16, ConfigError> {
    match source {
        PortSource::Fixed(port) => Ok(*port),
        PortSource::Default => Ok(DEFAULT_REGIONSERVER_PORT),
        PortSource::Master(master) => {
            let unresolvable = |reason: String| ConfigError::MasterUnresolvable {
                master: master.clone(),
                reason,
            };
            let conf = fetcher
                .fetch_conf(master)
                .await
                .map_err(|e| unresolvable(e.to_string()))?;
            let value = conf_property(&conf, REGIONSERVER_INFO_PORT_KEY)
                .ok_or_else(|| unresolvable(format!("`{}` not set", REGIONSERVER_INFO_PORT_KEY)))?;
            value
                .trim()
                .parse()
                .map_err(|_| unresolvable(format!("invalid port `{}`", value)))
        }
    }
}

fn duration_setting(
    setting: &'static str,
    value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match parse_duration(&v) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::InvalidDuration { setting, value: v }),
        },
    }
}

/// Normalise a master given as `host`, `host:port`, an IPv6 literal or an
/// `http://` URL into the `host:port` form the info server is fetched at.
fn master_address(master: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidMaster {
        master: master.to_string(),
        reason,
    };

    let trimmed = master.trim();
    let authority = match trimmed.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("http") => rest,
        Some((scheme, _)) => return Err(invalid(format!("unsupported scheme `{}`", scheme))),
        None => trimmed,
    }
    .trim_end_matches('/');

    if authority.is_empty() || authority.contains('/') {
        return Err(invalid("expected host or host:port".to_string()));
    }

    if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| invalid("unterminated IPv6 literal".to_string()))?;
        return match after {
            "" => Ok(format!("[{}]:{}", host, DEFAULT_MASTER_PORT)),
            _ => match after.strip_prefix(':') {
                Some(port) => Ok(format!("[{}]:{}", host, master_port(port).map_err(invalid)?)),
                None => Err(invalid("unexpected text after IPv6 literal".to_string())),
            },
        };
    }

    match authority.matches(':').count() {
        0 => Ok(format!("{}:{}", authority, DEFAULT_MASTER_PORT)),
        1 => {
            let (host, port) = authority.split_once(':').unwrap_or((authority, ""));
            if host.is_empty() {
                return Err(invalid("missing host".to_string()));
            }
            Ok(format!("{}:{}", host, master_port(port).map_err(invalid)?))
        }
        // Bare IPv6 literal without a port.
        _ => Ok(format!("[{}]:{}", authority, DEFAULT_MASTER_PORT)),
    }
}

fn master_port(port: &str) -> Result<u16, String> {
    port.parse()
        .map_err(|_| format!("invalid port `{}`", port))
}
