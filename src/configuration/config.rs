use super::types::Paging;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Command-line arguments.
///
/// Every setting is optional here; anything left out falls back to the
/// configuration file, then to the built-in defaults of `Config`. Each flag can
/// also be given through the environment variable named in its help text.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "kennel")]
#[command(version)]
#[command(about = "Record service for dog owners and their dogs")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(long, short, env = "KENNEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// IP address to bind the HTTP server to
    #[arg(long, env = "KENNEL_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// TCP port of the HTTP server
    #[arg(long, env = "KENNEL_PORT")]
    pub port: Option<u16>,

    /// SQLite database file, created on first start
    #[arg(long, env = "KENNEL_DATABASE")]
    pub database: Option<PathBuf>,
}

/// Application configuration.
///
/// # Fields Overview
///
/// - `bind_address`: IP address the HTTP server listens on
/// - `port`: TCP port of the HTTP server, must not be 0
/// - `database_path`: SQLite file holding owners and dogs
/// - `default_page_limit`: `limit` used by list endpoints when the query omits it
/// - `max_page_limit`: upper bound applied to any requested `limit`
///
/// # Examples
///
/// ```
/// use kennel::configuration::Config;
///
/// let config = Config::from_toml_str("port = 9000").unwrap();
/// assert_eq!(config.port, 9000);
/// assert_eq!(config.default_page_limit, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub default_page_limit: u64,
    pub max_page_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1"),
            port: 8000,
            database_path: PathBuf::from("kennel.sqlite3"),
            default_page_limit: 10,
            max_page_limit: 100,
        }
    }
}

impl Config {
    /// Parse and validate a TOML document. Missing keys take their default value.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the final configuration: defaults, then the file named by
    /// `args.config` if any, then the individual flags.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_args(&mut self, args: &CliArgs) {
        if let Some(address) = &args.bind_address {
            self.bind_address = address.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(path) = &args.database {
            self.database_path = path.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.bind_address.clone()))?;
        if self.port == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "port must be between 1 and 65535",
            )));
        }
        if self.max_page_limit == 0 || self.default_page_limit == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "page limits must be at least 1",
            )));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(ConfigError::NotInRange(format!(
                "default_page_limit ({}) exceeds max_page_limit ({})",
                self.default_page_limit, self.max_page_limit
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .bind_address
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::BadIPFormatting(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn paging(&self) -> Paging {
        Paging {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::load(&CliArgs::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.paging(), Paging::default());
    }

    #[test]
    fn test_from_file_then_args() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_address = \"0.0.0.0\"\nport = 9000\ndatabase_path = \"/tmp/dogs.sqlite3\"\nmax_page_limit = 50"
        )
        .unwrap();

        let args = CliArgs::try_parse_from([
            "kennel",
            "--config",
            file.path().to_str().unwrap(),
            "--port",
            "9100",
        ])
        .unwrap_or_else(|e| panic!("{}", e));
        let config = Config::load(&args).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.database_path, PathBuf::from("/tmp/dogs.sqlite3"));
        assert_eq!(config.max_page_limit, 50);
        assert_eq!(config.default_page_limit, 10);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::from_toml_str("bind_address = \"localhost:80\""),
            Err(ConfigError::BadIPFormatting(_))
        ));
        assert!(matches!(
            Config::from_toml_str("port = 0"),
            Err(ConfigError::NotInRange(_))
        ));
        assert!(matches!(
            Config::from_toml_str("default_page_limit = 200"),
            Err(ConfigError::NotInRange(_))
        ));
        assert!(matches!(
            Config::from_toml_str("unknown_key = 1"),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let args = CliArgs {
            config: Some(PathBuf::from("/nonexistent/kennel.toml")),
            ..Default::default()
        };
        assert!(matches!(Config::load(&args), Err(ConfigError::IoError(_))));
    }
}
