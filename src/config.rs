//! Configuration types for busca-retrabalho

use crate::error::{Error, Result};
use crate::types::TipoRetrabalho;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// MES API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base address (e.g., "http://localhost:6543/")
    pub host: String,

    /// User used to log into the API
    pub user: String,

    /// Password of `user`
    pub password: String,

    /// Timeout of the login request (default: 10 seconds)
    #[serde(default = "default_login_timeout", with = "duration_serde")]
    pub login_timeout: Duration,

    /// Timeout of every data request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Hand-written so the password never reaches the logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("login_timeout", &self.login_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ApiConfig {
    /// Create API settings with default timeouts
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            login_timeout: default_login_timeout(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }

    /// Parsed base URL every endpoint is joined onto
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.host)
            .map_err(|e| Error::config("host", format!("invalid host '{}': {e}", self.host)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "host",
                format!("host must use http or https, got '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}

/// Pagination settings of the rework fetch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Records requested per page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on requested pages, whatever `last_page` says (default: 1000)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Rework category requested from the API (default: SUCATA)
    #[serde(default = "default_record_type")]
    pub record_type: TipoRetrabalho,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            record_type: default_record_type(),
        }
    }
}

/// CSV report settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV file that will be written
    pub path: PathBuf,

    /// Field separator (default: ',')
    #[serde(default = "default_separator")]
    pub separator: char,
}

impl OutputConfig {
    /// Create output settings with the default separator
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: default_separator(),
        }
    }

    /// Fail early when the report's directory does not exist
    ///
    /// A bare file name is written to the working directory.
    pub fn check_directory(&self) -> Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => Err(Error::config(
                "file_path",
                format!("directory {} does not exist", dir.display()),
            )),
            _ => Ok(()),
        }
    }

    /// Separator as the single byte the CSV writer expects
    pub fn separator_byte(&self) -> Result<u8> {
        match self.separator {
            '"' | '\n' | '\r' => Err(Error::config(
                "separator",
                format!("{:?} cannot be used as a field separator", self.separator),
            )),
            c if c.is_ascii() => Ok(c as u8),
            c => Err(Error::config(
                "separator",
                format!("separator must be a single ASCII character, got {c:?}"),
            )),
        }
    }
}

/// Main configuration of a report run
///
/// - [`api`](ApiConfig): host and credentials
/// - [`fetch`](FetchConfig): pagination and record type
/// - [`output`](OutputConfig): CSV destination and separator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings
    pub api: ApiConfig,

    /// Pagination settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report destination
    pub output: OutputConfig,
}

impl Config {
    /// Create a configuration with default fetch settings
    pub fn new(api: ApiConfig, output: OutputConfig) -> Self {
        Self {
            api,
            fetch: FetchConfig::default(),
            output,
        }
    }

    /// Check every setting before any request is made
    pub fn validate(&self) -> Result<()> {
        self.api.base_url()?;
        if self.api.user.trim().is_empty() {
            return Err(Error::config("user", "user must not be empty"));
        }
        if self.fetch.page_size == 0 {
            return Err(Error::config("page_size", "page_size must be at least 1"));
        }
        if self.fetch.max_pages == 0 {
            return Err(Error::config("max_pages", "max_pages must be at least 1"));
        }
        self.output.separator_byte()?;
        self.output.check_directory()?;
        Ok(())
    }
}

fn default_login_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("busca-retrabalho/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    1000
}

fn default_record_type() -> TipoRetrabalho {
    TipoRetrabalho::Sucata
}

fn default_separator() -> char {
    ','
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
