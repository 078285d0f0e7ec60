use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::TimeDelta;

use crate::sessions::{LOGOUT_PATH, WHOAMI_PATH};
use crate::tenancy::normalize_host;

const DEFAULT_GENERIC_HOSTS: &str = "localhost,127.0.0.1";
const DEFAULT_IDLE_SECONDS: i64 = 3600;
const DEFAULT_LOGIN_PATH: &str = "/accounts/login/";
const DEFAULT_SESSION_COOKIE: &str = "sessionid";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub tenancy: TenancyConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let generic_hosts = env::var("APP_GENERIC_HOSTS")
            .unwrap_or_else(|_| DEFAULT_GENERIC_HOSTS.to_string());
        let tenancy = TenancyConfig::from_list(&generic_hosts);

        let idle_seconds = match env::var("APP_SESSION_IDLE_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .ok_or(ConfigError::InvalidIdleTimeout { value: raw })?,
            Err(_) => DEFAULT_IDLE_SECONDS,
        };
        let login_path =
            env::var("APP_LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string());
        let cookie_name =
            env::var("APP_SESSION_COOKIE").unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string());
        let session = SessionConfig::new(idle_seconds, login_path, cookie_name)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            tenancy,
            session,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Hosts that may fall back to the default tenant when no custom domain matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenancyConfig {
    pub generic_hosts: Vec<String>,
}

impl TenancyConfig {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut generic_hosts: Vec<String> = Vec::new();
        for host in hosts {
            if let Some(host) = normalize_host(host.as_ref()) {
                if !generic_hosts.contains(&host) {
                    generic_hosts.push(host);
                }
            }
        }
        Self { generic_hosts }
    }

    /// Parses a comma-separated allow-list such as `localhost,127.0.0.1`.
    pub fn from_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    /// Expects an already normalized host.
    pub fn is_generic(&self, host: &str) -> bool {
        self.generic_hosts.iter().any(|candidate| candidate == host)
    }
}

/// Idle-timeout policy and the login endpoint expired sessions are sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout: TimeDelta,
    pub login_path: String,
    pub cookie_name: String,
}

impl SessionConfig {
    pub fn new(
        idle_seconds: i64,
        login_path: impl Into<String>,
        cookie_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let idle_timeout = TimeDelta::try_seconds(idle_seconds)
            .filter(|_| idle_seconds > 0)
            .ok_or_else(|| ConfigError::InvalidIdleTimeout {
                value: idle_seconds.to_string(),
            })?;

        let login_path = login_path.into();
        let route = login_route(&login_path);
        let unusable = !login_path.starts_with('/')
            || login_path
                .chars()
                .any(|c| c.is_control() || c.is_whitespace() || c == '#')
            || route == LOGOUT_PATH
            || route == WHOAMI_PATH;
        if unusable {
            return Err(ConfigError::InvalidLoginPath { value: login_path });
        }

        let cookie_name = cookie_name.into();
        let cookie_name = cookie_name.trim();
        if cookie_name.is_empty() || cookie_name.contains([';', '=', ' ']) {
            return Err(ConfigError::InvalidCookieName {
                value: cookie_name.to_string(),
            });
        }

        Ok(Self {
            idle_timeout,
            login_path,
            cookie_name: cookie_name.to_string(),
        })
    }
}

/// Path portion of the login URL, the part the account routes are mounted on.
pub fn login_route(login_path: &str) -> &str {
    login_path
        .split_once('?')
        .map_or(login_path, |(path, _)| path)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: TimeDelta::seconds(DEFAULT_IDLE_SECONDS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidIdleTimeout { value: String },
    InvalidLoginPath { value: String },
    InvalidCookieName { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidIdleTimeout { value } => write!(
                f,
                "APP_SESSION_IDLE_SECONDS must be a positive number of seconds (got '{}')",
                value
            ),
            ConfigError::InvalidLoginPath { value } => {
                write!(
                    f,
                    "APP_LOGIN_PATH must be an absolute path distinct from the logout and account routes (got '{}')",
                    value
                )
            }
            ConfigError::InvalidCookieName { value } => {
                write!(f, "APP_SESSION_COOKIE is not a usable cookie name: '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidIdleTimeout { .. }
            | ConfigError::InvalidLoginPath { .. }
            | ConfigError::InvalidCookieName { .. } => None,
        }
    }
}
