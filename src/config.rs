//! Process configuration, read from environment variables.
//!
//! | variable            | default                     |
//! |---------------------|-----------------------------|
//! | `SERVICE_NAME`      | `available-schedules`       |
//! | `ENV`               | empty                       |
//! | `VERSION`           | empty                       |
//! | `ERROR_RATE`        | `0.02`                      |
//! | `EXTRA_DELAY_MS`    | `0`                         |
//! | `HISTOGRAM_BUCKETS` | `0.05,0.1,0.2,0.5,1.0`      |
//! | `LISTEN_ADDR`       | `0.0.0.0:8080`              |
//! | `LOG_FORMAT`        | `json` (or `pretty`)        |

use std::net::SocketAddr;
use std::time::Duration;

use crate::middleware::ServiceInfo;

pub const DEFAULT_SERVICE_NAME: &str = "available-schedules";
pub const DEFAULT_ERROR_RATE: f64 = 0.02;
pub const DEFAULT_BUCKETS: [f64; 5] = [0.05, 0.1, 0.2, 0.5, 1.0];
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Parse {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("ERROR_RATE must be within [0, 1], got {0}")]
    ErrorRateOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceInfo,
    pub error_rate: f64,
    pub extra_delay: Duration,
    /// Histogram bounds; validated when the metrics store is built.
    pub buckets: Vec<f64>,
    pub listen: SocketAddr,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let service = ServiceInfo {
            name: get("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.into()),
            env: get("ENV").unwrap_or_default(),
            version: get("VERSION").unwrap_or_default(),
        };

        let error_rate = match get("ERROR_RATE") {
            Some(v) => parse("ERROR_RATE", &v)?,
            None => DEFAULT_ERROR_RATE,
        };
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::ErrorRateOutOfRange(error_rate));
        }

        let extra_delay = match get("EXTRA_DELAY_MS") {
            Some(v) => Duration::from_millis(parse("EXTRA_DELAY_MS", &v)?),
            None => Duration::ZERO,
        };

        let buckets = match get("HISTOGRAM_BUCKETS") {
            Some(v) => v
                .split(',')
                .map(|b| parse("HISTOGRAM_BUCKETS", b))
                .collect::<Result<Vec<f64>, _>>()?,
            None => DEFAULT_BUCKETS.to_vec(),
        };

        let listen = parse(
            "LISTEN_ADDR",
            &get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into()),
        )?;

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Parse {
                    var: "LOG_FORMAT",
                    value: other.into(),
                    reason: "expected `json` or `pretty`".into(),
                })
            }
        };

        Ok(Self {
            service,
            error_rate,
            extra_delay,
            buckets,
            listen,
            log_format,
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
        var,
        value: value.into(),
        reason: e.to_string(),
    })
}
