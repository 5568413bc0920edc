use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Server settings, read once from `CLINICD_*` environment variables.
pub struct Config {
    pub port: u16,
    pub bind: String,
    pub data_dir: PathBuf,
    pub password: String,
    pub max_connections: usize,
    pub compact_threshold: u64,
    pub tls: Option<TlsPaths>,
    pub metrics_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("both CLINICD_TLS_CERT and CLINICD_TLS_KEY must be set, or neither")]
    PartialTls,
    #[error("CLINICD_MAX_CONNECTIONS must be at least 1")]
    NoConnections,
}

// The password is deliberately left out.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("bind", &self.bind)
            .field("data_dir", &self.data_dir)
            .field("max_connections", &self.max_connections)
            .field("compact_threshold", &self.compact_threshold)
            .field("tls", &self.tls)
            .field("metrics_port", &self.metrics_port)
            .finish_non_exhaustive()
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let tls = match (lookup("CLINICD_TLS_CERT"), lookup("CLINICD_TLS_KEY")) {
            (None, None) => None,
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => return Err(ConfigError::PartialTls),
        };

        let max_connections = parsed(&lookup, "CLINICD_MAX_CONNECTIONS")?.unwrap_or(256);
        if max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }

        Ok(Self {
            port: parsed(&lookup, "CLINICD_PORT")?.unwrap_or(5433),
            bind: lookup("CLINICD_BIND").unwrap_or_else(|| "0.0.0.0".into()),
            data_dir: lookup("CLINICD_DATA_DIR")
                .unwrap_or_else(|| "./data".into())
                .into(),
            password: lookup("CLINICD_PASSWORD").unwrap_or_else(|| "clinicd".into()),
            max_connections,
            compact_threshold: parsed(&lookup, "CLINICD_COMPACT_THRESHOLD")?.unwrap_or(1000),
            tls,
            metrics_port: parsed(&lookup, "CLINICD_METRICS_PORT")?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("clinic.wal")
    }
}
