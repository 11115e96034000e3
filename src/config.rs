use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "COURSE_ROSTER_DATA_DIR";
pub const HTTP_ADDR_ENV: &str = "COURSE_ROSTER_HTTP_ADDR";
/// Optional path to a TOML file read by the HTTP server at startup.
pub const CONFIG_ENV: &str = "COURSE_ROSTER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid http address '{0}'")]
    InvalidAddr(String),
}

/// Runtime settings shared by the CLI and the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the four data files.
    pub data_dir: PathBuf,
    pub course_file: String,
    pub student_file: String,
    pub professor_file: String,
    pub admin_file: String,
    pub http_addr: String,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            course_file: "courseinfo.txt".to_string(),
            student_file: "studentinfo.txt".to_string(),
            professor_file: "profinfo.txt".to_string(),
            admin_file: "admininfo.txt".to_string(),
            http_addr: "0.0.0.0:3000".to_string(),
            log_filter: "course_roster=info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Let the environment override the data directory and listen address.
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var(HTTP_ADDR_ENV) {
            self.http_addr = addr;
        }
        self
    }

    pub fn course_path(&self) -> PathBuf {
        self.data_dir.join(&self.course_file)
    }

    pub fn student_path(&self) -> PathBuf {
        self.data_dir.join(&self.student_file)
    }

    pub fn professor_path(&self) -> PathBuf {
        self.data_dir.join(&self.professor_file)
    }

    pub fn admin_path(&self) -> PathBuf {
        self.data_dir.join(&self.admin_file)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.http_addr.clone()))
    }
}
