use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command line and environment configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "rhs")]
#[command(about = "Minimal HTTP/1.1 echo and file server")]
#[command(version)]
pub struct Config {
    /// Directory to serve files from
    #[arg(long, default_value = ".", env = "SERVE_DIRECTORY")]
    pub directory: PathBuf,

    /// Host/IP to listen on
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "4221", env = "HTTP_PORT")]
    pub port: u16,

    /// Upper bound on connections handled at the same time
    #[arg(long = "max-connections", default_value = "1024", env = "MAX_CONNECTIONS")]
    pub max_connections: usize,

    /// Seconds to wait on any single read from a client
    #[arg(long = "read-timeout-secs", default_value = "10", env = "READ_TIMEOUT_SECS")]
    pub read_timeout_secs: u64,

    /// Seconds allowed for writing a response
    #[arg(long = "write-timeout-secs", default_value = "10", env = "WRITE_TIMEOUT_SECS")]
    pub write_timeout_secs: u64,

    /// Largest accepted upload body in bytes
    #[arg(long = "max-body-bytes", default_value = "67108864", env = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("max connections must be >= 1".to_string());
        }
        if self.read_timeout_secs == 0 {
            return Err("read timeout must be > 0".to_string());
        }
        if self.write_timeout_secs == 0 {
            return Err("write timeout must be > 0".to_string());
        }
        if !self.directory.is_dir() {
            return Err(format!(
                "serving directory {:?} is not a directory",
                self.directory
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            host: "0.0.0.0".to_string(),
            port: 4221,
            max_connections: 1024,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}
