use anyhow::{Context, Result};
use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Options for `civicone serve`. Every flag falls back to an environment
/// variable, which may come from a `.env` file.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "CIVICONE_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory served as static front-end; uploads go to <dir>/uploads
    #[arg(long, env = "CIVICONE_PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,

    /// Number of pooled database connections
    #[arg(long, env = "CIVICONE_POOL_SIZE", default_value_t = 8)]
    pub pool_size: usize,

    /// Largest accepted issue submission, in bytes
    #[arg(long, env = "CIVICONE_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub db: PathBuf,
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub pool_size: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_args(db: PathBuf, args: ServeArgs) -> Result<Self> {
        let ip: IpAddr = args
            .host
            .parse()
            .with_context(|| format!("Invalid host address '{}'", args.host))?;

        if args.pool_size == 0 {
            anyhow::bail!("Pool size must be at least 1");
        }
        if args.max_upload_bytes == 0 {
            anyhow::bail!("Maximum upload size must be greater than zero");
        }

        Ok(Config {
            db,
            addr: SocketAddr::new(ip, args.port),
            public_dir: args.public_dir,
            pool_size: args.pool_size,
            max_upload_bytes: args.max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            pool_size: 4,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::from_args(PathBuf::from("civic.db"), args()).unwrap();
        assert_eq!(config.addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.db, PathBuf::from("civic.db"));
    }

    #[test]
    fn test_ipv6_host() {
        let mut a = args();
        a.host = "::1".to_string();
        let config = Config::from_args(PathBuf::from("civic.db"), a).unwrap();
        assert_eq!(config.addr.to_string(), "[::1]:3000");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let mut a = args();
        a.host = "not an ip".to_string();
        let err = Config::from_args(PathBuf::from("civic.db"), a).unwrap_err();
        assert!(err.to_string().contains("Invalid host address"));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let mut a = args();
        a.pool_size = 0;
        assert!(Config::from_args(PathBuf::from("civic.db"), a).is_err());
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let mut a = args();
        a.max_upload_bytes = 0;
        assert!(Config::from_args(PathBuf::from("civic.db"), a).is_err());
    }
}
