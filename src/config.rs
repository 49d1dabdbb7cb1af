use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub store: StoreConfig,
    pub client: ClientConfig,
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How often the background sweep removes expired notifications
    pub ttl_sweep_interval_secs: u64,
    pub seed_sample_data: bool,
}

/// Posts are exported to a JSON file once their count reaches `threshold`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    pub enabled: bool,
    pub threshold: u64,
    pub directory: String,
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:blogsite.db".to_string()),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("SERVER_PORT", 8082),
            },
            cache: CacheConfig {
                capacity: parse_or("CACHE_CAPACITY", 1000),
            },
            store: StoreConfig {
                ttl_sweep_interval_secs: parse_or("TTL_SWEEP_INTERVAL_SECS", 60),
                seed_sample_data: parse_or("SEED_SAMPLE_DATA", true),
            },
            client: ClientConfig {
                base_url: env::var("BLOG_API_URL")
                    .unwrap_or_else(|_| "http://localhost:8082".to_string()),
                timeout_secs: parse_or("CLIENT_TIMEOUT_SECS", 10),
            },
            backup: BackupConfig {
                enabled: parse_or("BACKUP_ENABLED", true),
                threshold: parse_or("BACKUP_THRESHOLD", 10_000),
                directory: env::var("BACKUP_DIRECTORY").unwrap_or_else(|_| "./backups".to_string()),
                check_interval_secs: parse_or("BACKUP_CHECK_INTERVAL_SECS", 3600),
            },
        })
    }

    /// Configuration for an isolated in-memory store, used by tests and demos.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            cache: CacheConfig { capacity: 128 },
            store: StoreConfig {
                ttl_sweep_interval_secs: 60,
                seed_sample_data: false,
            },
            client: ClientConfig {
                base_url: "http://127.0.0.1:8082".to_string(),
                timeout_secs: 5,
            },
            backup: BackupConfig {
                enabled: false,
                threshold: 10_000,
                directory: "./backups".to_string(),
                check_interval_secs: 3600,
            },
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn ttl_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.store.ttl_sweep_interval_secs.max(1))
    }

    pub fn backup_check_interval(&self) -> Duration {
        Duration::from_secs(self.backup.check_interval_secs.max(1))
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs.max(1))
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_config() {
        let config = Config::in_memory();
        assert_eq!(config.database.max_connections, 1);
        assert!(config.database.url.contains(":memory:"));
        assert_eq!(config.server_address(), "127.0.0.1:0");
        assert!(!config.backup.enabled);
    }

    #[test]
    fn test_intervals_never_zero() {
        let mut config = Config::in_memory();
        config.store.ttl_sweep_interval_secs = 0;
        config.client.timeout_secs = 0;
        config.backup.check_interval_secs = 0;
        assert_eq!(config.ttl_sweep_interval(), Duration::from_secs(1));
        assert_eq!(config.backup_check_interval(), Duration::from_secs(1));
        assert_eq!(config.client_timeout(), Duration::from_secs(1));
    }
}
