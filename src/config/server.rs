use std::env;
use std::net::SocketAddr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset or blank `HOST` and `PORT` fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(raw) = get("PORT") {
            config.port = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT={}: {}", raw, e))?;
        }

        Ok(config)
    }

    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_address() {
        let addr = ServerConfig::default().address().unwrap();
        assert_eq!(addr.port(), 8000);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_reads_host_and_port() {
        let config = ServerConfig::from_lookup(lookup(&[("HOST", "127.0.0.1"), ("PORT", "9090")])).unwrap();
        assert_eq!(config.address().unwrap().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("HOST", ""), ("PORT", "  ")])).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_rejects_unparseable_port() {
        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_rejects_hostname_that_is_not_an_ip() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 8000,
        };
        assert!(config.address().is_err());
    }
}
