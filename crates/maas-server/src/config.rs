//! Top-level server configuration, loaded from a TOML file (§6).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct MaasServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
}

/// HTTP bind configuration.
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}
