use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// TOML: `basic.listen_port`. Default: `8188`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Database URL for SQLite (user-trained models table).
    /// TOML: `basic.database_url`. Default: `sqlite://cinkbert.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Base64-encoded master key (at least 64 bytes) for the encrypted session cookie.
    /// TOML: `basic.cookie_secret`. When empty a random key is generated per process,
    /// which signs everybody out on restart.
    #[serde(default)]
    pub cookie_secret: String,

    /// Drop the `Secure` attribute from the session cookie (plain-HTTP local development).
    /// TOML: `basic.insecure_cookie`. Default: `false`.
    #[serde(default)]
    pub insecure_cookie: bool,

    /// How long a verified access token is trusted before asking the auth provider again.
    /// TOML: `basic.session_cache_ttl_secs`. Default: `60`.
    #[serde(default = "default_session_cache_ttl_secs")]
    pub session_cache_ttl_secs: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            database_url: default_database_url(),
            loglevel: default_loglevel(),
            cookie_secret: String::new(),
            insecure_cookie: false,
            session_cache_ttl_secs: default_session_cache_ttl_secs(),
        }
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    8188
}

fn default_database_url() -> String {
    "sqlite://cinkbert.db".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_session_cache_ttl_secs() -> u64 {
    60
}
