use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Process-wide settings, resolved once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub listen: SocketAddr,
    pub vapid_private_key: Option<String>,
    pub vapid_public_key: Option<String>,
    pub vapid_subject: String,
    pub default_icon: String,
    pub push_ttl: Duration,
    pub push_timeout: Duration,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: ":memory:".into(),
            listen: SocketAddr::from(([127, 0, 0, 1], 8001)),
            vapid_private_key: None,
            vapid_public_key: None,
            vapid_subject: "mailto:admin@example.com".to_string(),
            default_icon: "/assets/logo.png".to_string(),
            push_ttl: Duration::from_secs(3600),
            push_timeout: Duration::from_secs(10),
        }
    }
}
