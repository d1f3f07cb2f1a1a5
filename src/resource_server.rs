use crate::config::Config;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote pod the application has registered with (or is about to).
///
/// One record exists per host. `client_id`/`client_secret` are issued by the
/// pod during registration; a record is only persisted once both are
/// populated, and re-registration replaces the pair wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceServer {
    /// Host portion of a lygneo id, including any non-default port.
    pub host: String,
    pub client_id: String,
    pub client_secret: String,
    pub registered_at: Option<DateTime<Utc>>,
}

impl ResourceServer {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            client_id: String::new(),
            client_secret: String::new(),
            registered_at: None,
        }
    }
    /// `{scheme}://{host}`, scheme selected by the configuration.
    pub fn full_host(&self, config: &Config) -> String {
        format!("{}://{}", config.scheme(), self.host)
    }
    /// The pod's full URL with an explicit port, as signed into the
    /// registration request and used for the registration POST.
    pub fn url(&self, config: &Config) -> String {
        if config.test_mode || self.host.contains(':') {
            self.full_host(config)
        } else {
            format!("{}://{}:443", config.scheme(), self.host)
        }
    }
    pub fn registration_endpoint(&self, config: &Config) -> String {
        format!("{}/oauth/token", self.url(config))
    }
    pub fn token_endpoint(&self, config: &Config) -> String {
        format!("{}/oauth/token", self.full_host(config))
    }
    pub fn authorize_endpoint(&self, config: &Config) -> String {
        format!("{}/oauth/authorize", self.full_host(config))
    }
    pub fn api_route(&self, config: &Config) -> String {
        format!("{}/api/v0", self.full_host(config))
    }
}
