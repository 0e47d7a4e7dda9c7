use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SESSION_COOKIE: &str = "appSession";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener both bind {0}")]
    DuplicateListener(String),

    #[error("Timeout must be greater than 0")]
    InvalidTimeout,

    #[error("Session cookie name cannot be empty")]
    EmptyCookieName,

    #[error("Session store URL must use http or https: {0}")]
    InvalidSessionStoreUrl(Url),
}

/// Gateway configuration, built once at process start and handed to every route.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GatewayConfig {
    /// Browser-facing listener
    pub listener: Listener,
    /// Listener for health and readiness probes
    pub admin_listener: Listener,
    #[serde(default)]
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub session_store: SessionStoreConfig,
}

impl GatewayConfig {
    /// Validates the gateway configuration.
    ///
    /// An empty downstream URL is accepted: the gateway still starts and every
    /// route answers with a configuration error until it is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::DuplicateListener(format!(
                "{}:{}",
                self.listener.host, self.listener.port
            )));
        }

        if self.downstream.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        self.session_store.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// The remote clustering service every route forwards to.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DownstreamConfig {
    /// Base URL of the clustering service. Kept as a string so that an unset
    /// value is representable; it is parsed once when the invoker is built.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        DownstreamConfig {
            base_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cookie_name() -> String {
    DEFAULT_SESSION_COOKIE.to_string()
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StaticSession {
    pub access_token: String,
    pub user_id: String,
}

/// Where session-authenticated routes look up the caller's session.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum SessionStoreConfig {
    /// Sessions keyed by the value of `cookie_name`, for development and tests
    Static {
        #[serde(default = "default_cookie_name")]
        cookie_name: String,
        #[serde(default)]
        sessions: HashMap<String, StaticSession>,
    },
    /// Session endpoint of the identity provider, called with the caller's cookies
    Remote {
        url: Url,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        SessionStoreConfig::Static {
            cookie_name: default_cookie_name(),
            sessions: HashMap::new(),
        }
    }
}

impl SessionStoreConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SessionStoreConfig::Static { cookie_name, .. } if cookie_name.trim().is_empty() => {
                Err(ValidationError::EmptyCookieName)
            }
            SessionStoreConfig::Static { .. } => Ok(()),
            SessionStoreConfig::Remote { timeout_secs: 0, .. } => {
                Err(ValidationError::InvalidTimeout)
            }
            SessionStoreConfig::Remote { url, .. } => match url.scheme() {
                "http" | "https" => Ok(()),
                _ => Err(ValidationError::InvalidSessionStoreUrl(url.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> GatewayConfig {
        GatewayConfig {
            listener: Listener {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            admin_listener: Listener {
                host: "127.0.0.1".to_string(),
                port: 3001,
            },
            downstream: DownstreamConfig {
                base_url: "http://127.0.0.1:5000".to_string(),
                timeout_secs: 10,
            },
            session_store: SessionStoreConfig::default(),
        }
    }

    #[test]
    fn test_parse_valid_config() {
        let yaml = r#"
listener:
    host: "0.0.0.0"
    port: 3000
admin_listener:
    host: "127.0.0.1"
    port: 3001
downstream:
    base_url: "http://backend.internal:5000"
    timeout_secs: 15
session_store:
    type: static
    sessions:
        abc123:
            access_token: tok
            user_id: auth0|42
"#;

        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.downstream.base_url, "http://backend.internal:5000");
        assert_eq!(config.downstream.timeout_secs, 15);
        match config.session_store {
            SessionStoreConfig::Static {
                cookie_name,
                sessions,
            } => {
                assert_eq!(cookie_name, DEFAULT_SESSION_COOKIE);
                assert_eq!(sessions["abc123"].user_id, "auth0|42");
            }
            other => panic!("unexpected session store: {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 3000}
admin_listener: {host: "0.0.0.0", port: 3001}
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.downstream.base_url, "");
        assert_eq!(config.downstream.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.session_store, SessionStoreConfig::default());
    }

    #[test]
    fn test_remote_session_store() {
        let yaml = r#"
listener: {host: "0.0.0.0", port: 3000}
admin_listener: {host: "0.0.0.0", port: 3001}
session_store:
    type: remote
    url: "https://auth.example.com/api/auth/session"
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.session_store,
            SessionStoreConfig::Remote {
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                ..
            }
        ));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = base_config();
        config.listener.port = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidPort
        ));

        let mut config = base_config();
        config.admin_listener = config.listener.clone();
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::DuplicateListener(_)
        ));

        let mut config = base_config();
        config.downstream.timeout_secs = 0;
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidTimeout
        ));

        let mut config = base_config();
        config.session_store = SessionStoreConfig::Static {
            cookie_name: " ".to_string(),
            sessions: HashMap::new(),
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::EmptyCookieName
        ));

        let mut config = base_config();
        config.session_store = SessionStoreConfig::Remote {
            url: Url::parse("ftp://auth.example.com/session").unwrap(),
            timeout_secs: 5,
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ValidationError::InvalidSessionStoreUrl(_)
        ));
    }

    #[test]
    fn test_deserialization_errors() {
        // Invalid session store URL
        assert!(
            serde_yaml::from_str::<GatewayConfig>(
                r#"
listener: {host: "0.0.0.0", port: 3000}
admin_listener: {host: "127.0.0.1", port: 3001}
session_store: {type: remote, url: "not-a-url"}
"#
            )
            .is_err()
        );

        // Unknown session store type
        assert!(
            serde_yaml::from_str::<GatewayConfig>(
                r#"
listener: {host: "0.0.0.0", port: 3000}
admin_listener: {host: "127.0.0.1", port: 3001}
session_store: {type: redis}
"#
            )
            .is_err()
        );

        // Missing required field
        assert!(
            serde_yaml::from_str::<GatewayConfig>(
                r#"
listener: {host: "0.0.0.0"}
"#
            )
            .is_err()
        );
    }
}
