use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Connection settings for a Nimiq node RPC endpoint.
///
/// Immutable once handed to [`Client::new`](crate::Client::new); the base URL
/// and authentication are derived from it for every request.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL scheme, `http` or `https`.
    pub scheme: String,
    /// Node hostname or IP address.
    pub host: String,
    /// RPC port.
    pub port: u16,
    /// HTTP basic-auth credentials, if the node requires them.
    pub credentials: Option<Credentials>,
    /// PEM file with an additional root certificate to trust for TLS.
    pub ca_path: Option<PathBuf>,
    /// Per-request timeout. `None` means no timeout.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: "http".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 8648,
            credentials: None,
            ca_path: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Convenience constructor for the common host/port case.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_ca_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Endpoint URL without the request path, `{scheme}://{host}:{port}`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self.scheme.as_str() {
            "http" | "https" => {}
            other => {
                return Err(Error::Config(format!(
                    "unsupported scheme `{other}`; expected http or https"
                )));
            }
        }
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".to_owned()));
        }
        Ok(())
    }
}
