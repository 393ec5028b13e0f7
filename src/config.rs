use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use snafu::ResultExt as _;
use url::Url;

use crate::backend::HttpBackend;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::routes::App;
use crate::session::{CookieOptions, DEFAULT_COOKIE_NAME};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address")]
    pub host: SocketAddr,
    #[serde(rename = "pocketbase_url")]
    pub backend: Url,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_page_size")]
    pub dashboard_page_size: u32,
    #[serde(default = "default_cookie_name")]
    pub auth_cookie_name: String,
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    #[serde(default = "default_true")]
    pub cookie_http_only: bool,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_page_size() -> u32 {
    10
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_env() -> Result<Self, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ApplicationError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).context(ConfigLoadSnafu)
    }

    pub fn cookie(&self) -> CookieOptions {
        CookieOptions::new(
            self.auth_cookie_name.clone(),
            self.cookie_secure,
            self.cookie_http_only,
        )
    }

    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(self.backend.clone())
    }

    pub fn app(&self) -> App {
        App::new(Arc::new(self.backend()), self.cookie(), self.dashboard_page_size)
    }
}
