use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    payment: Payment,
    video: Video,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_upload_dir")]
    upload_dir: String,
    /// Externally reachable base url, used for checkout redirects and video ingest urls
    public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Payment {
    api_base: String,
    secret_key: String,
    #[serde(default = "default_currency")]
    currency: String,
}

#[derive(Debug, Deserialize)]
pub struct Video {
    api_base: String,
    token_id: String,
    token_secret: String,
}

fn default_upload_dir() -> String {
    String::from("uploads")
}

fn default_currency() -> String {
    String::from("usd")
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    #[inline]
    pub fn video(&self) -> &Video {
        &self.video
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn upload_dir(&self) -> &str {
        &self.upload_dir
    }

    #[inline]
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}

impl Payment {
    #[inline]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[inline]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Video {
    #[inline]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[inline]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    #[inline]
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }
}
