use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/tally.toml";

/// Environment and endpoints, loaded once at startup and immutable after.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the expense API.
    pub api_base_url: String,
    /// Base URL of the identity provider.
    pub auth_base_url: String,
    /// Client id registered with the identity provider.
    pub client_id: String,
    /// Where the signed-in session is cached between runs.
    pub session_path: String,
    /// Log level filter for stderr logging.
    pub log: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".to_string(),
            auth_base_url: "http://127.0.0.1:3000/auth".to_string(),
            client_id: String::new(),
            session_path: "config/session.json".to_string(),
            log: "warn".to_string(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tally", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the expense API base URL.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Override the identity provider base URL.
    #[arg(long)]
    auth_base_url: Option<String>,
    /// Override the identity provider client id.
    #[arg(long)]
    client_id: Option<String>,
    /// Override the session cache path.
    #[arg(long)]
    session_path: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("TALLY"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(api_base_url) = args.api_base_url {
        settings.api_base_url = api_base_url;
    }
    if let Some(auth_base_url) = args.auth_base_url {
        settings.auth_base_url = auth_base_url;
    }
    if let Some(client_id) = args.client_id {
        settings.client_id = client_id;
    }
    if let Some(session_path) = args.session_path {
        settings.session_path = session_path;
    }

    Ok(settings)
}
