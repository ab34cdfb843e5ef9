use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const LOBBY_PATH: &str = "/ws/lobby/";
pub const NOTIFICATIONS_PATH: &str = "/ws/notifications/";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub banners: BannerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host (and optional port) the page was served from
    #[serde(default = "default_host")]
    pub host: String,
    /// Use `wss://` and `https://` (the browser always did)
    #[serde(default = "default_secure")]
    pub secure: bool,
}

/// Identity of the logged-in user, as the page would have rendered it.
/// Missing fields stay empty; the session then runs without the features
/// that need them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub csrf_token: String,
    /// Value of the `sessionid` cookie
    #[serde(default)]
    pub session_cookie: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BannerConfig {
    /// Seconds a banner stays fully visible
    #[serde(default = "default_display_secs")]
    pub display_secs: u64,
    /// Seconds between fade start and removal
    #[serde(default = "default_fade_secs")]
    pub fade_secs: u64,
    /// Banners on screen at once; the oldest is dropped on overflow
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Open the lobby channel (pages without the lobby view only get notifications)
    #[serde(default = "default_chat_enabled")]
    pub enabled: bool,
    /// Forward whitespace-only compose text to the server
    #[serde(default)]
    pub allow_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "localhost:8000".to_string()
}

fn default_secure() -> bool {
    true
}

fn default_display_secs() -> u64 {
    5
}

fn default_fade_secs() -> u64 {
    1
}

fn default_max_visible() -> usize {
    5
}

fn default_chat_enabled() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        Self::load()
    }

    /// Build from files and the environment, without reading `.env`
    fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.secure", true)?
            .set_default("banners.display_secs", 5)?
            .set_default("banners.fade_secs", 1)?
            .set_default("banners.max_visible", 5)?
            .set_default("chat.enabled", true)?
            .set_default("chat.allow_empty", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // ELEARNING_SERVER__HOST, ELEARNING_SESSION__USER_ID, ELEARNING_BANNERS__MAX_VISIBLE, etc.
            // Values stay strings so identifiers like "007" survive; numeric
            // and boolean fields are converted on deserialize.
            .add_source(
                Environment::with_prefix("ELEARNING")
                    .prefix_separator("_")
                    .separator("__"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn notification_url(&self) -> String {
        self.server.ws_url(NOTIFICATIONS_PATH)
    }

    pub fn chat_url(&self) -> String {
        self.server.ws_url(LOBBY_PATH)
    }

    pub fn api_base(&self) -> String {
        let scheme = if self.server.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.server.host)
    }
}

impl ServerConfig {
    pub fn ws_url(&self, path: &str) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, path)
    }
}

impl BannerConfig {
    pub fn display(&self) -> Duration {
        Duration::from_secs(self.display_secs)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_secs(self.fade_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            secure: default_secure(),
        }
    }
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            display_secs: default_display_secs(),
            fade_secs: default_fade_secs(),
            max_visible: default_max_visible(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: default_chat_enabled(),
            allow_empty: false,
        }
    }
}
