mod settings;

pub use settings::{
    BannerConfig, ChatConfig, LogFormat, LoggingConfig, ServerConfig, SessionConfig, Settings,
    LOBBY_PATH, NOTIFICATIONS_PATH,
};
