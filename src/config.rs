use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "VISITOR_DESK_";

const DEFAULT_SMS_TEMPLATE: &str = "  {name} عزیز ، ضمن سپاس و قدردانی از  حضور شما در بازدید از غرفه ی گروه بنیان ، خواهشمند است که برای دریافت اطلاعات بیشتر و پیشنهادات و انتقادات ، به صفحه ی وبسایت {website} مراجعه نمایید.";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub sms: SmsConfig,
    pub email: EmailConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub uploads_dir: PathBuf,
    pub public_dir: PathBuf,
    /// Master key for the session cookie. Needs at least 64 bytes to be used.
    pub session_secret: Option<String>,
    pub session_hours: i64,
    pub insecure_cookie: bool,
    pub loglevel: String,
    pub admin_password: String,
    pub upload_limit_mb: usize,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:2030".to_string(),
            database_url: "sqlite:data/app.sqlite".to_string(),
            uploads_dir: PathBuf::from("uploads"),
            public_dir: PathBuf::from("public"),
            session_secret: None,
            session_hours: 8,
            insecure_cookie: false,
            loglevel: "info".to_string(),
            admin_password: "admin123".to_string(),
            upload_limit_mb: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub line_number: u64,
    pub website: String,
    /// Supports `{name}`, `{website}` and `{exhibition}` placeholders.
    pub message_template: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.sms.ir/v1".to_string(),
            api_key: None,
            line_number: 3000349269,
            website: "https://bonyanx.com".to_string(),
            message_template: DEFAULT_SMS_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Outbound SMS + email budget.
    pub per_minute: u32,
    pub exhibition_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            per_minute: 60,
            exhibition_name: "Bonyan Group".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `VISITOR_DESK_*` env vars
    /// (`__` separates sections, e.g. `VISITOR_DESK_SMS__API_KEY`).
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn upload_limit_bytes(&self) -> usize {
        self.basic.upload_limit_mb.max(1) * 1024 * 1024
    }
}
