use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Credential, WebhookSubscription};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Keys starting with this prefix are production-issued and accepted without an allow-list entry.
pub const DEFAULT_KEY_PREFIX: &str = "ak_";
pub const RESEARCH_TIMEOUT_SECS: u64 = 30;
pub const FANOUT_TIMEOUT_SECS: u64 = 10;
pub const CHANNEL_SEND_TIMEOUT_SECS: u64 = 15;
pub const WHATSAPP_API_BASE: &str = "https://graph.facebook.com/v18.0";
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Top-level config (relay.toml + RELAY_* env overrides).
///
/// Built once at start-up and shared read-only by every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub fanout: FanoutConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Accept WhatsApp payloads unsigned when no app secret is configured.
    /// Development only; every bypass is logged at warn level.
    #[serde(default)]
    pub insecure_skip_signatures: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            insecure_skip_signatures: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Allow-listed API keys.
    #[serde(default)]
    pub keys: Vec<Credential>,
    /// Reserved prefix for issued keys. Empty string disables prefix matching.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            key_prefix: default_key_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    pub whatsapp: Option<WhatsAppConfig>,
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub webhook: WebhookChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Shared token for the GET subscription handshake.
    pub verify_token: String,
    /// App secret used for X-Hub-Signature-256.
    pub app_secret: Option<String>,
    /// Graph API bearer token for outbound sends.
    pub access_token: Option<String>,
    pub phone_number_id: Option<String>,
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_telegram_api_base")]
    pub api_base_url: String,
    /// Bot username without `@`; commands addressed to other bots are ignored.
    pub bot_username: Option<String>,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookChannelConfig {
    /// Signing secret shared by all generic producers. Per-key secrets take precedence;
    /// without either the secret is derived from the API key.
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Full URL of the research backend's chat endpoint.
    #[serde(default = "default_research_url")]
    pub url: String,
    /// Sent as X-API-Key unless a per-call token overrides it.
    pub api_key: Option<String>,
    #[serde(default = "default_research_timeout")]
    pub timeout_secs: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            url: default_research_url(),
            api_key: None,
            timeout_secs: RESEARCH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Subscriber URLs. Accepts a list or a comma/newline-delimited string.
    #[serde(default, deserialize_with = "deserialize_url_list")]
    pub urls: Vec<String>,
    #[serde(default = "default_fanout_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            timeout_secs: FANOUT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

impl FanoutConfig {
    pub fn subscriptions(&self) -> Vec<WebhookSubscription> {
        self.urls
            .iter()
            .map(|url| WebhookSubscription { url: url.clone() })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryConfig {
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry policy for channel sends and fan-out POSTs.
///
/// `max_attempts = 1` (the default) means a single attempt with no backoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}
fn default_whatsapp_api_base() -> String {
    WHATSAPP_API_BASE.to_string()
}
fn default_telegram_api_base() -> String {
    TELEGRAM_API_BASE.to_string()
}
fn default_send_timeout() -> u64 {
    CHANNEL_SEND_TIMEOUT_SECS
}
fn default_research_url() -> String {
    "http://localhost:8000/api/v1/chat".to_string()
}
fn default_research_timeout() -> u64 {
    RESEARCH_TIMEOUT_SECS
}
fn default_fanout_timeout() -> u64 {
    FANOUT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    format!("relay-webhook/{}", env!("CARGO_PKG_VERSION"))
}
fn default_max_attempts() -> u32 {
    1
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    10_000
}

/// Split a delimited URL list, dropping blanks.
pub fn split_url_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn deserialize_url_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UrlList {
        Delimited(String),
        List(Vec<String>),
    }

    Ok(match UrlList::deserialize(deserializer)? {
        UrlList::Delimited(raw) => split_url_list(&raw),
        UrlList::List(items) => items
            .iter()
            .flat_map(|item| split_url_list(item))
            .collect(),
    })
}

impl RelayConfig {
    /// Load config from a TOML file with RELAY_* env var overrides.
    ///
    /// Nested keys use a double underscore: `RELAY_FANOUT__URLS`,
    /// `RELAY_CHANNELS__TELEGRAM__BOT_TOKEN`. A missing file is not an error.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("RELAY_").split("__"))
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))
    }

    /// Parse config from an in-memory TOML document (no env overrides).
    pub fn from_toml_str(toml: &str) -> crate::error::Result<Self> {
        Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))
    }
}

fn default_config_path() -> String {
    if let Ok(path) = std::env::var("RELAY_CONFIG") {
        return path;
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.relay/relay.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChannelKind;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = RelayConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert_eq!(cfg.auth.key_prefix, "ak_");
        assert_eq!(cfg.research.timeout_secs, 30);
        assert_eq!(cfg.fanout.timeout_secs, 10);
        assert_eq!(cfg.delivery.retry.max_attempts, 1);
        assert!(!cfg.gateway.insecure_skip_signatures);
        assert!(cfg.channels.whatsapp.is_none());
    }

    #[test]
    fn fanout_urls_accept_delimited_string() {
        let cfg = RelayConfig::from_toml_str(
            r#"
            [fanout]
            urls = "https://a.example/hook, https://b.example/hook\nhttps://c.example/hook,,"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.fanout.urls,
            vec![
                "https://a.example/hook",
                "https://b.example/hook",
                "https://c.example/hook"
            ]
        );
    }

    #[test]
    fn fanout_urls_accept_list() {
        let cfg = RelayConfig::from_toml_str(
            r#"
            [fanout]
            urls = ["https://a.example/hook", " "]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fanout.subscriptions().len(), 1);
        assert_eq!(cfg.fanout.subscriptions()[0].url, "https://a.example/hook");
    }

    #[test]
    fn keys_and_channels_parse() {
        let cfg = RelayConfig::from_toml_str(
            r#"
            [[auth.keys]]
            key = "demo-webhook-key-abcde"
            scope = "webhook"

            [[auth.keys]]
            key = "demo-telegram-key-67890"
            scope = "telegram"
            secret = "tg-secret"

            [channels.whatsapp]
            verify_token = "vt"
            app_secret = "shh"

            [channels.telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.auth.keys.len(), 2);
        assert_eq!(cfg.auth.keys[1].scope, ChannelKind::Telegram);
        assert_eq!(cfg.auth.keys[1].issued_secret.as_deref(), Some("tg-secret"));
        let wa = cfg.channels.whatsapp.unwrap();
        assert_eq!(wa.api_base_url, WHATSAPP_API_BASE);
        assert_eq!(wa.app_secret.as_deref(), Some("shh"));
        let tg = cfg.channels.telegram.unwrap();
        assert_eq!(tg.api_base_url, TELEGRAM_API_BASE);
    }

    #[test]
    fn split_url_list_trims_and_drops_blanks() {
        assert!(split_url_list("").is_empty());
        assert_eq!(split_url_list(" a ,\n b "), vec!["a", "b"]);
    }
}
