// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the concierge booking assistant.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConciergeConfig {
    /// Assistant identity and per-turn limits.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot and business-connection policy.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Chat-completions backend settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Booking status vocabulary and recommendation settings.
    #[serde(default)]
    pub booking: BookingConfig,

    /// Admin store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Inbound messages longer than this (in characters) never reach the model.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Number of history entries kept per chat.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Reply sent when an inbound message exceeds `max_input_chars`.
    #[serde(default = "default_too_long_reply")]
    pub too_long_reply: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            max_input_chars: default_max_input_chars(),
            history_window: default_history_window(),
            too_long_reply: default_too_long_reply(),
        }
    }
}

fn default_agent_name() -> String {
    "concierge".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_input_chars() -> usize {
    200
}

fn default_history_window() -> usize {
    10
}

fn default_too_long_reply() -> String {
    "Your message is too long. Please shorten it to 200 characters and send it again.".to_string()
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Falls back to `TELEGRAM_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Owner user ids. Empty disables owner checks entirely.
    ///
    /// Accepts a TOML array or a comma-separated string (`"1,2"`).
    #[serde(default, deserialize_with = "deserialize_owner_ids")]
    pub owner_ids: Vec<u64>,

    /// Require a server-side owner lookup before trusting an unseen connection.
    #[serde(default = "default_strict")]
    pub strict_business_connection: bool,

    /// Timeout for transport calls (owner lookup, notifications).
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            owner_ids: Vec::new(),
            strict_business_connection: default_strict(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_strict() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    20
}

/// Chat-completions backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key. Falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout; the call is abandoned after this.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed pause before every request.
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: 0,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

/// Booking status vocabulary and recommendation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    /// Label of the first status line.
    #[serde(default = "default_service_label")]
    pub service_label: String,

    /// Label of the second status line; also the recommendation subject.
    #[serde(default = "default_master_label")]
    pub master_label: String,

    /// Label of the third status line.
    #[serde(default = "default_time_label")]
    pub time_label: String,

    /// Sentence that announces a completed booking draft to the customer.
    #[serde(default = "default_final_phrase")]
    pub final_phrase: String,

    /// How a wildcard subject is named in recommendation text.
    #[serde(default = "default_any_subject_label")]
    pub any_subject_label: String,

    /// Whole-message phrases meaning "any master will do".
    #[serde(default = "default_any_phrases")]
    pub any_phrases: Vec<String>,

    /// Phrases marking a paragraph that upsells an unrelated service.
    #[serde(default = "default_upsell_triggers")]
    pub upsell_triggers: Vec<String>,

    /// Phrases marking a paragraph with generic package or discount wording.
    #[serde(default = "default_promo_triggers")]
    pub promo_triggers: Vec<String>,

    /// Optional JSON catalog replacing the built-in one.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            service_label: default_service_label(),
            master_label: default_master_label(),
            time_label: default_time_label(),
            final_phrase: default_final_phrase(),
            any_subject_label: default_any_subject_label(),
            any_phrases: default_any_phrases(),
            upsell_triggers: default_upsell_triggers(),
            promo_triggers: default_promo_triggers(),
            catalog_path: None,
        }
    }
}

fn default_service_label() -> String {
    "Service".to_string()
}

fn default_master_label() -> String {
    "Master".to_string()
}

fn default_time_label() -> String {
    "Time".to_string()
}

fn default_final_phrase() -> String {
    "Thank you! Your request has been passed to the administrator, who will contact you shortly to confirm the booking.".to_string()
}

fn default_any_subject_label() -> String {
    "any master".to_string()
}

fn default_any_phrases() -> Vec<String> {
    [
        "any",
        "any master",
        "anyone",
        "anybody",
        "any master is fine",
        "no preference",
        "doesn't matter",
        "does not matter",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_upsell_triggers() -> Vec<String> {
    [
        "we also offer",
        "we also recommend",
        "i also recommend",
        "you might also like",
        "you may also like",
        "in addition to",
        "additionally, we",
        "you can also book",
        "also try",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_promo_triggers() -> Vec<String> {
    ["package", "discount", "bundle", "special offer", "promo"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Admin store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding the admin set.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("concierge").join("concierge.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("concierge.db"))
        .to_string_lossy()
        .into_owned()
}

/// Accepts `[1, 2]`, `"1,2"`, or a bare integer for the owner list.
///
/// Unparsable entries in a comma-separated string are skipped, matching how
/// the `OWNER_ID` style environment value has always been read.
fn deserialize_owner_ids<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OwnerIds {
        List(Vec<u64>),
        One(u64),
        Text(String),
    }

    Ok(match OwnerIds::deserialize(deserializer)? {
        OwnerIds::List(ids) => ids,
        OwnerIds::One(id) => vec![id],
        OwnerIds::Text(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<u64>().ok())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ConciergeConfig::default();
        assert_eq!(config.agent.max_input_chars, 200);
        assert_eq!(config.agent.history_window, 10);
        assert!(config.telegram.strict_business_connection);
        assert_eq!(config.telegram.request_timeout_secs, 20);
        assert_eq!(config.provider.timeout_secs, 20);
        assert!((config.provider.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.booking.service_label, "Service");
        assert_eq!(config.booking.master_label, "Master");
        assert_eq!(config.booking.time_label, "Time");
    }

    #[test]
    fn owner_ids_accept_comma_separated_string() {
        let config: TelegramConfig =
            toml::from_str(r#"owner_ids = "111, 222,,abc""#).unwrap();
        assert_eq!(config.owner_ids, vec![111, 222]);
    }

    #[test]
    fn owner_ids_accept_array_and_single_value() {
        let config: TelegramConfig = toml::from_str("owner_ids = [5, 6]").unwrap();
        assert_eq!(config.owner_ids, vec![5, 6]);

        let config: TelegramConfig = toml::from_str("owner_ids = 9").unwrap();
        assert_eq!(config.owner_ids, vec![9]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<AgentConfig, _> = toml::from_str("naem = \"x\"");
        assert!(result.is_err());
    }
}
