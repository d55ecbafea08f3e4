// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the concierge configuration system.

use concierge_config::diagnostic::{ConfigError, suggest_key};
use concierge_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_concierge_config() {
    let toml = r#"
[agent]
name = "salon"
log_level = "debug"
max_input_chars = 300
history_window = 6

[telegram]
bot_token = "123:ABC"
owner_ids = "111, 222"
strict_business_connection = false

[provider]
api_key = "sk-test"
model = "gpt-4o"
temperature = 0.5
request_delay_ms = 100

[booking]
service_label = "Услуга"
master_label = "Мастер"
time_label = "Время"
final_phrase = "Спасибо! Администратор свяжется с вами."

[storage]
database_path = "/tmp/concierge-test.db"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "salon");
    assert_eq!(config.agent.max_input_chars, 300);
    assert_eq!(config.agent.history_window, 6);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.owner_ids, vec![111, 222]);
    assert!(!config.telegram.strict_business_connection);
    assert_eq!(config.provider.model, "gpt-4o");
    assert_eq!(config.provider.request_delay_ms, 100);
    assert_eq!(config.booking.master_label, "Мастер");
    assert_eq!(config.storage.database_path, "/tmp/concierge-test.db");
}

/// Unknown field in [telegram] produces an UnknownKey error with a suggestion.
#[test]
fn unknown_field_suggests_closest_key() {
    let toml = r#"
[telegram]
owner_id = [1]
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(!errors.is_empty());
    match &errors[0] {
        ConfigError::UnknownKey { key, suggestion, .. } => {
            assert_eq!(key, "owner_id");
            assert_eq!(suggestion.as_deref(), Some("owner_ids"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Semantic problems are all reported, not just the first.
#[test]
fn validation_collects_every_problem() {
    let toml = r#"
[agent]
max_input_chars = 0

[provider]
temperature = 3.5

[booking]
master_label = "Service"
"#;

    let errors = load_and_validate_str(toml).unwrap_err();
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(errors.len(), 3, "{messages:?}");
}

#[test]
fn empty_input_yields_valid_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.max_input_chars, 200);
    assert!(config.telegram.owner_ids.is_empty());
}

#[test]
fn suggest_key_ignores_distant_names() {
    assert_eq!(
        suggest_key("strict_business_conection", &["strict_business_connection"]).as_deref(),
        Some("strict_business_connection")
    );
    assert_eq!(suggest_key("zzz", &["bot_token"]), None);
}
