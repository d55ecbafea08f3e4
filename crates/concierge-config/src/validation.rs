// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ConciergeConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &ConciergeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let booking = &config.booking;
    let labels = [
        ("booking.service_label", &booking.service_label),
        ("booking.master_label", &booking.master_label),
        ("booking.time_label", &booking.time_label),
    ];
    for (key, label) in labels {
        if label.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        } else if label.contains(':') || label.contains('\n') {
            fail(format!("{key} `{label}` must not contain ':' or line breaks"));
        }
    }
    for (i, (key_a, a)) in labels.iter().enumerate() {
        for (key_b, b) in &labels[i + 1..] {
            if !a.trim().is_empty() && a.trim().eq_ignore_ascii_case(b.trim()) {
                fail(format!("{key_a} and {key_b} must differ, both are `{a}`"));
            }
        }
    }

    if booking.final_phrase.trim().is_empty() {
        fail("booking.final_phrase must not be empty".to_string());
    }

    if config.agent.max_input_chars == 0 {
        fail("agent.max_input_chars must be greater than 0".to_string());
    }
    if config.agent.history_window == 0 {
        fail("agent.history_window must be greater than 0".to_string());
    }
    if config.agent.too_long_reply.trim().is_empty() {
        fail("agent.too_long_reply must not be empty".to_string());
    }

    let temperature = config.provider.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        fail(format!(
            "provider.temperature must be between 0.0 and 2.0, got {temperature}"
        ));
    }
    if config.provider.timeout_secs == 0 {
        fail("provider.timeout_secs must be greater than 0".to_string());
    }
    if config.telegram.request_timeout_secs == 0 {
        fail("telegram.request_timeout_secs must be greater than 0".to_string());
    }
    if config.provider.base_url.trim().is_empty() {
        fail("provider.base_url must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ConciergeConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ConciergeConfig::default();
        config.booking.time_label = "Service".into();
        config.booking.final_phrase = "  ".into();
        config.agent.max_input_chars = 0;
        config.provider.temperature = 3.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].to_string().contains("must differ"));
    }

    #[test]
    fn label_with_colon_is_rejected() {
        let mut config = ConciergeConfig::default();
        config.booking.master_label = "Master:".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("booking.master_label"));
    }
}
