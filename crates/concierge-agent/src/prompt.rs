// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly.

use concierge_booking::StatusLabels;
use concierge_config::model::AgentConfig;
use concierge_core::Turn;
use tracing::{debug, warn};

const DEFAULT_PERSONA: &str = "You are the booking assistant of a beauty salon. \
Answer customers politely and briefly, help them choose a service, a master and a time, \
and never invent prices or availability.";

/// Loads the persona prompt: file beats inline beats the built-in default.
pub async fn load_system_prompt(config: &AgentConfig) -> String {
    if let Some(file_path) = &config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) => {
                debug!(path = file_path.as_str(), "loaded system prompt from file");
                return content.trim().to_string();
            }
            Err(e) => {
                warn!(
                    path = file_path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(prompt) = &config.system_prompt {
        return prompt.clone();
    }

    DEFAULT_PERSONA.to_string()
}

/// Instruction describing the trailing status block the replies must carry.
pub fn status_format_instruction(labels: &StatusLabels, final_phrase: &str) -> String {
    format!(
        "End every reply with exactly three lines, in this order and with no blank lines \
between them:\n{service}: <service>\n{master}: <master>\n{time}: <time>\n\
Write ? for any value the customer has not chosen yet. \
Do not write the sentence \"{final_phrase}\" yourself.",
        service = labels.service,
        master = labels.master,
        time = labels.time,
    )
}

/// Ordered system turns: persona, then the status-block instruction.
pub fn system_turns(persona: String, labels: &StatusLabels, final_phrase: &str) -> Vec<Turn> {
    vec![
        Turn::system(persona),
        Turn::system(status_format_instruction(labels, final_phrase)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn labels() -> StatusLabels {
        StatusLabels::new("Service".to_string(), "Master".to_string(), "Time".to_string())
    }

    #[tokio::test]
    async fn file_prompt_beats_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  From file.  ").unwrap();
        let config = AgentConfig {
            system_prompt: Some("Inline.".into()),
            system_prompt_file: Some(file.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        assert_eq!(load_system_prompt(&config).await, "From file.");
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_inline() {
        let config = AgentConfig {
            system_prompt: Some("Inline.".into()),
            system_prompt_file: Some("/nonexistent/prompt.txt".into()),
            ..Default::default()
        };
        assert_eq!(load_system_prompt(&config).await, "Inline.");
    }

    #[tokio::test]
    async fn default_persona_when_unset() {
        let prompt = load_system_prompt(&AgentConfig::default()).await;
        assert_eq!(prompt, DEFAULT_PERSONA);
    }

    #[test]
    fn instruction_names_labels_and_sentinel() {
        let text = status_format_instruction(&labels(), "Done!");
        assert!(text.contains("Service: <service>\nMaster: <master>\nTime: <time>"));
        assert!(text.contains("Write ?"));
        assert!(text.contains("\"Done!\""));
    }

    #[test]
    fn persona_comes_first() {
        let turns = system_turns("Persona".into(), &labels(), "Done!");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "Persona");
        assert!(turns[1].text.contains("Master: <master>"));
    }
}
