//! Terminal prompts used while resolving a project

use dialoguer::{theme::ColorfulTheme, Input, Password};
use djupload_core::Prompt;

/// Asks the operator on the terminal. A failed read (no terminal, input
/// closed) counts as an empty answer so resolution can fall back to
/// defaults.
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> String {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read answer: {}", e);
                String::new()
            })
    }

    fn ask_secret(&mut self, question: &str) -> String {
        Password::with_theme(&self.theme)
            .with_prompt(question)
            .allow_empty_password(true)
            .interact()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read answer: {}", e);
                String::new()
            })
    }
}
