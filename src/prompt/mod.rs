// src/prompt/mod.rs
// Terminal prompts used before the harness starts hammering a cluster.

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};

/// Yes/no confirmation; off unless the run opts into prompts.
#[derive(Debug, Clone, Copy)]
pub struct Prompt {
    enabled: bool,
}

impl Prompt {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Always `true` when prompts are disabled.
    pub fn confirm(&self, message: &str) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }
        ask_to_proceed(message)
    }
}

pub fn ask_to_proceed(message: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// Ask for whichever of username/password is empty.
pub fn prompt_credentials(username: &str, password: &str) -> Result<(String, String)> {
    Ok((prompt_message("Username", username)?, prompt_password(password)?))
}

/// Return `value` unchanged, or ask for it when empty.
pub fn prompt_message(message: &str, value: &str) -> Result<String> {
    if !value.is_empty() {
        return Ok(value.to_string());
    }
    let answer: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .validate_with(|input: &String| {
            if input.trim().is_empty() {
                Err("value must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .with_context(|| format!("Failed to read {}", message.to_lowercase()))?;
    Ok(answer.trim().to_string())
}

/// Return `password` unchanged, or read one without echo when empty.
pub fn prompt_password(password: &str) -> Result<String> {
    if !password.is_empty() {
        return Ok(password.to_string());
    }
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")
}
