//! The prompting seam used while gathering template variables.
//!
//! [`TerminalPrompter`] drives `dialoguer`; [`StaticPrompter`] answers from
//! a fixed map and backs tests and scripted runs.

use std::collections::HashMap;

use crate::error::Result;

/// Asks the user for variable values.
pub trait Prompter {
    /// Free-form text input.
    fn input(&mut self, name: &str, message: &str, default: Option<&str>) -> Result<String>;

    /// A yes/no question.
    fn confirm(&mut self, name: &str, message: &str, default: bool) -> Result<bool>;

    /// Pick one of `choices`; returns the chosen index.
    fn select(&mut self, name: &str, message: &str, choices: &[String]) -> Result<usize>;
}

/// Interactive prompting on the terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, _name: &str, message: &str, default: Option<&str>) -> Result<String> {
        let mut input = dialoguer::Input::<String>::new().with_prompt(message);

        if let Some(default) = default {
            input = input.default(default.to_string());
        }

        input
            .interact_text()
            .map_err(|error| anyhow::Error::new(error).into())
    }

    fn confirm(&mut self, _name: &str, message: &str, default: bool) -> Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|error| anyhow::Error::new(error).into())
    }

    fn select(&mut self, _name: &str, message: &str, choices: &[String]) -> Result<usize> {
        dialoguer::Select::new()
            .with_prompt(message)
            .items(choices)
            .default(0)
            .interact()
            .map_err(|error| anyhow::Error::new(error).into())
    }
}

/// Answers prompts from a fixed variable-name-keyed map, falling back to
/// the prompt's default.
#[derive(Debug, Default)]
pub struct StaticPrompter {
    pub answers: HashMap<String, String>,
}

impl StaticPrompter {
    pub fn new(answers: HashMap<String, String>) -> Self {
        Self { answers }
    }
}

impl Prompter for StaticPrompter {
    fn input(&mut self, name: &str, _message: &str, default: Option<&str>) -> Result<String> {
        Ok(self
            .answers
            .get(name)
            .cloned()
            .or_else(|| default.map(String::from))
            .unwrap_or_default())
    }

    fn confirm(&mut self, name: &str, _message: &str, default: bool) -> Result<bool> {
        Ok(self
            .answers
            .get(name)
            .map(|answer| answer == "true" || answer == "yes")
            .unwrap_or(default))
    }

    fn select(&mut self, name: &str, _message: &str, choices: &[String]) -> Result<usize> {
        Ok(self
            .answers
            .get(name)
            .and_then(|answer| choices.iter().position(|choice| choice == answer))
            .unwrap_or(0))
    }
}
