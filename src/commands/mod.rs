//! Command implementations behind the CLI.

mod attach;
mod auth;
mod config;
mod note;
mod projects;
mod reference;
mod tickets;

pub use attach::cmd_attach;
pub use auth::{cmd_login, cmd_logout, cmd_passwd, cmd_whoami};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use note::cmd_note;
pub use projects::{
    ProjectOptions, cmd_project_create, cmd_project_delete, cmd_project_ls, cmd_project_show,
    cmd_project_update,
};
pub use reference::{cmd_categories, cmd_users};
pub use tickets::{
    TicketOptions, cmd_board, cmd_create, cmd_delete, cmd_ls, cmd_move, cmd_show, cmd_update,
};

use std::io::{self, BufRead, Write};

use crate::error::{DeskError, Result};
use crate::store::Confirm;

/// Output of a command: a JSON value, plus optional human-readable text.
pub struct CommandOutput {
    json: serde_json::Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: serde_json::Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when requested, otherwise the text (or the JSON if there
    /// is no text form).
    pub fn print(self, json: bool) -> Result<()> {
        match (json, self.text) {
            (false, Some(text)) => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Asks on stderr and reads the answer from stdin.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Read a secret from an argument, an environment variable or one line of
/// stdin, in that order.
pub(crate) fn read_secret(arg: Option<String>, env_var: &str, prompt: &str) -> Result<String> {
    if let Some(value) = arg {
        return Ok(value);
    }
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Ok(value);
    }
    eprint!("{prompt}: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        return Err(DeskError::Auth(format!("{} is required", prompt.to_lowercase())));
    }
    Ok(value)
}

/// Join trailing words into text, or read all of stdin when there are none.
pub(crate) fn text_or_stdin(words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut text = String::new();
    for line in io::stdin().lock().lines() {
        text.push_str(&line?);
        text.push('\n');
    }
    Ok(text)
}
