//! Credential resolution for the command line.
//!
//! Flags and `QRZ_*` variables are read first. Anything still missing, or
//! everything when `--prompt` is given, is asked for on the terminal with
//! the password and API key masked.

use anyhow::Context;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password};
use qrzlog::prelude::*;
use qrzlog::session::{API_KEY_VAR, PASSWORD_VAR, USERNAME_VAR};

/// Values supplied up front, before any prompting.
#[derive(Debug, Default, Clone)]
pub struct Supplied {
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
}

/// Fills in each credential from `supplied`, falling back to `prompt` for
/// absent or empty values. With `always_prompt`, every value is prompted
/// for and `supplied` is ignored.
///
/// `prompt` receives the variable name it is asked to produce.
pub fn resolve<P>(supplied: Supplied, always_prompt: bool, mut prompt: P) -> anyhow::Result<Credentials>
where
    P: FnMut(&'static str) -> anyhow::Result<String>,
{
    let mut fill = |name: &'static str, value: Option<String>| -> anyhow::Result<String> {
        match value.filter(|v| !v.is_empty()) {
            Some(v) if !always_prompt => Ok(v),
            _ => prompt(name).with_context(|| format!("reading {name} from the terminal")),
        }
    };
    let username = fill(USERNAME_VAR, supplied.username)?;
    let password = fill(PASSWORD_VAR, supplied.password)?;
    let api_key = fill(API_KEY_VAR, supplied.api_key)?;

    let creds = Credentials::from_lookup(|name| match name {
        USERNAME_VAR => Some(username.clone()),
        PASSWORD_VAR => Some(password.clone()),
        API_KEY_VAR => Some(api_key.clone()),
        _ => None,
    })?;
    Ok(creds)
}

/// Asks for one credential on the terminal.
pub fn prompt_terminal(name: &'static str) -> anyhow::Result<String> {
    let theme = ColorfulTheme::default();
    let value = match name {
        USERNAME_VAR => Input::<String>::with_theme(&theme)
            .with_prompt("QRZ.com username")
            .interact_text()?,
        PASSWORD_VAR => Password::with_theme(&theme)
            .with_prompt("QRZ.com password")
            .interact()?,
        _ => Password::with_theme(&theme)
            .with_prompt("QRZ.com logbook API key")
            .interact()?,
    };
    Ok(value)
}
