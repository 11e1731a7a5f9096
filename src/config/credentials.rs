//! Login credential resolution: config file, then environment, then prompt.

use std::fmt;
use std::io;

use tracing::debug;

use super::{Config, CredentialError};

/// Environment variable consulted for the login username.
pub const USERNAME_ENV: &str = "CDVL_USERNAME";
/// Environment variable consulted for the login password.
pub const PASSWORD_ENV: &str = "CDVL_PASSWORD";

/// Username/password pair used for the site login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from raw values.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The password in clear text, only for building the login form.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of interactively entered credentials.
pub trait CredentialPrompt {
    /// Asks for the username.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the terminal cannot be read.
    fn prompt_username(&self) -> io::Result<String>;

    /// Asks for the password without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the terminal cannot be read.
    fn prompt_password(&self) -> io::Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn prompt_username(&self) -> io::Result<String> {
        dialoguer::Input::<String>::new()
            .with_prompt("Enter CDVL username (email)")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| io::Error::other(e.to_string()))
    }

    fn prompt_password(&self) -> io::Result<String> {
        dialoguer::Password::new()
            .with_prompt("Enter CDVL password")
            .allow_empty_password(true)
            .interact()
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolves the username and password separately: config value, then
/// `CDVL_USERNAME`/`CDVL_PASSWORD` via `env`, then `prompt`.
///
/// # Errors
///
/// Returns [`CredentialError::Missing`] if either value is still empty, or
/// [`CredentialError::Prompt`] if the terminal read fails.
pub fn resolve_credentials<F>(
    config: &Config,
    env: F,
    prompt: &dyn CredentialPrompt,
) -> Result<Credentials, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    let username = match non_empty(config.username.clone()).or_else(|| non_empty(env(USERNAME_ENV))) {
        Some(value) => value,
        None => prompt.prompt_username().map_err(CredentialError::Prompt)?,
    };
    let password = match non_empty(config.password.clone()).or_else(|| non_empty(env(PASSWORD_ENV))) {
        Some(value) => value,
        None => prompt.prompt_password().map_err(CredentialError::Prompt)?,
    };

    let username = username.trim().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(CredentialError::Missing);
    }
    debug!(username = %username, "Resolved login credentials");
    Ok(Credentials { username, password })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedPrompt {
        username: &'static str,
        password: &'static str,
        calls: Cell<u32>,
    }

    impl FixedPrompt {
        fn new(username: &'static str, password: &'static str) -> Self {
            Self {
                username,
                password,
                calls: Cell::new(0),
            }
        }
    }

    impl CredentialPrompt for FixedPrompt {
        fn prompt_username(&self) -> io::Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.username.to_string())
        }

        fn prompt_password(&self) -> io::Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.password.to_string())
        }
    }

    #[test]
    fn test_config_values_take_precedence() {
        let config = Config {
            username: Some("cfg@example.com".to_string()),
            password: Some("cfg-pass".to_string()),
            ..Config::default()
        };
        let prompt = FixedPrompt::new("p", "p");
        let env = |name: &str| Some(format!("env-{name}"));
        let creds = resolve_credentials(&config, env, &prompt).unwrap();
        assert_eq!(creds.username, "cfg@example.com");
        assert_eq!(creds.password(), "cfg-pass");
        assert_eq!(prompt.calls.get(), 0);
    }

    #[test]
    fn test_env_fills_missing_config_values() {
        let config = Config {
            username: Some("cfg@example.com".to_string()),
            ..Config::default()
        };
        let prompt = FixedPrompt::new("p", "p");
        let env = |name: &str| (name == PASSWORD_ENV).then(|| "env-pass".to_string());
        let creds = resolve_credentials(&config, env, &prompt).unwrap();
        assert_eq!(creds.username, "cfg@example.com");
        assert_eq!(creds.password(), "env-pass");
        assert_eq!(prompt.calls.get(), 0);
    }

    #[test]
    fn test_prompt_used_as_last_resort() {
        let prompt = FixedPrompt::new(" typed@example.com ", "typed-pass");
        let creds = resolve_credentials(&Config::default(), |_| None, &prompt).unwrap();
        assert_eq!(creds.username, "typed@example.com");
        assert_eq!(prompt.calls.get(), 2);
    }

    #[test]
    fn test_empty_prompt_answers_fail() {
        let prompt = FixedPrompt::new("", "");
        let result = resolve_credentials(&Config::default(), |_| None, &prompt);
        assert!(matches!(result, Err(CredentialError::Missing)));
    }

    #[test]
    fn test_debug_hides_password() {
        let creds = Credentials::new("user", "secret");
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
