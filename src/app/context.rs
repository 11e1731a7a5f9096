//! Shared setup for network commands: license gate, config, login.

use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};
use cdvl_crawler::config::{TerminalPrompt, env_var_non_empty, resolve_config_path};
use cdvl_crawler::{
    Config, ConfigLayer, LicenseGate, Session, load_config, login, resolve_credentials,
};
use tracing::info;

/// Per-run flags shared by every subcommand.
#[derive(Debug, Clone)]
pub(crate) struct RunContext<'a> {
    pub config_path: Option<&'a Path>,
    pub accept_license: bool,
    pub show_progress: bool,
}

impl RunContext<'_> {
    /// Fails unless the license was accepted now or on an earlier run.
    pub(crate) fn ensure_license(&self) -> Result<()> {
        let gate = LicenseGate::from_env();
        let accepted = gate
            .accept(
                self.accept_license,
                &mut io::stdin().lock(),
                &mut io::stderr(),
            )
            .context("Failed to read license answer")?;
        if !accepted {
            let hint = if io::stdin().is_terminal() {
                ""
            } else {
                "\n  Use --accept-license for non-interactive runs"
            };
            bail!("License terms not accepted{hint}");
        }
        Ok(())
    }

    /// Loads every config layer with `overrides` on top.
    pub(crate) fn load_config(&self, overrides: ConfigLayer) -> Result<Config> {
        let cwd = std::env::current_dir().context("Cannot determine working directory")?;
        let path = resolve_config_path(self.config_path, &cwd);
        load_config(path.as_deref(), overrides).context("Invalid configuration")
    }

    /// Resolves credentials, then logs in once.
    pub(crate) async fn open_session(&self, config: Config) -> Result<Session> {
        let credentials = resolve_credentials(&config, env_var_non_empty, &TerminalPrompt)?;
        let session = Session::new(config)?;
        login(&session, &credentials).await?;
        info!(username = %credentials.username, "Logged in");
        Ok(session)
    }
}
