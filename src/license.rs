//! One-time license acknowledgement before contacting the archive.
//!
//! Acceptance is persisted as a marker file so the notice is shown once per
//! user. Non-interactive runs pass `--accept-license` instead.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

const APP_DIR: &str = "cdvl-crawler";
const MARKER_FILE: &str = "license_accepted";

/// Notice shown before the first crawl or download.
pub const LICENSE_NOTICE: &str = "\
CDVL content is provided for research and development purposes under the
CDVL Database Usage Agreement. By continuing you confirm that you hold a CDVL
account, have accepted that agreement, and will only use downloaded material
as it permits. This tool is not affiliated with cdvl.org.";

/// Remembers whether the user accepted [`LICENSE_NOTICE`].
#[derive(Debug, Clone)]
pub struct LicenseGate {
    marker: Option<PathBuf>,
}

impl LicenseGate {
    /// Gate backed by the per-user config directory, if one can be located.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_dirs(
            std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }

    /// `$XDG_CONFIG_HOME/cdvl-crawler/` wins over `$HOME/.config/cdvl-crawler/`.
    #[must_use]
    pub fn with_dirs(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        let base = xdg_config_home
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| home.map(|h| h.join(".config")));
        Self {
            marker: base.map(|b| b.join(APP_DIR).join(MARKER_FILE)),
        }
    }

    #[must_use]
    pub fn marker_path(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.marker.as_deref().is_some_and(Path::exists)
    }

    /// Asks for acceptance unless already given or `auto_accept` is set.
    ///
    /// The answer is read as one line from `input`; `yes` or `y` accepts and
    /// is persisted, anything else declines.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the prompt cannot be written or read.
    pub fn accept<R: BufRead, W: Write>(
        &self,
        auto_accept: bool,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<bool> {
        if auto_accept {
            debug!("License accepted via flag");
            return Ok(true);
        }
        if self.is_accepted() {
            return Ok(true);
        }

        writeln!(output, "{LICENSE_NOTICE}\n")?;
        write!(output, "Do you accept these terms? [yes/no]: ")?;
        output.flush()?;

        let mut answer = String::new();
        input.read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        if answer != "yes" && answer != "y" {
            info!("License not accepted");
            return Ok(false);
        }

        if let Err(e) = self.persist() {
            warn!(error = %e, "Could not record license acceptance");
        }
        Ok(true)
    }

    fn persist(&self) -> io::Result<()> {
        let Some(marker) = &self.marker else {
            return Ok(());
        };
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(marker, b"accepted\n")?;
        debug!(path = %marker.display(), "Recorded license acceptance");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn gate(dir: &TempDir) -> LicenseGate {
        LicenseGate::with_dirs(Some(dir.path().to_path_buf()), None)
    }

    #[test]
    fn test_marker_prefers_xdg_then_home() {
        let xdg = LicenseGate::with_dirs(Some("/x".into()), Some("/h".into()));
        assert_eq!(
            xdg.marker_path(),
            Some(Path::new("/x/cdvl-crawler/license_accepted"))
        );
        let home = LicenseGate::with_dirs(None, Some("/h".into()));
        assert_eq!(
            home.marker_path(),
            Some(Path::new("/h/.config/cdvl-crawler/license_accepted"))
        );
        assert!(LicenseGate::with_dirs(None, None).marker_path().is_none());
    }

    #[test]
    fn test_yes_is_persisted_and_not_asked_again() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let mut out = Vec::new();

        assert!(gate.accept(false, &mut Cursor::new("Y\n"), &mut out).unwrap());
        assert!(gate.is_accepted());
        assert!(String::from_utf8(out).unwrap().contains("Do you accept"));

        let mut out = Vec::new();
        assert!(gate.accept(false, &mut Cursor::new(""), &mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_decline_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let accepted = gate
            .accept(false, &mut Cursor::new("no\n"), &mut Vec::new())
            .unwrap();
        assert!(!accepted);
        assert!(!gate.is_accepted());
    }

    #[test]
    fn test_auto_accept_skips_prompt() {
        let dir = TempDir::new().unwrap();
        let gate = gate(&dir);
        let mut out = Vec::new();
        assert!(gate.accept(true, &mut Cursor::new(""), &mut out).unwrap());
        assert!(out.is_empty());
        assert!(!gate.is_accepted());
    }
}
