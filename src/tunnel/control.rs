use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Wrapper around the external tunnel tools for one fixed interface.
pub struct TunnelControl {
    interface: String,
    wg_quick: String,
    wg: String,
    daemon_dir: PathBuf,
}

impl TunnelControl {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            interface: config.interface.clone(),
            wg_quick: config.wg_quick_cmd.clone(),
            wg: config.wg_cmd.clone(),
            daemon_dir: config.daemon_config_dir.clone(),
        }
    }

    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Install the policy-enforced profile where the tunnel daemon expects
    /// it, with owner-only permissions.
    pub fn install_profile(&self, content: &str) -> Result<PathBuf> {
        if !self.daemon_dir.exists() {
            fs::create_dir_all(&self.daemon_dir)?;
        }
        let path = self.daemon_dir.join(format!("{}.conf", self.interface));
        fs::write(&path, content)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        debug!(path = %path.display(), "daemon_config_installed");
        Ok(path)
    }

    /// Bring the interface up. Non-zero exit is fatal for the caller.
    pub async fn up(&self) -> Result<()> {
        self.run_wg_quick("up").await
    }

    /// Bring the interface down. The daemon reports an error when the
    /// interface is already down; callers treat any failure as best-effort.
    pub async fn down(&self) -> Result<()> {
        self.run_wg_quick("down").await
    }

    /// Live link state for the interface. A non-zero exit (or a missing
    /// tool) means "not running", which is a normal outcome, not an error.
    pub async fn show(&self) -> Option<String> {
        let output = Command::new(&self.wg)
            .args(["show", &self.interface])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_wg_quick(&self, action: &str) -> Result<()> {
        let output = Command::new(&self.wg_quick)
            .args([action, &self.interface])
            .output()
            .await
            .map_err(|e| {
                AppError::Command(format!("failed to run {} {}: {}", self.wg_quick, action, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Command(format!(
                "{} {} {} failed: {}",
                self.wg_quick,
                action,
                self.interface,
                stderr.trim()
            )));
        }

        info!(action, interface = %self.interface, "wg_quick_succeeded");
        Ok(())
    }
}
