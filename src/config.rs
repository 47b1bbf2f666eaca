use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/tunswitch/config.yaml";

/// Application settings, loaded from a YAML file. Every field has a default
/// so a missing or partial file still yields a usable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Local WireGuard interface identifier used for wg-quick up/down.
    pub interface: String,

    /// Destination subnets routed through the tunnel. Uploaded profiles have
    /// their AllowedIPs rewritten to exactly this set.
    pub allowed_ips: Vec<String>,

    /// Directory holding stored profiles and JSON side-files.
    pub state_dir: PathBuf,

    /// Directory where the active profile is installed for the tunnel daemon.
    pub daemon_config_dir: PathBuf,

    pub wg_quick_cmd: String,
    pub wg_cmd: String,

    /// Optional firewall refresh script. Defaults to <state_dir>/firewall.sh.
    pub firewall_script: Option<PathBuf>,

    /// Bring up this profile when the `run` command starts.
    pub autostart: bool,
    pub autostart_profile: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interface: "tunswitch".to_string(),
            allowed_ips: vec!["185.34.0.0/16".to_string()],
            state_dir: PathBuf::from("/etc/tunswitch"),
            daemon_config_dir: PathBuf::from("/etc/wireguard"),
            wg_quick_cmd: "wg-quick".to_string(),
            wg_cmd: "wg".to_string(),
            firewall_script: None,
            autostart: false,
            autostart_profile: String::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load settings from `path`. A missing file is normal; an unreadable or
    /// malformed file is reported and falls back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(text) => match serde_yaml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config_parse_failed");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config_read_failed");
                Self::default()
            }
        }
    }

    /// Directory for stored profile documents: <state_dir>/profiles/
    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.state_dir.join("profiles")
    }

    #[must_use]
    pub fn geoip_cache_path(&self) -> PathBuf {
        self.state_dir.join("geoip_cache.json")
    }

    #[must_use]
    pub fn favorites_path(&self) -> PathBuf {
        self.state_dir.join("favorites.json")
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.state_dir.join("connection_history.json")
    }

    #[must_use]
    pub fn custom_names_path(&self) -> PathBuf {
        self.state_dir.join("custom_names.json")
    }

    #[must_use]
    pub fn firewall_script_path(&self) -> PathBuf {
        self.firewall_script
            .clone()
            .unwrap_or_else(|| self.state_dir.join("firewall.sh"))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.state_dir, &self.profiles_dir()] {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.interface, "tunswitch");
        assert_eq!(config.allowed_ips, vec!["185.34.0.0/16".to_string()]);
        assert!(!config.autostart);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "interface: wg-lobby").unwrap();
        writeln!(f, "allowed_ips:").unwrap();
        writeln!(f, "  - 10.0.0.0/8").unwrap();
        writeln!(f, "  - 172.16.0.0/12").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.interface, "wg-lobby");
        assert_eq!(config.allowed_ips.len(), 2);
        // Untouched fields keep their defaults.
        assert_eq!(config.wg_quick_cmd, "wg-quick");
    }

    #[test]
    fn malformed_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "interface: [unclosed").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.interface, "tunswitch");
    }

    #[test]
    fn firewall_script_defaults_under_state_dir() {
        let config = AppConfig::default();
        assert_eq!(
            config.firewall_script_path(),
            PathBuf::from("/etc/tunswitch/firewall.sh")
        );
    }
}
