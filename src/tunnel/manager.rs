use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::geoip::{CountryInfo, GeoIpCache};
use crate::profile::{policy, ProfileStore, StoredProfile};
use crate::state::{CustomNames, Favorites, HistoryAction, HistoryLog};

use super::control::TunnelControl;
use super::status::TunnelStatus;

/// A profile as presented to callers: store entry enriched with auxiliary
/// state and the country annotation.
#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub name: String,
    pub display_name: Option<String>,
    pub endpoint: String,
    pub country: CountryInfo,
    pub modified: Option<DateTime<Utc>>,
    pub active: bool,
    pub favorite: bool,
}

/// Owner of the active-tunnel state.
///
/// Exactly one transition (start/stop/restart/switch) runs at a time: the
/// mutex around `active` is held across the external process call and the
/// state update, and released on every exit path. Reads (status, listing,
/// favorites, history) do not take it beyond a snapshot of the active name.
pub struct TunnelManager {
    store: ProfileStore,
    control: TunnelControl,
    history: HistoryLog,
    geoip: GeoIpCache,
    favorites: Favorites,
    names: CustomNames,
    firewall_script: PathBuf,
    active_path: PathBuf,
    active: Mutex<Option<String>>,
}

/// Persisted form of the active-tunnel state, so a fresh process agrees
/// with whatever the previous invocation left running.
#[derive(Debug, Serialize, Deserialize)]
struct ActiveState {
    profile: String,
}

impl TunnelManager {
    pub fn new(config: &AppConfig) -> Self {
        let active_path = config.state_dir.join("active.json");
        Self {
            store: ProfileStore::new(config.profiles_dir(), config.allowed_ips.clone()),
            control: TunnelControl::new(config),
            history: HistoryLog::new(config.history_path()),
            geoip: GeoIpCache::open(config.geoip_cache_path()),
            favorites: Favorites::new(config.favorites_path()),
            names: CustomNames::new(config.custom_names_path()),
            firewall_script: config.firewall_script_path(),
            active: Mutex::new(load_active(&active_path)),
            active_path,
        }
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn geoip(&self) -> &GeoIpCache {
        &self.geoip
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn names(&self) -> &CustomNames {
        &self.names
    }

    pub async fn active_profile(&self) -> Option<String> {
        self.active.lock().await.clone()
    }

    /// Bring up `name`, stopping any currently active profile first.
    pub async fn start(&self, name: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        self.start_locked(&mut active, name).await
    }

    /// Starting a new profile implicitly stops the old one.
    pub async fn switch(&self, name: &str) -> Result<()> {
        self.start(name).await
    }

    /// Idempotent; always ends inactive. A failing down-call is expected
    /// when the interface is already gone and is not surfaced.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.stop_locked(&mut active).await;
    }

    /// Re-read the active profile from the store and bring it up again, so
    /// an in-place edit takes effect. No-op when inactive.
    pub async fn restart(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        let Some(name) = active.clone() else {
            return Ok(());
        };
        self.start_locked(&mut active, &name).await
    }

    async fn start_locked(&self, active: &mut Option<String>, name: &str) -> Result<()> {
        // NotFound leaves the current state untouched.
        let content = self.store.content(name, false)?;

        self.stop_locked(active).await;

        self.control.install_profile(&content)?;
        self.control.up().await?;
        let name = policy::sanitize_name(name);
        *active = Some(name.clone());
        self.persist_active(active);
        info!(profile = %name, "tunnel_started");

        let endpoint = policy::extract_endpoint(&content);
        let country = if endpoint == "Unknown" {
            CountryInfo::unknown()
        } else {
            self.geoip.lookup(&endpoint).await
        };
        self.history.append(
            HistoryAction::Connected,
            &name,
            Some(format!("{} ({})", country.name, endpoint)),
        );

        // The tunnel is up regardless of whether the rule refresh worked.
        if let Err(e) = self.refresh_firewall().await {
            warn!(error = %e, "firewall_refresh_failed");
        }

        Ok(())
    }

    async fn stop_locked(&self, active: &mut Option<String>) {
        if let Err(e) = self.control.down().await {
            debug!(error = %e, "tunnel_down_ignored");
        }
        if let Some(name) = active.take() {
            self.persist_active(active);
            self.history.append(HistoryAction::Disconnected, &name, None);
            info!(profile = %name, "tunnel_stopped");
        }
    }

    /// Best-effort write-through of the active-tunnel state.
    fn persist_active(&self, active: &Option<String>) {
        let result = match active {
            Some(profile) => serde_json::to_string(&ActiveState {
                profile: profile.clone(),
            })
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.active_path, json)),
            None => match fs::remove_file(&self.active_path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!(path = %self.active_path.display(), error = %e, "active_state_write_failed");
        }
    }

    /// Run the operator's firewall script if present; no-op otherwise.
    pub async fn refresh_firewall(&self) -> Result<()> {
        if !self.firewall_script.exists() {
            return Ok(());
        }
        let output = Command::new("bash")
            .arg(&self.firewall_script)
            .output()
            .await
            .map_err(|e| AppError::Command(format!("failed to run firewall script: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Command(format!(
                "firewall script {} failed: {}",
                self.firewall_script.display(),
                stderr.trim()
            )));
        }
        info!(script = %self.firewall_script.display(), "firewall_rules_refreshed");
        Ok(())
    }

    /// Store a new profile and refresh the country annotation for its
    /// endpoint, so listings pick up the new location immediately.
    pub async fn import(&self, name: &str, raw: &str) -> Result<StoredProfile> {
        let stored = self.store.save(name, raw)?;
        if stored.endpoint != "Unknown" {
            self.geoip.refresh(&stored.endpoint).await;
        }
        Ok(stored)
    }

    /// Rewrite an existing profile; if it is currently active, restart the
    /// tunnel so the new content takes effect.
    pub async fn update(&self, name: &str, raw: &str) -> Result<StoredProfile> {
        let mut active = self.active.lock().await;
        let stored = self.store.update(name, raw)?;
        if stored.endpoint != "Unknown" {
            self.geoip.refresh(&stored.endpoint).await;
        }
        if active.as_deref() == Some(stored.name.as_str()) {
            self.start_locked(&mut active, &stored.name).await?;
        }
        Ok(stored)
    }

    /// Delete a profile, stopping the tunnel first when it is the active
    /// one (the store itself has no authority to stop anything).
    pub async fn delete(&self, name: &str) -> Result<()> {
        let mut active = self.active.lock().await;
        if !self.store.exists(name) {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        if active.as_deref() == Some(policy::sanitize_name(name).as_str()) {
            self.stop_locked(&mut active).await;
        }
        self.store.delete(name)
    }

    /// All profiles, favorites first, then case-insensitive by name.
    pub async fn list(&self) -> Result<Vec<ProfileListing>> {
        let active = self.active_profile().await;
        let favorites = self.favorites.list();
        let names = self.names.all();

        let mut listings = Vec::new();
        for profile in self.store.list()? {
            let country = if profile.endpoint == "Unknown" {
                CountryInfo::unknown()
            } else {
                self.geoip.lookup(&profile.endpoint).await
            };
            listings.push(ProfileListing {
                display_name: names.get(&profile.name).cloned(),
                favorite: favorites.iter().any(|f| f == &profile.name),
                active: active.as_deref() == Some(profile.name.as_str()),
                name: profile.name,
                endpoint: profile.endpoint,
                modified: profile.modified,
                country,
            });
        }

        listings.sort_by_key(|l| (!l.favorite, l.name.to_lowercase()));
        Ok(listings)
    }

    /// Advisory link state from the external tool, reconciled with the
    /// manager's own notion of the active profile.
    pub async fn status(&self) -> TunnelStatus {
        match self.control.show().await {
            Some(output) => TunnelStatus::from_show_output(
                self.control.interface(),
                self.active_profile().await,
                &output,
            ),
            None => TunnelStatus::inactive(self.control.interface()),
        }
    }
}

fn load_active(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ActiveState>(&text) {
        Ok(state) => Some(state.profile),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "active_state_corrupt");
            None
        }
    }
}
