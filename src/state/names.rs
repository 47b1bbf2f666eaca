use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

/// Optional display names for profiles, keyed by profile name.
pub struct CustomNames {
    path: PathBuf,
}

impl CustomNames {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Full map. Missing or corrupt file reads as empty.
    #[must_use]
    pub fn all(&self) -> BTreeMap<String, String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!(path = %self.path.display(), error = %e, "custom_names_corrupt");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, profile: &str) -> Option<String> {
        self.all().get(profile).cloned()
    }

    pub fn set(&self, profile: &str, display_name: &str) {
        let mut names = self.all();
        names.insert(profile.to_string(), display_name.to_string());
        self.save(&names);
    }

    pub fn remove(&self, profile: &str) {
        let mut names = self.all();
        if names.remove(profile).is_some() {
            self.save(&names);
        }
    }

    fn save(&self, names: &BTreeMap<String, String>) {
        let result = serde_json::to_string(names)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "custom_names_write_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let names = CustomNames::new(dir.path().join("custom_names.json"));

        names.set("eu1", "Frankfurt");
        assert_eq!(names.get("eu1").as_deref(), Some("Frankfurt"));

        names.set("eu1", "Frankfurt #1");
        assert_eq!(names.get("eu1").as_deref(), Some("Frankfurt #1"));

        names.remove("eu1");
        assert!(names.get("eu1").is_none());
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom_names.json");
        fs::write(&path, "42").unwrap();
        assert!(CustomNames::new(path).all().is_empty());
    }
}
