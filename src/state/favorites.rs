use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

/// Favorite profile names, persisted as a JSON array. References are by
/// name only; deleting a profile leaves any favorite entry dangling, which
/// simply stops matching a listed profile.
pub struct Favorites {
    path: PathBuf,
}

impl Favorites {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Current favorites. Missing or corrupt file reads as empty.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                debug!(path = %self.path.display(), error = %e, "favorites_corrupt");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.list().iter().any(|n| n == name)
    }

    pub fn add(&self, name: &str) {
        let mut favorites = self.list();
        if favorites.iter().any(|n| n == name) {
            return;
        }
        favorites.push(name.to_string());
        self.save(&favorites);
    }

    /// No-op when the entry is absent.
    pub fn remove(&self, name: &str) {
        let mut favorites = self.list();
        let before = favorites.len();
        favorites.retain(|n| n != name);
        if favorites.len() != before {
            self.save(&favorites);
        }
    }

    fn save(&self, favorites: &[String]) {
        let result = serde_json::to_string(favorites)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "favorites_write_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorites_at(dir: &tempfile::TempDir) -> Favorites {
        Favorites::new(dir.path().join("favorites.json"))
    }

    #[test]
    fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let favorites = favorites_at(&dir);

        favorites.add("eu1");
        favorites.add("eu1");
        assert_eq!(favorites.list(), vec!["eu1"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let favorites = favorites_at(&dir);

        favorites.remove("ghost");
        assert!(favorites.list().is_empty());

        favorites.add("eu1");
        favorites.remove("eu1");
        assert!(!favorites.contains("eu1"));
    }

    #[test]
    fn corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("favorites.json"), "[[[").unwrap();
        let favorites = favorites_at(&dir);
        assert!(favorites.list().is_empty());
    }
}
