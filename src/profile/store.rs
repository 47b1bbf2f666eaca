use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{AppError, Result};

use super::policy;

/// A profile document on disk, policy-enforced.
#[derive(Debug, Clone)]
pub struct StoredProfile {
    pub name: String,
    pub path: PathBuf,
    pub endpoint: String,
    pub modified: Option<DateTime<Utc>>,
}

/// Durable collection of named tunnel profiles. Every write goes through the
/// split-tunnel rewrite, so on-disk content always carries the operator's
/// allowed-destination set.
pub struct ProfileStore {
    dir: PathBuf,
    allowed_ips: Vec<String>,
}

impl ProfileStore {
    pub fn new(dir: PathBuf, allowed_ips: Vec<String>) -> Self {
        Self { dir, allowed_ips }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.conf", policy::sanitize_name(name)))
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Sanitize the name, rewrite the content per policy, persist with
    /// owner-only permissions.
    pub fn save(&self, name: &str, raw: &str) -> Result<StoredProfile> {
        let name = policy::sanitize_name(name);
        let content = policy::apply_split_tunnel(raw, &self.allowed_ips);
        let path = self.path_for(&name);

        self.ensure_dir()?;
        fs::write(&path, &content)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        info!(profile = %name, path = %path.display(), "profile_saved");

        Ok(StoredProfile {
            endpoint: policy::extract_endpoint(&content),
            modified: modified_time(&path),
            name,
            path,
        })
    }

    /// Same rewrite-and-persist as `save`, but the profile must already exist.
    pub fn update(&self, name: &str, raw: &str) -> Result<StoredProfile> {
        if !self.exists(name) {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        self.save(name, raw)
    }

    /// Read stored content. With `sanitize` the private key value is
    /// replaced by a redaction marker; this is the only variant that may be
    /// exposed to untrusted readers.
    pub fn content(&self, name: &str, sanitize: bool) -> Result<String> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        if sanitize {
            Ok(policy::redact_private_key(&content))
        } else {
            Ok(content)
        }
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(AppError::ProfileNotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        info!(profile = %policy::sanitize_name(name), "profile_deleted");
        Ok(())
    }

    /// All stored profiles with extracted endpoint and modification time,
    /// sorted by name. Favorites-first ordering and country/active/favorite
    /// enrichment happen in the lifecycle manager.
    pub fn list(&self) -> Result<Vec<StoredProfile>> {
        let mut profiles = Vec::new();
        if !self.dir.exists() {
            return Ok(profiles);
        }

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("conf") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            profiles.push(StoredProfile {
                name: name.to_string(),
                endpoint: policy::extract_endpoint(&content),
                modified: modified_time(&path),
                path,
            });
        }

        profiles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(profiles)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))?;
        }
        Ok(())
    }
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let mtime = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(mtime))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
[Interface]
PrivateKey = c2VjcmV0
DNS = 1.1.1.1

[Peer]
PublicKey = cHVi
AllowedIPs = 0.0.0.0/0
Endpoint = 198.51.100.1:51820
";

    fn store(dir: &Path) -> ProfileStore {
        ProfileStore::new(dir.to_path_buf(), vec!["185.34.0.0/16".to_string()])
    }

    #[test]
    fn save_enforces_policy_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let saved = store.save("eu1", RAW).unwrap();
        assert_eq!(saved.name, "eu1");
        assert_eq!(saved.endpoint, "198.51.100.1:51820");

        let on_disk = fs::read_to_string(&saved.path).unwrap();
        assert!(on_disk.contains("AllowedIPs = 185.34.0.0/16"));
        assert!(on_disk.contains("# DNS = 1.1.1.1"));
        assert!(!on_disk.contains("AllowedIPs = 0.0.0.0/0"));

        let mode = fs::metadata(&saved.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_sanitizes_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let saved = store.save("../evil name.conf", RAW).unwrap();
        assert_eq!(saved.name, "___evil_name");
        assert!(saved.path.starts_with(dir.path()));
    }

    #[test]
    fn update_missing_profile_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store.update("ghost", RAW).unwrap_err();
        assert!(matches!(err, AppError::ProfileNotFound(_)));
    }

    #[test]
    fn content_sanitized_hides_private_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save("eu1", RAW).unwrap();

        let sanitized = store.content("eu1", true).unwrap();
        assert!(sanitized.contains("PrivateKey = [HIDDEN]"));
        assert!(!sanitized.contains("c2VjcmV0"));

        let full = store.content("eu1", false).unwrap();
        assert!(full.contains("PrivateKey = c2VjcmV0"));
    }

    #[test]
    fn delete_missing_profile_leaves_listing_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save("eu1", RAW).unwrap();

        let err = store.delete("ghost").unwrap_err();
        assert!(matches!(err, AppError::ProfileNotFound(_)));

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "eu1");
    }

    #[test]
    fn list_sorts_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save("Zeta", RAW).unwrap();
        store.save("alpha", RAW).unwrap();
        store.save("Mike", RAW).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "Mike", "Zeta"]);
    }

    #[test]
    fn list_on_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }
}
