//! Country annotation for tunnel endpoints.
//!
//! Results are cached by resolved IP in a JSON side-file so repeated
//! listings do not re-run DNS and HTTP round trips. A cached unknown result
//! is never a satisfying hit: it is kept on disk (so it can be bulk-dropped)
//! but every lookup tries the provider chain again until a real answer
//! arrives.

pub mod flags;
pub mod providers;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use providers::PROVIDER_CHAIN;

pub const UNKNOWN_CODE: &str = "??";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub code: String,
    pub name: String,
    pub flag: String,
}

impl CountryInfo {
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            code: UNKNOWN_CODE.to_string(),
            name: "Unknown".to_string(),
            flag: flags::flag_for(UNKNOWN_CODE).to_string(),
        }
    }

    #[must_use]
    pub fn for_code(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            flag: flags::flag_for(code).to_string(),
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.code == UNKNOWN_CODE
    }
}

/// Durable IP -> country cache with multi-provider fallback on miss.
pub struct GeoIpCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, CountryInfo>>,
    client: reqwest::Client,
}

impl GeoIpCache {
    /// Open the cache, loading existing entries. A missing or corrupt file
    /// starts empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "geoip_cache_corrupt");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            entries: Mutex::new(entries),
            client: reqwest::Client::new(),
        }
    }

    /// Resolve `endpoint` (host or host:port) to a country annotation.
    ///
    /// Hostname resolution failure short-circuits to the unknown sentinel
    /// without touching providers or the cache. Provider calls happen
    /// outside the map lock.
    pub async fn lookup(&self, endpoint: &str) -> CountryInfo {
        let host = host_of(endpoint);

        let ip = if is_ipv4_literal(host) {
            host.to_string()
        } else {
            match resolve_host(host).await {
                Some(ip) => ip,
                None => {
                    debug!(host, "geoip_resolve_failed");
                    return CountryInfo::unknown();
                }
            }
        };

        if let Some(hit) = self.satisfying_hit(&ip) {
            return hit;
        }

        for provider in PROVIDER_CHAIN {
            match providers::fetch(&self.client, provider, &ip).await {
                Ok(Some((code, name))) => {
                    let info = CountryInfo::for_code(&code, &name);
                    info!(ip = %ip, provider = provider.name(), code = %info.code, "geoip_resolved");
                    self.insert(&ip, info.clone());
                    return info;
                }
                Ok(None) => {
                    debug!(ip = %ip, provider = provider.name(), "geoip_provider_no_result");
                }
                Err(e) => {
                    debug!(ip = %ip, provider = provider.name(), error = %e, "geoip_provider_failed");
                }
            }
        }

        // Remember the failure so `geoip refresh` can count it, but the
        // sentinel never satisfies a later lookup.
        let unknown = CountryInfo::unknown();
        self.insert(&ip, unknown.clone());
        unknown
    }

    /// Invalidate the cached entry for `endpoint` and look it up again.
    /// Used when a profile is created or updated so the annotation follows
    /// the new endpoint.
    pub async fn refresh(&self, endpoint: &str) -> CountryInfo {
        let host = host_of(endpoint);
        let ip = if is_ipv4_literal(host) {
            host.to_string()
        } else {
            match resolve_host(host).await {
                Some(ip) => ip,
                None => return CountryInfo::unknown(),
            }
        };
        self.invalidate(&ip);
        self.lookup(&ip).await
    }

    /// Drop one entry, forcing the next lookup to re-query providers.
    pub fn invalidate(&self, ip: &str) {
        let mut entries = self.entries.lock().expect("geoip cache lock poisoned");
        if entries.remove(ip).is_some() {
            self.flush(&entries);
        }
    }

    /// Drop every unknown-sentinel entry; returns how many were removed.
    pub fn invalidate_unknown(&self) -> usize {
        let mut entries = self.entries.lock().expect("geoip cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, info| !info.is_unknown());
        let removed = before - entries.len();
        if removed > 0 {
            self.flush(&entries);
        }
        removed
    }

    fn satisfying_hit(&self, ip: &str) -> Option<CountryInfo> {
        let entries = self.entries.lock().expect("geoip cache lock poisoned");
        entries.get(ip).filter(|info| !info.is_unknown()).cloned()
    }

    fn insert(&self, ip: &str, info: CountryInfo) {
        let mut entries = self.entries.lock().expect("geoip cache lock poisoned");
        entries.insert(ip.to_string(), info);
        self.flush(&entries);
    }

    /// Write-through; a failed write degrades to in-memory only.
    fn flush(&self, entries: &HashMap<String, CountryInfo>) {
        let result = serde_json::to_string(entries)
            .map_err(std::io::Error::other)
            .and_then(|json| fs::write(&self.path, json));
        if let Err(e) = result {
            debug!(path = %self.path.display(), error = %e, "geoip_cache_write_failed");
        }
    }
}

fn host_of(endpoint: &str) -> &str {
    endpoint.split(':').next().unwrap_or(endpoint)
}

fn is_ipv4_literal(host: &str) -> bool {
    host.parse::<std::net::Ipv4Addr>().is_ok()
}

/// System resolver, first IPv4 answer.
async fn resolve_host(host: &str) -> Option<String> {
    tokio::net::lookup_host((host, 0))
        .await
        .ok()?
        .find(|addr| addr.is_ipv4())
        .map(|addr| addr.ip().to_string())
}
