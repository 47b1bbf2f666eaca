//! Fallback chain of public GeoIP lookup services.
//!
//! Free-tier services are individually unreliable, so lookups walk an
//! ordered chain and accept the first usable answer. Each provider has its
//! own success-detection rule; transport and parse failures just move on to
//! the next entry.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::Result;

pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoProvider {
    IpApi,
    IpWhoIs,
    IpInfo,
}

/// Providers are tried in this order.
pub const PROVIDER_CHAIN: [GeoProvider; 3] =
    [GeoProvider::IpApi, GeoProvider::IpWhoIs, GeoProvider::IpInfo];

impl GeoProvider {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            GeoProvider::IpApi => "ip-api.com",
            GeoProvider::IpWhoIs => "ipwho.is",
            GeoProvider::IpInfo => "ipinfo.io",
        }
    }

    #[must_use]
    pub fn url(self, ip: &str) -> String {
        match self {
            GeoProvider::IpApi => format!(
                "http://ip-api.com/json/{}?fields=status,country,countryCode",
                ip
            ),
            GeoProvider::IpWhoIs => format!("https://ipwho.is/{}", ip),
            GeoProvider::IpInfo => format!("https://ipinfo.io/{}/json", ip),
        }
    }

    /// Apply this provider's success rule and pull out (code, name).
    /// Returns None when the response is well-formed but unusable.
    #[must_use]
    pub fn parse(self, body: &Value) -> Option<(String, String)> {
        match self {
            // Explicit status field.
            GeoProvider::IpApi => {
                if body.get("status").and_then(Value::as_str) != Some("success") {
                    return None;
                }
                let code = nonempty_str(body, "countryCode")?;
                let name = nonempty_str(body, "country").unwrap_or_else(|| code.clone());
                Some((code, name))
            }
            // Success boolean.
            GeoProvider::IpWhoIs => {
                if body.get("success").and_then(Value::as_bool) != Some(true) {
                    return None;
                }
                let code = nonempty_str(body, "country_code")?;
                let name = nonempty_str(body, "country").unwrap_or_else(|| code.clone());
                Some((code, name))
            }
            // No status field; absence of "error" plus a country code.
            GeoProvider::IpInfo => {
                if body.get("error").is_some() {
                    return None;
                }
                let code = nonempty_str(body, "country")?;
                Some((code.clone(), code))
            }
        }
    }
}

/// Query one provider. `Ok(None)` means the provider answered but had no
/// usable country; transport errors surface so the caller can log and fall
/// through to the next provider.
pub async fn fetch(
    client: &Client,
    provider: GeoProvider,
    ip: &str,
) -> Result<Option<(String, String)>> {
    let response = client
        .get(provider.url(ip))
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let body: Value = response.json().await?;
    Ok(provider.parse(&body))
}

fn nonempty_str(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ip_api_requires_success_status() {
        let ok = json!({"status": "success", "countryCode": "DE", "country": "Germany"});
        assert_eq!(
            GeoProvider::IpApi.parse(&ok),
            Some(("DE".to_string(), "Germany".to_string()))
        );

        let failed = json!({"status": "fail", "countryCode": "DE"});
        assert_eq!(GeoProvider::IpApi.parse(&failed), None);
    }

    #[test]
    fn ip_api_rejects_empty_country_code() {
        let body = json!({"status": "success", "countryCode": "", "country": "Germany"});
        assert_eq!(GeoProvider::IpApi.parse(&body), None);
    }

    #[test]
    fn ipwhois_requires_success_boolean() {
        let ok = json!({"success": true, "country_code": "SE", "country": "Sweden"});
        assert_eq!(
            GeoProvider::IpWhoIs.parse(&ok),
            Some(("SE".to_string(), "Sweden".to_string()))
        );

        let failed = json!({"success": false, "country_code": "SE"});
        assert_eq!(GeoProvider::IpWhoIs.parse(&failed), None);
    }

    #[test]
    fn ipinfo_rejects_error_payload() {
        let ok = json!({"ip": "203.0.113.4", "country": "US"});
        assert_eq!(
            GeoProvider::IpInfo.parse(&ok),
            Some(("US".to_string(), "US".to_string()))
        );

        let failed = json!({"error": {"title": "Wrong ip"}, "country": "US"});
        assert_eq!(GeoProvider::IpInfo.parse(&failed), None);
    }

    #[test]
    fn chain_order_is_fixed() {
        assert_eq!(
            PROVIDER_CHAIN,
            [GeoProvider::IpApi, GeoProvider::IpWhoIs, GeoProvider::IpInfo]
        );
    }
}
