//! Text transforms over the WireGuard .conf format.
//!
//! Every stored profile is rewritten so the operator's routing policy wins:
//! the peer AllowedIPs list is replaced wholesale and DNS directives are
//! commented out (kept visible for inspection, disabled in effect).

/// Replace every char outside [A-Za-z0-9_-] with '_'. A trailing `.conf`
/// extension is stripped first so uploads keep a clean stem.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let stem = name.strip_suffix(".conf").unwrap_or(name);
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Rewrite `content` to enforce the split-tunnel policy.
///
/// Inside a `[Peer]` section an AllowedIPs line (key match is
/// case-insensitive) is replaced with the operator-configured set. A DNS
/// line anywhere is commented out. Everything else passes through unchanged,
/// including keys and peer identity.
#[must_use]
pub fn apply_split_tunnel(content: &str, allowed_ips: &[String]) -> String {
    let mut out = Vec::new();
    let mut in_peer = false;

    for line in content.lines() {
        let stripped = line.trim();

        if stripped.starts_with('[') && stripped.ends_with(']') {
            in_peer = stripped.eq_ignore_ascii_case("[peer]");
            out.push(line.to_string());
            continue;
        }

        match key_of(stripped) {
            Some(key) if in_peer && key.eq_ignore_ascii_case("allowedips") => {
                out.push(format!("AllowedIPs = {}", allowed_ips.join(", ")));
            }
            Some(key) if key.eq_ignore_ascii_case("dns") => {
                out.push(format!("# {}", line));
            }
            _ => out.push(line.to_string()),
        }
    }

    out.join("\n")
}

/// Replace the private key value with a redaction marker.
#[must_use]
pub fn redact_private_key(content: &str) -> String {
    content
        .lines()
        .map(|line| match key_of(line.trim()) {
            Some(key) if key.eq_ignore_ascii_case("privatekey") => {
                "PrivateKey = [HIDDEN]".to_string()
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the peer endpoint (host:port) from a profile, or "Unknown".
#[must_use]
pub fn extract_endpoint(content: &str) -> String {
    for line in content.lines() {
        let stripped = line.trim();
        if let Some(key) = key_of(stripped) {
            if key.eq_ignore_ascii_case("endpoint") {
                if let Some((_, value)) = stripped.split_once('=') {
                    if let Some(endpoint) = value.split_whitespace().next() {
                        return endpoint.to_string();
                    }
                }
            }
        }
    }
    "Unknown".to_string()
}

fn key_of(line: &str) -> Option<&str> {
    line.split_once('=').map(|(key, _)| key.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "\
[Interface]
PrivateKey = cFRzNnhVcGRkSzlCUGRGTUpiUTJtYlZZSUxPbmJJaz0=
Address = 10.2.0.2/32
DNS = 1.1.1.1

[Peer]
PublicKey = c2VydmVyLXB1YmxpYy1rZXk=
AllowedIPs = 0.0.0.0/0
Endpoint = 198.51.100.1:51820
";

    fn allowed() -> Vec<String> {
        vec!["185.34.0.0/16".to_string()]
    }

    #[test]
    fn allowed_ips_replaced_inside_peer_section() {
        let rewritten = apply_split_tunnel(PROFILE, &allowed());
        assert!(rewritten.contains("AllowedIPs = 185.34.0.0/16"));
        assert!(!rewritten.contains("0.0.0.0/0"));
    }

    #[test]
    fn dns_commented_out_not_removed() {
        let rewritten = apply_split_tunnel(PROFILE, &allowed());
        assert!(rewritten.contains("# DNS = 1.1.1.1"));
    }

    #[test]
    fn eu1_upload_scenario() {
        let rewritten = apply_split_tunnel(PROFILE, &allowed());
        assert!(rewritten.contains("AllowedIPs = 185.34.0.0/16"));
        assert!(rewritten.contains("# DNS = 1.1.1.1"));
        // Cryptographic material and peer identity are untouched.
        assert!(rewritten.contains("PrivateKey = cFRzNnhVcGRkSzlCUGRGTUpiUTJtYlZZSUxPbmJJaz0="));
        assert!(rewritten.contains("PublicKey = c2VydmVyLXB1YmxpYy1rZXk="));
        assert!(rewritten.contains("Endpoint = 198.51.100.1:51820"));
    }

    #[test]
    fn allowed_ips_outside_peer_section_untouched() {
        let content = "[Interface]\nAllowedIPs = 0.0.0.0/0\n";
        let rewritten = apply_split_tunnel(content, &allowed());
        assert!(rewritten.contains("AllowedIPs = 0.0.0.0/0"));
    }

    #[test]
    fn key_match_is_case_insensitive() {
        let content = "[Peer]\nallowedips = 0.0.0.0/0\ndns = 9.9.9.9\n";
        let rewritten = apply_split_tunnel(content, &allowed());
        assert!(rewritten.contains("AllowedIPs = 185.34.0.0/16"));
        assert!(rewritten.contains("# dns = 9.9.9.9"));
    }

    #[test]
    fn later_section_closes_peer_tracking() {
        let content = "[Peer]\nPublicKey = x\n[Interface]\nAllowedIPs = 10.0.0.0/8\n";
        let rewritten = apply_split_tunnel(content, &allowed());
        // The AllowedIPs after [Interface] is outside the peer section.
        assert!(rewritten.contains("AllowedIPs = 10.0.0.0/8"));
    }

    #[test]
    fn multiple_allowed_ips_comma_joined() {
        let set = vec!["10.0.0.0/8".to_string(), "172.16.0.0/12".to_string()];
        let rewritten = apply_split_tunnel("[Peer]\nAllowedIPs = 0.0.0.0/0\n", &set);
        assert!(rewritten.contains("AllowedIPs = 10.0.0.0/8, 172.16.0.0/12"));
    }

    #[test]
    fn private_key_redacted() {
        let redacted = redact_private_key(PROFILE);
        assert!(redacted.contains("PrivateKey = [HIDDEN]"));
        assert!(!redacted.contains("cFRzNnhVcGRkSzlCUGRGTUpiUTJtYlZZSUxPbmJJaz0="));
        // Other keys survive.
        assert!(redacted.contains("PublicKey = c2VydmVyLXB1YmxpYy1rZXk="));
    }

    #[test]
    fn endpoint_extracted() {
        assert_eq!(extract_endpoint(PROFILE), "198.51.100.1:51820");
    }

    #[test]
    fn missing_endpoint_is_unknown() {
        assert_eq!(extract_endpoint("[Interface]\nAddress = 10.0.0.2/32\n"), "Unknown");
    }

    #[test]
    fn name_sanitized() {
        assert_eq!(sanitize_name("eu1.conf"), "eu1");
        assert_eq!(sanitize_name("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_name("my server #2"), "my_server__2");
        assert_eq!(sanitize_name("de-fra_01"), "de-fra_01");
    }
}
