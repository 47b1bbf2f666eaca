//! Advisory link-state inspection.
//!
//! Parses `wg show` free text. Values here never feed back into the
//! lifecycle manager's active state; a parse mismatch leaves the field
//! empty instead of failing the call.

use serde::Serialize;

const PEER_PREFIX_LEN: usize = 16;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TunnelStatus {
    pub active: bool,
    pub profile: Option<String>,
    pub interface: String,
    pub peer: Option<String>,
    pub endpoint: Option<String>,
    pub latest_handshake: Option<String>,
    pub transfer_rx: Option<String>,
    pub transfer_tx: Option<String>,
}

impl TunnelStatus {
    #[must_use]
    pub fn inactive(interface: &str) -> Self {
        Self {
            interface: interface.to_string(),
            ..Self::default()
        }
    }

    /// Build an active status from `wg show` output.
    #[must_use]
    pub fn from_show_output(interface: &str, profile: Option<String>, output: &str) -> Self {
        let mut status = Self {
            active: true,
            profile,
            interface: interface.to_string(),
            ..Self::default()
        };

        for line in output.lines() {
            let trimmed = line.trim();
            if let Some(value) = value_after(trimmed, "peer:") {
                status.peer = Some(truncate_peer(value));
            } else if let Some(value) = value_after(trimmed, "endpoint:") {
                status.endpoint = Some(value.to_string());
            } else if let Some(value) = value_after(trimmed, "latest handshake:") {
                status.latest_handshake = Some(value.to_string());
            } else if let Some(value) = value_after(trimmed, "transfer:") {
                let (rx, tx) = parse_transfer(value);
                status.transfer_rx = rx;
                status.transfer_tx = tx;
            }
        }

        status
    }
}

fn value_after<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix).map(str::trim)
}

/// Truncate the peer public key for display.
fn truncate_peer(peer: &str) -> String {
    if peer.len() > PEER_PREFIX_LEN {
        format!("{}...", &peer[..PEER_PREFIX_LEN])
    } else {
        peer.to_string()
    }
}

/// "1.21 MiB received, 866.49 KiB sent" -> (rx, tx).
fn parse_transfer(value: &str) -> (Option<String>, Option<String>) {
    let mut rx = None;
    let mut tx = None;
    for part in value.split(',') {
        let part = part.trim();
        if let Some(amount) = part.strip_suffix("received") {
            rx = Some(amount.trim().to_string());
        } else if let Some(amount) = part.strip_suffix("sent") {
            tx = Some(amount.trim().to_string());
        }
    }
    (rx, tx)
}
