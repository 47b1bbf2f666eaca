use std::path::Path;

use tracing::warn;

use crate::cli::{Command, FavoriteAction, GeoipAction};
use crate::config::AppConfig;
use crate::tunnel::TunnelManager;

pub async fn run(command: Command, config: AppConfig) -> anyhow::Result<()> {
    config.ensure_dirs()?;
    let manager = TunnelManager::new(&config);

    match command {
        Command::Up { profile } => {
            manager.start(&profile).await?;
            println!("Connected {}", profile);
        }

        Command::Switch { profile } => {
            manager.switch(&profile).await?;
            println!("Connected {}", profile);
        }

        Command::Down => {
            manager.stop().await;
            println!("Disconnected.");
        }

        Command::Restart => {
            if manager.active_profile().await.is_none() {
                println!("Not connected.");
            } else {
                manager.restart().await?;
                println!("Restarted.");
            }
        }

        Command::Status => {
            let status = manager.status().await;
            if !status.active {
                println!("Not connected.");
            } else {
                println!("interface: {}", status.interface);
                println!(
                    "  profile: {}",
                    status.profile.as_deref().unwrap_or("(unknown)")
                );
                if let Some(peer) = &status.peer {
                    println!("  peer: {}", peer);
                }
                if let Some(endpoint) = &status.endpoint {
                    println!("  endpoint: {}", endpoint);
                }
                if let Some(handshake) = &status.latest_handshake {
                    println!("  latest handshake: {}", handshake);
                }
                if let (Some(rx), Some(tx)) = (&status.transfer_rx, &status.transfer_tx) {
                    println!("  transfer: {} received, {} sent", rx, tx);
                }
            }
        }

        Command::List => {
            let listings = manager.list().await?;
            if listings.is_empty() {
                println!("No profiles stored. Use `tunswitch import <file>`.");
                return Ok(());
            }
            for listing in listings {
                let fav = if listing.favorite { "*" } else { " " };
                let active = if listing.active { "active" } else { "" };
                let modified = listing
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let mut name = listing.name.clone();
                if let Some(display) = &listing.display_name {
                    name = format!("{} ({})", name, display);
                }
                println!(
                    "{} {} {:<28} {:<24} {:<3} {:<16} {}",
                    fav, listing.country.flag, name, listing.endpoint, listing.country.code,
                    modified, active
                );
            }
        }

        Command::Import { file, name } => {
            let raw = std::fs::read_to_string(&file)?;
            let name = match name {
                Some(name) => name,
                None => Path::new(&file)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(ToString::to_string)
                    .ok_or_else(|| anyhow::anyhow!("cannot derive profile name from {}", file))?,
            };
            let stored = manager.import(&name, &raw).await?;
            println!("Imported {} (endpoint: {})", stored.name, stored.endpoint);
        }

        Command::Show { profile, secrets } => {
            let content = manager.store().content(&profile, !secrets)?;
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }

        Command::Update { profile, file } => {
            let raw = std::fs::read_to_string(&file)?;
            let was_active = manager.active_profile().await.as_deref() == Some(profile.as_str());
            manager.update(&profile, &raw).await?;
            if was_active {
                println!("Updated {} and restarted the tunnel", profile);
            } else {
                println!("Updated {}", profile);
            }
        }

        Command::Delete { profile } => {
            manager.delete(&profile).await?;
            println!("Deleted {}", profile);
        }

        Command::Favorite { action } => match action {
            FavoriteAction::Add { profile } => {
                manager.favorites().add(&profile);
                println!("Added {} to favorites", profile);
            }
            FavoriteAction::Remove { profile } => {
                manager.favorites().remove(&profile);
                println!("Removed {} from favorites", profile);
            }
            FavoriteAction::List => {
                let favorites = manager.favorites().list();
                if favorites.is_empty() {
                    println!("No favorites.");
                }
                for name in favorites {
                    println!("{}", name);
                }
            }
        },

        Command::Rename {
            profile,
            display_name,
            clear,
        } => {
            if clear {
                manager.names().remove(&profile);
                println!("Cleared display name for {}", profile);
            } else if let Some(display_name) = display_name {
                manager.names().set(&profile, &display_name);
                println!("{} will be shown as {:?}", profile, display_name);
            } else {
                anyhow::bail!("provide a display name or --clear");
            }
        }

        Command::History { clear } => {
            if clear {
                manager.history().clear();
                println!("History cleared.");
                return Ok(());
            }
            let entries = manager.history().list();
            if entries.is_empty() {
                println!("No connection history.");
            }
            for entry in entries {
                println!(
                    "{}  {:<12} {:<24} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.action.to_string(),
                    entry.profile,
                    entry.detail.unwrap_or_default()
                );
            }
        }

        Command::Firewall => {
            manager.refresh_firewall().await?;
            println!("Firewall rules refreshed.");
        }

        Command::Geoip { action } => match action {
            GeoipAction::Refresh => {
                let removed = manager.geoip().invalidate_unknown();
                println!("Dropped {} unresolved cache entries", removed);
            }
        },

        Command::Run => {
            if config.autostart && !config.autostart_profile.is_empty() {
                if let Err(e) = manager.start(&config.autostart_profile).await {
                    warn!(profile = %config.autostart_profile, error = %e, "autostart_failed");
                }
            }
            println!(
                "tunswitch running on interface {} -- Ctrl-C to stop",
                config.interface
            );
            tokio::signal::ctrl_c().await?;
            manager.stop().await;
        }
    }

    Ok(())
}
