use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tunswitch",
    about = "Switch between WireGuard profiles with split-tunnel routing",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring the tunnel up with a stored profile
    Up {
        /// Profile name
        profile: String,
    },

    /// Bring the tunnel down
    Down,

    /// Restart the active tunnel, re-reading its stored profile
    Restart,

    /// Switch to another profile (stops the current one first)
    Switch {
        /// Profile name
        profile: String,
    },

    /// Show live tunnel link state
    Status,

    /// List stored profiles (favorites first)
    List,

    /// Import a WireGuard .conf file as a new profile
    Import {
        /// Path to the .conf file
        file: String,

        /// Profile name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print a stored profile
    Show {
        /// Profile name
        profile: String,

        /// Include the private key instead of redacting it
        #[arg(long)]
        secrets: bool,
    },

    /// Replace the content of an existing profile
    Update {
        /// Profile name
        profile: String,

        /// Path to the new .conf file
        file: String,
    },

    /// Delete a stored profile (stops the tunnel first if active)
    Delete {
        /// Profile name
        profile: String,
    },

    /// Manage favorite profiles
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// Set or clear a display name for a profile
    Rename {
        /// Profile name
        profile: String,

        /// Display name to show in listings
        display_name: Option<String>,

        /// Remove the display name
        #[arg(long)]
        clear: bool,
    },

    /// Show the connection history
    History {
        /// Clear the history instead of showing it
        #[arg(long)]
        clear: bool,
    },

    /// Re-run the firewall refresh script
    Firewall,

    /// Manage the GeoIP cache
    Geoip {
        #[command(subcommand)]
        action: GeoipAction,
    },

    /// Run in the foreground: autostart the configured profile, stop on Ctrl-C
    Run,
}

#[derive(Subcommand)]
pub enum FavoriteAction {
    /// Mark a profile as favorite
    Add {
        /// Profile name
        profile: String,
    },

    /// Unmark a favorite (no-op if absent)
    Remove {
        /// Profile name
        profile: String,
    },

    /// List favorite profiles
    List,
}

#[derive(Subcommand)]
pub enum GeoipAction {
    /// Drop unresolved cache entries so they are looked up again
    Refresh,
}
