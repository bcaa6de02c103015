use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "keychain",
    about = "Encrypted key/value storage on top of the OS keyring",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report whether a value is stored under KEY.
    Exists { key: String },
    /// Decrypt and print the value stored under KEY.
    Get { key: String },
    /// Encrypt and store VALUE under KEY, replacing any previous value.
    Put {
        key: String,
        value: String,
        /// Store without requiring user presence to read it back.
        #[arg(long)]
        system: bool,
    },
    /// Round-trip a probe value through the configured backend.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
