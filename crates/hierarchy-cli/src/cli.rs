//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect role hierarchy trees stored as JSON
#[derive(Debug, Parser)]
#[command(name = "hierarchy", version, about)]
pub(crate) struct Cli {
    /// JSON file holding an array of raw tree nodes
    pub file: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Skip malformed nodes instead of failing
    #[arg(long, global = true)]
    pub lenient: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Query to run
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Report cycles, deep nesting and empty roles
    Validate,

    /// List every role with its breadcrumb
    Flatten,

    /// Show one role
    Find {
        #[arg(long)]
        role: u64,
    },

    /// Show the chain of roles from the root down to a role
    Path {
        #[arg(long)]
        role: u64,
    },

    /// Effective permissions of a role
    Permissions {
        #[arg(long)]
        role: u64,

        /// Only the role's own permissions
        #[arg(long)]
        no_inherit: bool,

        /// Keep permissions with this guard only
        #[arg(long, value_name = "GUARD")]
        guard: Option<String>,

        /// Keep repeated permission ids
        #[arg(long)]
        keep_duplicates: bool,
    },

    /// Find roles by id, name or permission name
    Search {
        #[arg(long)]
        role: Option<u64>,

        /// Case-insensitive substring of the role name
        #[arg(long)]
        name: Option<String>,

        /// Case-insensitive substring of a permission name
        #[arg(long)]
        permission: Option<String>,
    },

    /// Print a pruned copy of the tree
    Transform {
        #[arg(long)]
        max_depth: Option<usize>,

        #[arg(long)]
        no_permissions: bool,

        #[arg(long)]
        no_metadata: bool,
    },

    /// Node, root and leaf counts
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_permissions_flags() {
        let cli = Cli::parse_from([
            "hierarchy",
            "tree.json",
            "permissions",
            "--role",
            "5",
            "--guard",
            "web",
            "--no-inherit",
            "--json",
        ]);

        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Permissions {
                role: 5,
                no_inherit: true,
                keep_duplicates: false,
                guard: Some(ref guard),
            } if guard == "web"
        ));
    }
}
