//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Log into the marketplace, scrape the task list and store it.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "tasklink", version, about)]
pub struct Cli {
    /// Configuration file (default: `TASKLINK_CONFIG`, then the XDG config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scrape a saved task-list page instead of logging in
    #[arg(long, value_name = "HTML_FILE")]
    pub snapshot: Option<PathBuf>,

    /// Do not print the task table
    #[arg(long)]
    pub no_print: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "tasklink",
            "--config",
            "/etc/tasklink.toml",
            "--snapshot",
            "page.html",
            "--no-print",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/tasklink.toml")));
        assert_eq!(cli.snapshot, Some(PathBuf::from("page.html")));
        assert!(cli.no_print);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["tasklink"]);
        assert!(cli.config.is_none());
        assert!(cli.snapshot.is_none());
        assert!(!cli.no_print);
    }
}
