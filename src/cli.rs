use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Also write log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Serve the initial listing only, without connecting to the live stream
    #[arg(long)]
    pub no_stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "launchpad-service",
            "--config",
            "custom.toml",
            "--debug",
            "--log-file",
            "service.log",
            "--no-stream",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(cli.debug);
        assert_eq!(cli.log_file, Some(PathBuf::from("service.log")));
        assert!(cli.no_stream);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["launchpad-service"]);
        assert!(cli.config.is_none());
        assert!(!cli.debug);
        assert!(!cli.no_stream);
    }
}
