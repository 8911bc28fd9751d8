//! Command-line interface definitions for Newscast.
//!
//! All arguments can be provided via command-line flags or environment
//! variables. Tunables that are not secrets live in the YAML config instead
//! (see [`crate::config`]).

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Newscast server.
///
/// # Examples
///
/// ```sh
/// # Serve on the default port, writing podcasts under ./output/podcasts
/// newscast
///
/// # Custom output directory and config file, scrapers disabled
/// newscast -o /var/lib/newscast -c ./config.yaml --no-scrape
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "NEWSCAST_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(short, long, env = "NEWSCAST_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Output directory; podcasts are written to `<dir>/podcasts`
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Path of the ranked store snapshot (defaults to `<output_dir>/store.json`)
    #[arg(short, long)]
    pub store_path: Option<PathBuf>,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API key for the text-generation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// API key for the speech-synthesis service
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: String,

    /// Do not start the periodic listing scrapers
    #[arg(long)]
    pub no_scrape: bool,
}

impl Cli {
    pub fn podcast_dir(&self) -> PathBuf {
        self.output_dir.join("podcasts")
    }

    pub fn store_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("store.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "newscast",
            "--openai-api-key",
            "sk-test",
            "--google-api-key",
            "g-test",
        ]);

        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.podcast_dir(), PathBuf::from("output/podcasts"));
        assert_eq!(cli.store_path(), PathBuf::from("output/store.json"));
        assert!(!cli.no_scrape);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "newscast",
            "-o",
            "/tmp/out",
            "-s",
            "/tmp/store.json",
            "-p",
            "9000",
            "--openai-api-key",
            "sk-test",
            "--google-api-key",
            "g-test",
            "--no-scrape",
        ]);

        assert_eq!(cli.port, 9000);
        assert_eq!(cli.podcast_dir(), PathBuf::from("/tmp/out/podcasts"));
        assert_eq!(cli.store_path(), PathBuf::from("/tmp/store.json"));
        assert!(cli.no_scrape);
    }
}
