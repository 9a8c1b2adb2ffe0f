//! Lightsite CLI
//!
//! Code-first static site generator.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Lightsite.
#[derive(Parser)]
#[command(
    name = "lightsite",
    version,
    about = "A code-first static site generator"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "lightsite.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site into the output directory
    Build {
        /// Output directory (defaults to build.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum concurrent writes (defaults to build.workers)
        #[arg(long)]
        workers: Option<usize>,
        /// Include draft posts
        #[arg(long)]
        drafts: bool,
    },
    /// Load the site and print its task plan without writing anything
    Check,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    lightsite::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            output,
            workers,
            drafts,
        } => {
            lightsite::cmd::build::run(&cli.config, output.as_deref(), workers, drafts)?;
        }
        Commands::Check => {
            lightsite::cmd::check::run(&cli.config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["lightsite", "build", "--output", "dist", "--workers", "4"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("lightsite.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build {
                output,
                workers,
                drafts,
            } => {
                assert_eq!(output, Some(PathBuf::from("dist")));
                assert_eq!(workers, Some(4));
                assert!(!drafts);
            }
            Commands::Check => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_build_defaults() {
        let cli = Cli::parse_from(["lightsite", "build", "--drafts"]);

        match cli.command {
            Commands::Build {
                output,
                workers,
                drafts,
            } => {
                assert!(output.is_none());
                assert!(workers.is_none());
                assert!(drafts);
            }
            Commands::Check => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_check_command_parsing() {
        let cli = Cli::parse_from(["lightsite", "-c", "site.toml", "check"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let cli = Cli::parse_from(["lightsite", "-vvv", "build"]);
        assert_eq!(cli.verbose, 3);
    }
}
