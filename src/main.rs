//! CLI entry point for postsmith

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postsmith::config::SiteConfig;
use postsmith::Site;

#[derive(Parser)]
#[command(name = "postsmith")]
#[command(version)]
#[command(about = "Render a directory of Markdown posts into a static site", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render posts into the output directory
    #[command(alias = "b")]
    Build {
        /// Directory containing the post sources
        input: PathBuf,

        /// Directory receiving the rendered site
        output: PathBuf,

        /// Config file (defaults to <INPUT>/_config.yml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the posts a build would render
    List {
        /// Directory containing the post sources
        input: PathBuf,

        /// Config file (defaults to <INPUT>/_config.yml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Delete the output directory
    Clean {
        /// Directory holding a previously rendered site
        output: PathBuf,

        /// Post sources that must survive the clean
        #[arg(short, long, default_value = ".")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postsmith=debug,info"
    } else {
        "postsmith=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
        } => {
            let site = Site::new(&input, &output, config.as_deref())?;
            tracing::info!("Building {:?} into {:?}", site.input_dir, site.output_dir);

            let report = site.build()?;
            if report.is_clean() {
                println!("Rendered {} posts", report.rendered.len());
            } else {
                println!(
                    "Rendered {} posts, skipped {} (see log)",
                    report.rendered.len(),
                    report.failures.len()
                );
            }
        }

        Commands::List { input, config } => {
            let site = Site::new(&input, &input, config.as_deref())?;
            postsmith::commands::list::run(&site)?;
        }

        Commands::Clean { output, input } => {
            let site = Site::with_config(SiteConfig::default(), &input, &output)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }
    }

    Ok(())
}
