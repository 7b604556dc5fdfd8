//! Bulletin CLI
//!
//! Local execution entry point. For AWS Lambda, use `bulletin-lambda`.

use std::path::PathBuf;

use bulletin::{
    error::Result,
    models::Config,
    pipeline::{Pipeline, RunOptions, RunOutcome},
    publish::TwitterPublisher,
    render::ImageRenderer,
    services::SiteSource,
    storage::{LocalStorage, MarkerStore},
    utils::http,
};
use clap::{Parser, Subcommand};

/// Posts day-over-day case counts from Nara prefecture bulletins
#[derive(Parser, Debug)]
#[command(name = "bulletin", version, about = "Nara prefecture bulletin poster")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check for a new bulletin and publish the comparison (default)
    Run {
        /// Render and print the caption without posting or updating the marker
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration
    Validate,

    /// Show the stored marker and configured paths
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let storage = LocalStorage::new(&config.storage.marker_file);

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => {
            config.validate()?;

            let client = http::create_client(&config.site)?;
            let source = SiteSource::new(&config, client.clone())?;
            let renderer = ImageRenderer::new(&config.render);
            let options = RunOptions {
                dry_run,
                strict_join: config.table.strict_join,
            };

            // Font and credentials are read only once a new bulletin is found
            let publisher = if dry_run {
                None
            } else {
                Some(TwitterPublisher::from_env(client, &config.publish))
            };

            let mut pipeline = Pipeline::new(&source, &storage, &renderer, &config.publish)
                .with_options(options);
            if let Some(publisher) = &publisher {
                pipeline = pipeline.with_publisher(publisher);
            }

            match pipeline.run().await? {
                RunOutcome::Unchanged { identifier } => {
                    log::info!("Nothing to do: {} already published", identifier);
                }
                RunOutcome::Published {
                    identifier,
                    receipt,
                } => {
                    log::info!("Published {} as post {}", identifier, receipt.post_id);
                }
                RunOutcome::DryRun {
                    identifier,
                    image,
                    caption,
                } => {
                    log::info!("Dry run for {}: image at {}", identifier, image.display());
                    println!("{caption}");
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Config file: {}", cli.config.display());
            log::info!("Index page: {}", config.site.index_url);
            log::info!("Marker file: {}", storage.path().display());
            log::info!("Font: {}", config.render.font_path);
            log::info!("Image output: {}", config.render.output_path);

            match storage.read_marker().await? {
                Some(marker) => log::info!("Last published bulletin: {}", marker),
                None => log::info!("No bulletin published yet."),
            }
        }
    }

    Ok(())
}
