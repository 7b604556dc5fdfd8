//! AWS Lambda entry point for the bulletin poster
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//! The marker lives in S3 (`S3_BUCKET`, `S3_PREFIX`); the config file path
//! comes from `BULLETIN_CONFIG`.

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};

use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulletin::{
    error::Result,
    models::Config,
    pipeline::{Pipeline, RunOptions, RunOutcome},
    publish::TwitterPublisher,
    render::ImageRenderer,
    services::SiteSource,
    storage::S3Storage,
    utils::http,
};

/// Only `/tmp` is writable inside Lambda.
const LAMBDA_IMAGE_PATH: &str = "/tmp/pic.png";

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> std::result::Result<(), LambdaError> {
    // `init` also bridges `log` records from the library
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Bulletin Lambda starting...");
    lambda_runtime::run(service_fn(handler)).await
}

/// Handler for AWS Lambda events.
async fn handler(event: LambdaEvent<Value>) -> std::result::Result<Value, LambdaError> {
    info!("Received event: {:?}", event.payload);

    match run_lambda_pipeline().await {
        Ok(outcome) => {
            info!("Lambda execution successful: {:?}", outcome);
            Ok(outcome_json(&outcome))
        }
        Err(e) => {
            error!("Lambda execution failed: {}", e);
            Ok(json!({
                "status": "error",
                "message": e.to_string()
            }))
        }
    }
}

async fn run_lambda_pipeline() -> Result<RunOutcome> {
    let mut config = match std::env::var("BULLETIN_CONFIG") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    config.render.output_path = LAMBDA_IMAGE_PATH.to_string();
    config.validate()?;

    let storage = S3Storage::from_env(&config.storage.marker_key).await?;
    info!("Marker location: {}", storage.location());

    let client = http::create_client(&config.site)?;
    let source = SiteSource::new(&config, client.clone())?;
    let renderer = ImageRenderer::new(&config.render);
    let publisher = TwitterPublisher::from_env(client, &config.publish);

    Pipeline::new(&source, &storage, &renderer, &config.publish)
        .with_publisher(&publisher)
        .with_options(RunOptions {
            dry_run: false,
            strict_join: config.table.strict_join,
        })
        .run()
        .await
}

fn outcome_json(outcome: &RunOutcome) -> Value {
    match outcome {
        RunOutcome::Unchanged { identifier } => json!({
            "status": "unchanged",
            "bulletin": identifier
        }),
        RunOutcome::Published {
            identifier,
            receipt,
        } => json!({
            "status": "published",
            "bulletin": identifier,
            "post_id": receipt.post_id
        }),
        RunOutcome::DryRun { identifier, .. } => json!({
            "status": "dry_run",
            "bulletin": identifier
        }),
    }
}
