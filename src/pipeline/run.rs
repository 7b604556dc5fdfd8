// src/pipeline/run.rs

use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::models::{BulletinLink, PublishConfig};
use crate::publish::{PublishReceipt, Publisher, build_caption};
use crate::render::SummaryRenderer;
use crate::services::{BulletinSource, era};
use crate::storage::MarkerStore;

use super::compare::compare;
use super::detect::{Change, detect_change};

/// Switches for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Render and build the caption but skip publishing and the marker write
    pub dry_run: bool,
    /// Fail when a municipality appears in only one bulletin
    pub strict_join: bool,
}

/// What a run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The newest bulletin was already published
    Unchanged { identifier: String },
    /// A post was created and the marker advanced
    Published {
        identifier: String,
        receipt: PublishReceipt,
    },
    /// Everything up to publishing ran; nothing was posted or stored
    DryRun {
        identifier: String,
        image: PathBuf,
        caption: String,
    },
}

/// One end-to-end pass: detect, extract, compare, render, publish, persist.
pub struct Pipeline<'a> {
    source: &'a dyn BulletinSource,
    store: &'a dyn MarkerStore,
    renderer: &'a dyn SummaryRenderer,
    publisher: Option<&'a dyn Publisher>,
    publish_config: &'a PublishConfig,
    options: RunOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn BulletinSource,
        store: &'a dyn MarkerStore,
        renderer: &'a dyn SummaryRenderer,
        publish_config: &'a PublishConfig,
    ) -> Self {
        Self {
            source,
            store,
            renderer,
            publisher: None,
            publish_config,
            options: RunOptions::default(),
        }
    }

    pub fn with_publisher(mut self, publisher: &'a dyn Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the pipeline once.
    ///
    /// Returns early with [`RunOutcome::Unchanged`] when the newest bulletin
    /// matches the stored marker. The marker is written only after the post
    /// succeeds.
    pub async fn run(&self) -> Result<RunOutcome> {
        let publisher = match (self.publisher, self.options.dry_run) {
            (Some(p), _) => Some(p),
            (None, true) => None,
            (None, false) => {
                return Err(AppError::config("publishing requires a configured publisher"));
            }
        };

        let pair = self.source.latest().await?;
        let identifier = match detect_change(self.store, &pair.current).await? {
            Change::Unchanged { identifier } => return Ok(RunOutcome::Unchanged { identifier }),
            Change::New { identifier, .. } => identifier,
        };

        let current_date = bulletin_date(&pair.current)?;
        let previous_date = bulletin_date(&pair.previous)?;

        let current = self.source.case_table(&pair.current).await?;
        let previous = self.source.case_table(&pair.previous).await?;

        let table = compare(
            &current,
            &previous,
            current_date,
            previous_date,
            self.options.strict_join,
        )?;
        log::info!(
            "Compared {} municipalities ({} dropped)",
            table.rows.len(),
            table.dropped.len()
        );

        let image = self.renderer.render(&table)?;
        let caption = build_caption(&table, self.publish_config)?;
        log::info!("Caption:\n{}", caption);

        let Some(publisher) = publisher.filter(|_| !self.options.dry_run) else {
            log::info!("Dry run: skipping publish and marker update");
            return Ok(RunOutcome::DryRun {
                identifier,
                image,
                caption,
            });
        };

        let receipt = publisher.publish(&image, &caption).await?;
        self.store.write_marker(&identifier).await?;
        log::info!("Marker advanced to {}", identifier);

        Ok(RunOutcome::Published {
            identifier,
            receipt,
        })
    }
}

fn bulletin_date(link: &BulletinLink) -> Result<chrono::NaiveDate> {
    era::to_gregorian(&link.text).ok_or_else(|| AppError::Date(link.text.clone()))
}
