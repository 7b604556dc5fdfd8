//! Service layer for the bulletin application.
//!
//! This module contains the business logic for:
//! - Era date conversion (`era`)
//! - Bulletin index fetching (`BulletinFetcher`)
//! - PDF table extraction (`TableExtractor`)
//! - The combined site source used by the pipeline (`SiteSource`)

pub mod era;

mod bulletins;
mod tables;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::{BulletinLink, BulletinPair, CaseTable, Config};

pub use bulletins::{BulletinFetcher, latest_pair, parse_links};
pub use tables::{PlacedWord, TableExtractor, extract_page_words, parse_case_table, parse_fragments};

/// Where bulletins and their case tables come from.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    /// The two newest bulletins, newest first.
    async fn latest(&self) -> Result<BulletinPair>;

    /// The case table published in one bulletin.
    async fn case_table(&self, link: &BulletinLink) -> Result<CaseTable>;
}

/// Bulletin source backed by the prefecture website.
pub struct SiteSource {
    fetcher: BulletinFetcher,
    extractor: TableExtractor,
}

impl SiteSource {
    /// Build the fetcher and extractor around one shared HTTP client.
    pub fn new(config: &Config, client: Client) -> Result<Self> {
        Ok(Self {
            fetcher: BulletinFetcher::new(&config.site, client.clone())?,
            extractor: TableExtractor::new(&config.site, &config.table, client),
        })
    }
}

#[async_trait]
impl BulletinSource for SiteSource {
    async fn latest(&self) -> Result<BulletinPair> {
        self.fetcher.fetch_latest().await
    }

    async fn case_table(&self, link: &BulletinLink) -> Result<CaseTable> {
        self.extractor.extract(link).await
    }
}
