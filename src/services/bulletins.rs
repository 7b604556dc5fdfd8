// src/services/bulletins.rs

//! Bulletin index service.
//!
//! Reads the bulletin index page and returns the two newest bulletin links.

use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{BulletinLink, BulletinPair, SiteConfig};
use crate::utils::http::fetch_page;

/// Service for listing bulletins on the index page.
pub struct BulletinFetcher {
    client: Client,
    index_url: String,
    link_selector: String,
}

impl BulletinFetcher {
    /// Create a fetcher for the configured index page.
    pub fn new(config: &SiteConfig, client: Client) -> Result<Self> {
        parse_selector(&config.link_selector)?;

        Ok(Self {
            client,
            index_url: config.index_url.clone(),
            link_selector: config.link_selector.clone(),
        })
    }

    /// Fetch the index page and return the newest two bulletins.
    pub async fn fetch_latest(&self) -> Result<BulletinPair> {
        log::info!("Fetching bulletin index {}", self.index_url);
        let links = {
            let document = fetch_page(&self.client, &self.index_url).await?;
            let selector = parse_selector(&self.link_selector)?;
            parse_links(&document, &selector)
        };
        latest_pair(links)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Collect bulletin anchors in document order.
pub fn parse_links(document: &Html, selector: &Selector) -> Vec<BulletinLink> {
    document
        .select(selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let text = a.text().collect::<String>();
            Some(BulletinLink::new(text.trim(), href))
        })
        .collect()
}

/// Take the first two links as (current, previous).
pub fn latest_pair(links: Vec<BulletinLink>) -> Result<BulletinPair> {
    let found = links.len();
    let mut links = links.into_iter();

    match (links.next(), links.next()) {
        (Some(current), Some(previous)) => {
            log::debug!(
                "Newest bulletins: {} ({}), {} ({})",
                current.text,
                current.href,
                previous.text,
                previous.href
            );
            Ok(BulletinPair { current, previous })
        }
        _ => Err(AppError::bulletin(format!(
            "expected at least 2 bulletin links, found {found}"
        ))),
    }
}
