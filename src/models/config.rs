//! Application configuration structures.

use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Bulletin index site and HTTP behavior
    #[serde(default)]
    pub site: SiteConfig,

    /// PDF table parsing rules
    #[serde(default)]
    pub table: TableConfig,

    /// Summary image geometry and assets
    #[serde(default)]
    pub render: RenderConfig,

    /// Social-media post settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// Marker persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.site.user_agent.trim().is_empty() {
            return Err(AppError::validation("site.user_agent is empty"));
        }
        if self.site.timeout_secs == 0 {
            return Err(AppError::validation("site.timeout_secs must be > 0"));
        }
        if let Err(e) = Selector::parse(&self.site.link_selector) {
            return Err(AppError::selector(
                &self.site.link_selector,
                format!("{e:?}"),
            ));
        }
        url::Url::parse(&self.site.index_url)?;
        url::Url::parse(&self.site.base_url)?;
        if self.table.page == 0 {
            return Err(AppError::validation("table.page is 1-based"));
        }
        if self.table.fragments == 0 {
            return Err(AppError::validation("table.fragments must be > 0"));
        }
        if self.table.name_header.trim().is_empty() {
            return Err(AppError::validation("table.name_header is empty"));
        }
        if self.render.columns.is_empty() {
            return Err(AppError::validation("render.columns is empty"));
        }
        if self.render.rows_per_column == 0 {
            return Err(AppError::validation("render.rows_per_column must be > 0"));
        }
        if self.render.font_size <= 0.0 {
            return Err(AppError::validation("render.font_size must be > 0"));
        }
        if self.storage.marker_file.trim().is_empty() {
            return Err(AppError::validation("storage.marker_file is empty"));
        }
        Ok(())
    }
}

/// Bulletin index page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Page listing the published bulletins
    #[serde(default = "defaults::index_url")]
    pub index_url: String,

    /// Base URL that relative bulletin hrefs resolve against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header; the site rejects unidentified clients
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// CSS selector for bulletin anchors, newest first
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// Pause after each PDF download in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_url: defaults::index_url(),
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            link_selector: defaults::link_selector(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// PDF table parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// 1-based page holding the table
    #[serde(default = "defaults::page")]
    pub page: u32,

    /// Number of side-by-side fragments the table is split into
    #[serde(default = "defaults::fragments")]
    pub fragments: usize,

    /// Header text that opens a fragment
    #[serde(default = "defaults::name_header")]
    pub name_header: String,

    /// Label of the synthesized totals row
    #[serde(default = "defaults::total_label")]
    pub total_label: String,

    /// Fail instead of warn when municipalities differ between bulletins
    #[serde(default)]
    pub strict_join: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page: defaults::page(),
            fragments: defaults::fragments(),
            name_header: defaults::name_header(),
            total_label: defaults::total_label(),
            strict_join: false,
        }
    }
}

/// Horizontal geometry of one layout column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnGeometry {
    /// X offset of the municipality name
    pub name_x: i32,

    /// X offset of the count text
    pub value_x: i32,

    /// X offset of the count text for rows with a long label
    #[serde(default)]
    pub wide_value_x: Option<i32>,
}

/// Summary image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "defaults::width")]
    pub width: u32,

    #[serde(default = "defaults::height")]
    pub height: u32,

    /// TrueType/OpenType font used for every text fragment
    #[serde(default = "defaults::font_path")]
    pub font_path: String,

    #[serde(default = "defaults::font_size")]
    pub font_size: f32,

    /// Where the PNG is written
    #[serde(default = "defaults::output_path")]
    pub output_path: String,

    #[serde(default = "defaults::columns")]
    pub columns: Vec<ColumnGeometry>,

    #[serde(default = "defaults::rows_per_column")]
    pub rows_per_column: usize,

    #[serde(default = "defaults::row_height")]
    pub row_height: i32,

    /// Y offset of the first row in every column
    #[serde(default = "defaults::top")]
    pub top: i32,

    /// Municipality label that needs the wide count offset
    #[serde(default = "defaults::wide_label")]
    pub wide_label: String,

    #[serde(default = "defaults::caption_x")]
    pub caption_x: i32,

    #[serde(default = "defaults::caption_y")]
    pub caption_y: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: defaults::width(),
            height: defaults::height(),
            font_path: defaults::font_path(),
            font_size: defaults::font_size(),
            output_path: defaults::output_path(),
            columns: defaults::columns(),
            rows_per_column: defaults::rows_per_column(),
            row_height: defaults::row_height(),
            top: defaults::top(),
            wide_label: defaults::wide_label(),
            caption_x: defaults::caption_x(),
            caption_y: defaults::caption_y(),
        }
    }
}

/// Social-media post settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// First line of every post
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Link appended to every post
    #[serde(default = "defaults::reference_url")]
    pub reference_url: String,

    #[serde(default = "defaults::upload_url")]
    pub upload_url: String,

    #[serde(default = "defaults::status_url")]
    pub status_url: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            reference_url: defaults::reference_url(),
            upload_url: defaults::upload_url(),
            status_url: defaults::status_url(),
        }
    }
}

/// Marker persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local file holding the last processed bulletin identifier
    #[serde(default = "defaults::marker_file")]
    pub marker_file: String,

    /// Object key used by the S3 backing
    #[serde(default = "defaults::marker_key")]
    pub marker_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            marker_file: defaults::marker_file(),
            marker_key: defaults::marker_key(),
        }
    }
}

mod defaults {
    use super::ColumnGeometry;

    // Site defaults
    pub fn index_url() -> String {
        "https://www.pref.nara.jp/60279.htm".into()
    }
    pub fn base_url() -> String {
        "https://www.pref.nara.jp".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
         (KHTML, like Gecko) Version/15.5 Safari/605.1.15"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn link_selector() -> String {
        "div#ContentPane > div:nth-of-type(4) div.Contents > p > a".into()
    }
    pub fn request_delay() -> u64 {
        3000
    }

    // Table defaults
    pub fn page() -> u32 {
        1
    }
    pub fn fragments() -> usize {
        2
    }
    pub fn name_header() -> String {
        "市町村".into()
    }
    pub fn total_label() -> String {
        "合計".into()
    }

    // Render defaults
    pub fn width() -> u32 {
        1280
    }
    pub fn height() -> u32 {
        720
    }
    pub fn font_path() -> String {
        "NotoSerifJP-Regular.otf".into()
    }
    pub fn font_size() -> f32 {
        20.0
    }
    pub fn output_path() -> String {
        "pic.png".into()
    }
    pub fn columns() -> Vec<ColumnGeometry> {
        vec![
            ColumnGeometry {
                name_x: 40,
                value_x: 200,
                wide_value_x: None,
            },
            ColumnGeometry {
                name_x: 450,
                value_x: 600,
                wide_value_x: None,
            },
            ColumnGeometry {
                name_x: 860,
                value_x: 1000,
                wide_value_x: Some(1095),
            },
        ]
    }
    pub fn rows_per_column() -> usize {
        16
    }
    pub fn row_height() -> i32 {
        40
    }
    pub fn top() -> i32 {
        40
    }
    pub fn wide_label() -> String {
        "調査中・非公表".into()
    }
    pub fn caption_x() -> i32 {
        860
    }
    pub fn caption_y() -> i32 {
        650
    }

    // Publish defaults
    pub fn title() -> String {
        "【奈良県】コロナ新規感染者数(前日比)".into()
    }
    pub fn reference_url() -> String {
        "https://www.pref.nara.jp/60279.htm".into()
    }
    pub fn upload_url() -> String {
        "https://upload.twitter.com/1.1/media/upload.json".into()
    }
    pub fn status_url() -> String {
        "https://api.twitter.com/2/tweets".into()
    }

    // Storage defaults
    pub fn marker_file() -> String {
        "PreviousHrefData.text".into()
    }
    pub fn marker_key() -> String {
        "PreviousHrefData.text".into()
    }
}
