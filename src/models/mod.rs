// src/models/mod.rs

//! Domain models for the bulletin application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod bulletin;
mod config;
mod table;

// Re-export all public types
pub use bulletin::{BulletinLink, BulletinPair};
pub use config::{
    ColumnGeometry, Config, PublishConfig, RenderConfig, SiteConfig, StorageConfig, TableConfig,
};
pub use table::{CaseRow, CaseTable, ComparisonRow, ComparisonTable, display_date};
