//! Posting the rendered summary to social media.

pub mod oauth;
mod twitter;

use std::path::Path;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ComparisonTable, PublishConfig};
use crate::utils::{format_count, format_signed};

pub use oauth::Credentials;
pub use twitter::TwitterPublisher;

/// Identifier of a successfully created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub media_id: String,
    pub post_id: String,
}

/// Uploads an image and posts a caption referencing it.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, image: &Path, caption: &str) -> Result<PublishReceipt>;
}

/// Build the post text from the totals row.
pub fn build_caption(table: &ComparisonTable, config: &PublishConfig) -> Result<String> {
    let total = table
        .total()
        .ok_or_else(|| AppError::validation("comparison has no totals row"))?;

    Ok(format!(
        "{}\n\n前日: {} 人\n本日: {} 人\n前日比: {} 人\n\n{}発表分\n{}",
        config.title,
        format_count(total.previous),
        format_count(total.current),
        format_signed(total.delta),
        table.current_label(),
        config.reference_url,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComparisonRow;
    use chrono::NaiveDate;

    fn table(rows: Vec<ComparisonRow>) -> ComparisonTable {
        ComparisonTable {
            rows,
            previous_date: NaiveDate::from_ymd_opt(2022, 1, 4).unwrap(),
            current_date: NaiveDate::from_ymd_opt(2022, 1, 5).unwrap(),
            dropped: Vec::new(),
        }
    }

    #[test]
    fn test_caption_uses_totals_row() {
        let table = table(vec![
            ComparisonRow::new("奈良市", 10, 15).unwrap(),
            ComparisonRow::new("合計", 1200, 1534).unwrap(),
        ]);

        let caption = build_caption(&table, &PublishConfig::default()).unwrap();
        assert_eq!(
            caption,
            "【奈良県】コロナ新規感染者数(前日比)\n\n\
             前日: 1,200 人\n本日: 1,534 人\n前日比: +334 人\n\n\
             2022/01/05発表分\nhttps://www.pref.nara.jp/60279.htm"
        );
    }

    #[test]
    fn test_caption_negative_delta() {
        let table = table(vec![ComparisonRow::new("合計", 20, 15).unwrap()]);
        let caption = build_caption(&table, &PublishConfig::default()).unwrap();
        assert!(caption.contains("前日比: -5 人"));
    }

    #[test]
    fn test_caption_requires_totals_row() {
        let result = build_caption(&table(Vec::new()), &PublishConfig::default());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
