//! New-bulletin detection.
//!
//! Compares the newest bulletin's identifier with the stored marker so a run
//! against an unchanged index does nothing.

use crate::error::Result;
use crate::models::BulletinLink;
use crate::storage::MarkerStore;

/// Outcome of comparing the newest bulletin with the stored marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The newest bulletin was already published
    Unchanged { identifier: String },
    /// A bulletin that has not been published yet
    New {
        identifier: String,
        previous: Option<String>,
    },
}

impl Change {
    pub fn is_new(&self) -> bool {
        matches!(self, Change::New { .. })
    }
}

/// Classify `identifier` against the stored marker.
pub fn classify(stored: Option<String>, identifier: &str) -> Change {
    match stored {
        Some(marker) if marker == identifier => Change::Unchanged {
            identifier: marker,
        },
        previous => Change::New {
            identifier: identifier.to_string(),
            previous,
        },
    }
}

/// Read the marker and classify the newest bulletin.
pub async fn detect_change(store: &dyn MarkerStore, newest: &BulletinLink) -> Result<Change> {
    let stored = store.read_marker().await?;
    let change = classify(stored, newest.identifier());

    match &change {
        Change::Unchanged { identifier } => {
            log::info!("No new bulletin since {}", identifier)
        }
        Change::New {
            identifier,
            previous: Some(previous),
        } => log::info!("New bulletin {} (last published {})", identifier, previous),
        Change::New {
            identifier,
            previous: None,
        } => log::info!("New bulletin {} (first run)", identifier),
    }

    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_classify_unchanged() {
        assert_eq!(
            classify(Some("R40105.pdf".into()), "R40105.pdf"),
            Change::Unchanged {
                identifier: "R40105.pdf".into()
            }
        );
    }

    #[test]
    fn test_classify_new() {
        let change = classify(Some("R40104.pdf".into()), "R40105.pdf");
        assert_eq!(
            change,
            Change::New {
                identifier: "R40105.pdf".into(),
                previous: Some("R40104.pdf".into())
            }
        );
        assert!(change.is_new());
    }

    #[test]
    fn test_classify_first_run() {
        assert!(classify(None, "R40105.pdf").is_new());
    }

    #[tokio::test]
    async fn test_detect_change_uses_href_tail() {
        let store = MemoryStorage::with_marker("R40105.pdf");
        let link = BulletinLink::new("令和4年1月5日", "/secure/230181/R40105.pdf");

        let change = detect_change(&store, &link).await.unwrap();
        assert!(!change.is_new());
    }
}
