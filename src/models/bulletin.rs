//! Bulletin link data structures.

use serde::{Deserialize, Serialize};

/// An anchor on the bulletin index page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulletinLink {
    /// Anchor text, carries the era-formatted publication date
    pub text: String,

    /// Relative URL of the bulletin PDF
    pub href: String,
}

impl BulletinLink {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }

    /// Stable identifier: the final path segment of the href.
    ///
    /// An href ending in `/` has no tail and is used whole.
    pub fn identifier(&self) -> &str {
        self.href
            .rsplit('/')
            .next()
            .filter(|tail| !tail.is_empty())
            .unwrap_or(&self.href)
    }
}

/// The two newest bulletins in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinPair {
    pub current: BulletinLink,
    pub previous: BulletinLink,
}
