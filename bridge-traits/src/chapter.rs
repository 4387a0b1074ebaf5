//! Chapter content provider abstraction.
//!
//! Providers fetch a chapter from a specific website and return its title and
//! body text. Site scraping itself lives in host applications; the core only
//! consumes [`ChapterContent`].

use crate::error::Result;
use crate::platform::PlatformSendSync;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chapter as returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterContent {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_chapter_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_chapter_url: Option<String>,
}

impl ChapterContent {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_chapter_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// A website-specific chapter source.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ChapterProvider: PlatformSendSync {
    /// Display name.
    fn name(&self) -> &str;

    /// Whether this provider understands `url`.
    fn can_handle(&self, url: &str) -> bool;

    /// Fetch and parse the chapter at `url`.
    async fn fetch_chapter(&self, url: &str) -> Result<ChapterContent>;
}
