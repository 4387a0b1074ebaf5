//! Chapter provider registry.
//!
//! Built once at process start and handed to whatever loads chapters. Lookup
//! is first-match in registration order, so more specific providers should be
//! registered before generic ones.

use bridge_traits::chapter::{ChapterContent, ChapterProvider};
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ChapterProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; returns `self` for chained construction.
    pub fn register(mut self, provider: Arc<dyn ChapterProvider>) -> Self {
        debug!(provider = provider.name(), "Registered chapter provider");
        self.providers.push(provider);
        self
    }

    pub fn provider_for(&self, url: &str) -> Option<Arc<dyn ChapterProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.can_handle(url))
            .cloned()
    }

    pub fn can_handle(&self, url: &str) -> bool {
        self.provider_for(url).is_some()
    }

    pub fn providers(&self) -> &[Arc<dyn ChapterProvider>] {
        &self.providers
    }

    /// Fetch `url` with the first provider that accepts it.
    pub async fn fetch_chapter(&self, url: &str) -> BridgeResult<ChapterContent> {
        let provider = self.provider_for(url).ok_or_else(|| {
            BridgeError::NotAvailable(format!("No chapter provider handles {}", url))
        })?;
        debug!(provider = provider.name(), url, "Fetching chapter");
        provider.fetch_chapter(url).await
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}
