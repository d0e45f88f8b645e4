//! Registry for managing provider clients.

use std::sync::Arc;

use super::MetadataSource;
use crate::config::Config;
use crate::models::Provider;

bitflags::bitflags! {
    /// Lookups that a source can answer
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const TITLE_SEARCH = 1 << 0;
        const ARXIV_ID_LOOKUP = 1 << 1;
        const DOI_LOOKUP = 1 << 2;
    }
}

/// Registry for all available provider clients
///
/// Sources are kept in registration order, which is also the order title
/// searches are attempted in.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn MetadataSource>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every compiled-in provider, configured from `config`
    ///
    /// Providers are registered in the order arXiv, DBLP, CrossRef.
    #[allow(unused_variables)]
    pub fn from_config(config: &Config) -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "source-arxiv")]
        registry.register(Arc::new(super::ArxivSource::from_config(config)));
        #[cfg(feature = "source-dblp")]
        registry.register(Arc::new(super::DblpSource::from_config(config)));
        #[cfg(feature = "source-crossref")]
        registry.register(Arc::new(super::CrossRefSource::from_config(config)));

        tracing::debug!("Registered {} metadata sources", registry.len());
        registry
    }

    /// Register a new source
    ///
    /// A source with the same ID replaces the existing one in place.
    pub fn register(&mut self, source: Arc<dyn MetadataSource>) {
        match self.sources.iter().position(|s| s.id() == source.id()) {
            Some(index) => self.sources[index] = source,
            None => self.sources.push(source),
        }
    }

    /// Get a source by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn MetadataSource>> {
        self.sources.iter().find(|s| s.id() == id)
    }

    /// Get the source registered for a provider
    pub fn for_provider(&self, provider: Provider) -> Option<&Arc<dyn MetadataSource>> {
        self.sources.iter().find(|s| s.provider() == provider)
    }

    /// Get all registered sources, in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn MetadataSource>> {
        self.sources.iter()
    }

    /// Get sources that support a specific capability, in registration order
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn MetadataSource>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Check if a source exists
    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    #[cfg(all(
        feature = "source-arxiv",
        feature = "source-dblp",
        feature = "source-crossref"
    ))]
    fn test_registry_from_config() {
        let registry = SourceRegistry::from_config(&Config::default());

        assert_eq!(registry.len(), 3);
        let ids: Vec<&str> = registry.all().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["arxiv", "dblp", "crossref"]);
    }

    #[test]
    #[cfg(all(
        feature = "source-arxiv",
        feature = "source-dblp",
        feature = "source-crossref"
    ))]
    fn test_capabilities() {
        let registry = SourceRegistry::from_config(&Config::default());

        let arxiv = registry.get("arxiv").unwrap();
        assert!(arxiv.supports_title_search());
        assert!(arxiv.supports_arxiv_lookup());
        assert!(!arxiv.supports_doi_lookup());

        let dblp = registry.get("dblp").unwrap();
        assert!(dblp.supports_title_search());
        assert!(!dblp.supports_doi_lookup());

        let crossref = registry.for_provider(Provider::CrossRef).unwrap();
        assert!(crossref.supports_doi_lookup());

        let title_sources: Vec<&str> = registry
            .with_capability(SourceCapabilities::TITLE_SEARCH)
            .into_iter()
            .map(|s| s.id())
            .collect();
        assert_eq!(title_sources, vec!["arxiv", "dblp", "crossref"]);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = SourceRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(MockSource::new(Provider::Dblp)));
        registry.register(Arc::new(MockSource::new(Provider::Arxiv)));
        registry.register(Arc::new(
            MockSource::new(Provider::Dblp).with_capabilities(SourceCapabilities::empty()),
        ));

        assert_eq!(registry.len(), 2);
        let ids: Vec<&str> = registry.all().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["dblp", "arxiv"]);
        assert!(!registry.get("dblp").unwrap().supports_title_search());
        assert!(!registry.has("crossref"));
    }
}
