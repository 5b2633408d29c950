//! Static adapter registry, built once at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use super::{
    DefaultAdapter, LegacyFieldsAdapter, NoTrailingSlashAdapter, NodeAdapter, StrictHostAdapter,
};

/// Maps adapter tags to adapters. Never mutated after construction.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<&'static str, Arc<dyn NodeAdapter>>,
    fallback: Arc<dyn NodeAdapter>,
}

impl AdapterRegistry {
    /// Registry with every built-in dialect.
    #[must_use]
    pub fn builtin() -> Self {
        let fallback: Arc<dyn NodeAdapter> = Arc::new(DefaultAdapter);
        let adapters: [Arc<dyn NodeAdapter>; 4] = [
            fallback.clone(),
            Arc::new(NoTrailingSlashAdapter),
            Arc::new(StrictHostAdapter),
            Arc::new(LegacyFieldsAdapter),
        ];

        Self {
            adapters: adapters
                .into_iter()
                .map(|adapter| (adapter.name(), adapter))
                .collect(),
            fallback,
        }
    }

    /// Look up an adapter by tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<Arc<dyn NodeAdapter>> {
        self.adapters.get(tag).cloned()
    }

    /// Whether `tag` names a registered adapter.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.adapters.contains_key(tag)
    }

    /// Adapter for a stored tag. Unknown tags fall back to the default
    /// dialect.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Arc<dyn NodeAdapter> {
        self.get(tag).unwrap_or_else(|| {
            warn!(tag = %tag, "Unknown adapter tag, using default");
            self.fallback.clone()
        })
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.adapters.keys().copied()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags() {
        let registry = AdapterRegistry::builtin();
        let tags: Vec<_> = registry.tags().collect();

        assert_eq!(
            tags,
            ["default", "legacy_fields", "no_trailing_slash", "strict_host"]
        );
    }

    #[test]
    fn test_unknown_tag_falls_back_to_default() {
        let registry = AdapterRegistry::builtin();

        assert!(!registry.contains("team_9"));
        assert_eq!(registry.resolve("team_9").name(), "default");
        assert_eq!(registry.resolve("strict_host").name(), "strict_host");
    }
}
