use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use relay_core::ChannelKind;

use crate::channel::ChannelAdapter;

/// Adapters keyed by [`ChannelKind`], built once at start-up.
///
/// Lookups for a kind with no dedicated adapter fall back to the generic
/// webhook adapter, if one is registered.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ChannelKind, Arc<dyn ChannelAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under its own [`ChannelAdapter::kind`].
    ///
    /// If an adapter for the same kind is already registered it is replaced.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) {
        let kind = adapter.kind();
        info!(channel = %kind, "registering channel adapter");
        self.adapters.insert(kind, adapter);
    }

    /// The adapter registered for exactly this kind.
    pub fn get(&self, kind: ChannelKind) -> Option<Arc<dyn ChannelAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// The adapter for `kind`, or the webhook adapter when none is registered.
    pub fn get_or_default(&self, kind: ChannelKind) -> Option<Arc<dyn ChannelAdapter>> {
        self.get(kind).or_else(|| self.get(ChannelKind::Webhook))
    }

    /// Registered kinds, sorted by name for deterministic output.
    pub fn kinds(&self) -> Vec<ChannelKind> {
        let mut kinds: Vec<ChannelKind> = self.adapters.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhook::WebhookAdapter;

    #[test]
    fn unknown_kind_falls_back_to_webhook() {
        let mut registry = AdapterRegistry::new();
        assert!(registry.get_or_default(ChannelKind::Generic).is_none());

        registry.register(Arc::new(WebhookAdapter::new()));
        let adapter = registry.get_or_default(ChannelKind::Generic).unwrap();
        assert_eq!(adapter.kind(), ChannelKind::Webhook);
        assert!(registry.get(ChannelKind::Generic).is_none());
    }

    #[test]
    fn kinds_are_sorted() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(WebhookAdapter::new()));
        assert_eq!(registry.kinds(), vec![ChannelKind::Webhook]);
    }
}
