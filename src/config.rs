//! Style sheet configuration.

use std::sync::Arc;

use crate::style::registry::InstancerRegistry;

/// Settings shared by a style sheet and every sheet combined from it.
#[derive(Debug, Clone)]
pub struct StyleConfig {
    /// Decorator and font-effect factories, keyed by type name.
    pub registry: Arc<InstancerRegistry>,
    /// Log unknown property names at warn level (otherwise debug).
    pub warn_unknown_properties: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            registry: Arc::new(InstancerRegistry::with_defaults()),
            warn_unknown_properties: true,
        }
    }
}

impl StyleConfig {
    /// Create a new default config with the built-in instancer types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the instancer registry (builder).
    pub fn with_registry(mut self, registry: impl Into<Arc<InstancerRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Set whether unknown properties are logged at warn level (builder).
    pub fn with_warn_unknown_properties(mut self, warn: bool) -> Self {
        self.warn_unknown_properties = warn;
        self
    }
}
