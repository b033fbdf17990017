//! Engine configuration.

use derive_builder::Builder;

/// Configuration for the automation execution engine.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Maximum number of graph walks running at once, counting both
    /// freshly dispatched and resumed walks.
    #[builder(default = "16")]
    pub max_concurrent_walks: usize,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_concurrent_walks {
            if max == 0 {
                return Err("max_concurrent_walks must be at least 1".into());
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_walks: 16,
        }
    }
}
