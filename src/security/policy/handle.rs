use arc_swap::ArcSwap;
use std::sync::Arc;

use super::PolicyGate;
use crate::config::PolicyConfig;
use crate::error::ConfigError;

/// Live policy configuration shared between the cycle loop and operators.
///
/// Readers never block; a replacement is only accepted with a strictly
/// newer `version`, so an applied policy can always be traced back to the
/// configuration that produced it.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    inner: Arc<ArcSwap<PolicyConfig>>,
}

impl PolicyHandle {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Gate bound to the current snapshot. Lock-free.
    pub fn gate(&self) -> PolicyGate {
        PolicyGate::from_shared(self.inner.load_full())
    }

    pub fn current(&self) -> Arc<PolicyConfig> {
        self.inner.load_full()
    }

    pub fn version(&self) -> u32 {
        self.inner.load().version
    }

    /// Swap in `config` if it validates and carries a newer version.
    pub fn replace(&self, config: PolicyConfig) -> Result<(), ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let active = self.version();
        if config.version <= active {
            return Err(ConfigError::StalePolicyVersion {
                active,
                offered: config.version,
            });
        }

        tracing::info!(
            from = active,
            to = config.version,
            lock = config.lock,
            override_authorize = config.override_authorize,
            "policy replaced"
        );
        self.inner.store(Arc::new(config));
        Ok(())
    }
}
