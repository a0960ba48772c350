//! Overrides applied after loading (CLI flags, programmatic settings).

use super::ClientConfig;

/// Applies overrides to a loaded configuration.
///
/// Only explicitly set values should be applied.
pub trait ConfigResolver {
    fn apply(&self, config: &mut ClientConfig);
}

/// Resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut ClientConfig) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_resolver_does_nothing() {
        let mut config = ClientConfig::default();
        let original = config.clone();
        NoOpResolver.apply(&mut config);
        assert_eq!(config, original);
    }

    #[test]
    fn custom_resolver() {
        struct HostOverride(Option<String>);

        impl ConfigResolver for HostOverride {
            fn apply(&self, config: &mut ClientConfig) {
                if let Some(host) = &self.0 {
                    config.host.clone_from(host);
                }
            }
        }

        let mut config = ClientConfig::default();
        HostOverride(Some("http://override.test".into())).apply(&mut config);
        assert_eq!(config.host, "http://override.test");
    }
}
