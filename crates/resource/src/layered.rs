use annex9_traits::{ResourceError, ResourceProvider, SharedResourceData};
use std::sync::Arc;

/// Consults each provider in turn.
///
/// Used to put user asset directories in front of the bundled assets.
#[derive(Debug, Default, Clone)]
pub struct LayeredResourceProvider {
    layers: Vec<Arc<dyn ResourceProvider>>,
}

impl LayeredResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer consulted after the existing ones.
    pub fn with_layer(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.layers.push(provider);
        self
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl ResourceProvider for LayeredResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        for layer in &self.layers {
            match layer.load(path) {
                Err(ResourceError::NotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ResourceError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.layers.iter().any(|l| l.exists(path))
    }

    fn base_path(&self) -> Option<&str> {
        self.layers.iter().find_map(|l| l.base_path())
    }

    fn name(&self) -> &'static str {
        "LayeredResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annex9_traits::InMemoryResourceProvider;

    fn layer(entries: &[(&str, &[u8])]) -> Arc<dyn ResourceProvider> {
        let p = InMemoryResourceProvider::new();
        for (k, v) in entries {
            p.add(*k, v.to_vec()).unwrap();
        }
        Arc::new(p)
    }

    #[test]
    fn earlier_layer_shadows_later_one() {
        let provider = LayeredResourceProvider::new()
            .with_layer(layer(&[("a", b"user")]))
            .with_layer(layer(&[("a", b"bundled"), ("b", b"only-bundled")]));

        assert_eq!(&*provider.load("a").unwrap(), b"user");
        assert_eq!(&*provider.load("b").unwrap(), b"only-bundled");
        assert!(provider.exists("b"));
        assert!(matches!(provider.load("c"), Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn empty_stack_finds_nothing() {
        let provider = LayeredResourceProvider::new();
        assert_eq!(provider.layer_count(), 0);
        assert!(!provider.exists("x"));
    }
}
