use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::backend::ClassifierBackend;
use crate::classify::Classification;

/// Thread-safe registry of classifier backends.
///
/// Backends are wrapped in `Mutex` because `ClassifierBackend::classify`
/// takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn ClassifierBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: ClassifierBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn ClassifierBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn ClassifierBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Classify a frame with the default backend.
    pub fn classify_with_default(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Classification> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no classifier backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("classifier backend lock poisoned"))?;
        guard.classify(pixels, width, height)
    }

    /// Run every registered backend's warm-up hook.
    pub fn warm_up_all(&self) -> Result<()> {
        for (name, backend) in &self.backends {
            let mut guard = backend
                .lock()
                .map_err(|_| anyhow!("classifier backend lock poisoned"))?;
            guard
                .warm_up()
                .map_err(|e| anyhow!("backend '{}' warm-up failed: {}", name, e))?;
        }
        Ok(())
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
