//! Ordered emitter registry keyed by unique name.

use std::sync::Arc;

use super::{ContentIndex, ContentPage, Emitter, StaticFiles};
use crate::error::EmitError;
use crate::Result;

/// Emitters in configured order. Names are unique.
#[derive(Clone, Default)]
pub struct EmitterRegistry {
    emitters: Vec<Arc<dyn Emitter>>,
}

impl std::fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl EmitterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of the built-in emitters named in `names`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or repeated name.
    pub fn from_names(names: &[String]) -> Result<Self> {
        let mut registry = Self::new();
        for name in names {
            let emitter: Arc<dyn Emitter> = match name.as_str() {
                "ContentPage" => Arc::new(ContentPage::new()),
                "ContentIndex" => Arc::new(ContentIndex::new()),
                "Static" => Arc::new(StaticFiles::new()),
                other => return Err(EmitError::UnknownPlugin(other.to_string()).into()),
            };
            registry.register(emitter)?;
        }
        Ok(registry)
    }

    /// Append an emitter.
    ///
    /// # Errors
    ///
    /// Returns an error if an emitter with the same name is registered.
    pub fn register(&mut self, emitter: Arc<dyn Emitter>) -> Result<()> {
        if self.get(emitter.name()).is_some() {
            return Err(EmitError::Duplicate(emitter.name().to_string()).into());
        }
        self.emitters.push(emitter);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Emitter>> {
        self.emitters.iter().find(|e| e.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Emitter>> {
        self.emitters.iter()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.emitters.iter().map(|e| e.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}
