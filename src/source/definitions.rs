//! Definition lookup through the cache, then each dictionary provider in turn

use super::{DefinitionLookup, SourceError};
use crate::storage::DefinitionCache;

pub struct Definitions {
    cache: DefinitionCache,
    lookups: Vec<Box<dyn DefinitionLookup>>,
}

impl Definitions {
    pub fn new(cache: DefinitionCache, lookups: Vec<Box<dyn DefinitionLookup>>) -> Self {
        Self { cache, lookups }
    }

    /// Define a word, consulting the cache before any provider.
    ///
    /// The first provider hit is cached. Provider failures are logged and
    /// skipped; running out of providers is `NoWordAvailable`.
    pub fn define(&self, word: &str) -> Result<String, SourceError> {
        let word = word.to_lowercase();
        if let Some(def) = self.cache.get(&word) {
            return Ok(def);
        }

        for lookup in &self.lookups {
            match lookup.lookup(&word) {
                Ok(Some(def)) => {
                    self.cache.put(&word, &def);
                    return Ok(def);
                }
                Ok(None) => log::debug!("{} has no definition for {}", lookup.name(), word),
                Err(e) => log::debug!("{} failed for {}: {}", lookup.name(), word, e),
            }
        }

        log::info!("no definition found for {}", word);
        Err(SourceError::NoWordAvailable)
    }

    #[cfg(test)]
    pub fn cache(&self) -> &DefinitionCache {
        &self.cache
    }
}
