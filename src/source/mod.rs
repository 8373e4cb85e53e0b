//! Word sourcing: remote providers, fallback chain, definition lookup
//!
//! This module provides:
//! - A uniform strategy contract for word providers, tried in order
//! - Per-call timeouts on every network request
//! - Definition lookup through the `DefinitionCache`
//! - The `Supply` implementations the prefetcher draws from

pub mod definitions;
pub mod providers;
pub mod transport;

pub use definitions::Definitions;
pub use transport::{HttpTransport, Transport};

use crate::game::queue::WordQueue;
use crate::game::word_sets::WordSet;
use crate::game::{Difficulty, WordEntry};
use crate::prefetch::Supply;
use crate::storage::DefinitionCache;
use providers::{DatamuseDefinitionLookup, DictionaryApiLookup, PatternLookup, RandomThenDefine};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Errors from word and definition providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// A single call exceeded its time bound
    ProviderTimeout { provider: String, after: Duration },
    /// A call failed or returned something unusable
    ProviderError { provider: String, reason: String },
    /// Every provider in the chain came up empty
    NoWordAvailable,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::ProviderTimeout { provider, after } => {
                write!(f, "{} timed out after {}ms", provider, after.as_millis())
            }
            SourceError::ProviderError { provider, reason } => write!(f, "{} failed: {}", provider, reason),
            SourceError::NoWordAvailable => write!(f, "no word available from any provider"),
        }
    }
}

impl std::error::Error for SourceError {}

/// One way of producing a random word for a difficulty tier.
pub trait WordStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn fetch(&self, difficulty: Difficulty) -> Result<WordEntry, SourceError>;
}

/// One dictionary provider. `Ok(None)` means the provider has no entry.
pub trait DefinitionLookup: Send + Sync {
    fn name(&self) -> &'static str;
    fn lookup(&self, word: &str) -> Result<Option<String>, SourceError>;
}

/// Per-provider time bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTimeouts {
    pub pattern: Duration,
    pub random_word: Duration,
    pub dictionary: Duration,
    pub datamuse_definition: Duration,
}

impl Default for SourceTimeouts {
    fn default() -> Self {
        Self {
            pattern: Duration::from_millis(1200),
            random_word: Duration::from_millis(1000),
            dictionary: Duration::from_millis(1200),
            datamuse_definition: Duration::from_millis(900),
        }
    }
}

/// What the caller wants a word for.
#[derive(Debug, Clone, Copy)]
pub enum WordRequest<'a> {
    /// Any word of the tier, chosen by the providers
    Random(Difficulty),
    /// A curated word that only needs its definition
    Curated { word: &'a str, info: Option<&'a str> },
}

pub struct WordSource {
    strategies: Vec<Box<dyn WordStrategy>>,
    definitions: Arc<Definitions>,
}

impl WordSource {
    pub fn new(strategies: Vec<Box<dyn WordStrategy>>, definitions: Arc<Definitions>) -> Self {
        Self {
            strategies,
            definitions,
        }
    }

    /// The standard provider chain over a transport:
    /// pattern lookup, then random word + dictionary lookup.
    pub fn standard(transport: Arc<dyn Transport>, cache: DefinitionCache, timeouts: SourceTimeouts) -> Self {
        let definitions = Arc::new(Definitions::new(
            cache,
            vec![
                Box::new(DictionaryApiLookup::new(transport.clone(), timeouts.dictionary)),
                Box::new(DatamuseDefinitionLookup::new(
                    transport.clone(),
                    timeouts.datamuse_definition,
                )),
            ],
        ));
        let strategies: Vec<Box<dyn WordStrategy>> = vec![
            Box::new(PatternLookup::new(transport.clone(), timeouts.pattern)),
            Box::new(RandomThenDefine::new(transport, definitions.clone(), timeouts.random_word)),
        ];
        Self::new(strategies, definitions)
    }

    /// Produce a word entry, never failing with anything but `NoWordAvailable`.
    pub fn fetch_candidate(&self, request: WordRequest<'_>) -> Result<WordEntry, SourceError> {
        match request {
            WordRequest::Random(difficulty) => self.fetch_random(difficulty),
            WordRequest::Curated { word, info } => {
                let definition = self.definitions.define(word)?;
                Ok(WordEntry::new(word, &definition).with_info(info.map(str::to_string)))
            }
        }
    }

    fn fetch_random(&self, difficulty: Difficulty) -> Result<WordEntry, SourceError> {
        for strategy in &self.strategies {
            match strategy.fetch(difficulty) {
                Ok(entry) => {
                    log::debug!("{} supplied '{}'", strategy.name(), entry.word);
                    return Ok(entry);
                }
                Err(e) => log::warn!("{} gave no word: {}", strategy.name(), e),
            }
        }
        Err(SourceError::NoWordAvailable)
    }

    #[cfg(test)]
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }
}

/// Random words of one difficulty tier.
pub struct RandomSupply {
    source: Arc<WordSource>,
    difficulty: Difficulty,
}

impl RandomSupply {
    pub fn new(source: Arc<WordSource>, difficulty: Difficulty) -> Self {
        Self { source, difficulty }
    }
}

impl Supply for RandomSupply {
    fn supply(&self) -> Result<WordEntry, SourceError> {
        self.source.fetch_candidate(WordRequest::Random(self.difficulty))
    }
}

/// Curated words in queue order, each with its definition.
pub struct CuratedSupply {
    source: Arc<WordSource>,
    set: WordSet,
    queue: Mutex<WordQueue>,
}

impl CuratedSupply {
    pub fn new(source: Arc<WordSource>, set: WordSet, queue: WordQueue) -> Self {
        Self {
            source,
            set,
            queue: Mutex::new(queue),
        }
    }
}

impl Supply for CuratedSupply {
    fn supply(&self) -> Result<WordEntry, SourceError> {
        // Draw under the lock; the definition lookup runs without it
        let word = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .next()
            .ok_or(SourceError::NoWordAvailable)?;
        self.source.fetch_candidate(WordRequest::Curated {
            word: &word,
            info: self.set.info_for(&word),
        })
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted transport shared by tests across the crate.

    use super::*;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// How the scripted transport answers a host.
    #[derive(Clone)]
    pub enum Reply {
        Json(Value),
        Fail,
        /// Never answers within any realistic timeout
        Stall,
    }

    /// Answers by URL host and counts calls per host.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<HashMap<String, Reply>>,
        calls: Mutex<HashMap<String, Arc<AtomicUsize>>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, host: &str, reply: Reply) -> Self {
            self.replies.lock().unwrap().insert(host.to_string(), reply);
            self
        }

        pub fn calls(&self, host: &str) -> usize {
            self.counter(host).load(Ordering::SeqCst)
        }

        fn counter(&self, host: &str) -> Arc<AtomicUsize> {
            self.calls
                .lock()
                .unwrap()
                .entry(host.to_string())
                .or_default()
                .clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn get_json(&self, url: &str, _timeout: Duration) -> Result<Value, SourceError> {
            let host = transport::host_of(url);
            self.counter(&host).fetch_add(1, Ordering::SeqCst);
            let reply = self.replies.lock().unwrap().get(&host).cloned();
            match reply {
                Some(Reply::Json(value)) => Ok(value),
                Some(Reply::Stall) => {
                    thread::sleep(Duration::from_secs(30));
                    Ok(Value::Null)
                }
                Some(Reply::Fail) | None => Err(SourceError::ProviderError {
                    provider: host,
                    reason: "HTTP 503".to_string(),
                }),
            }
        }
    }

    pub fn short_timeouts() -> SourceTimeouts {
        SourceTimeouts {
            pattern: Duration::from_millis(100),
            random_word: Duration::from_millis(100),
            dictionary: Duration::from_millis(100),
            datamuse_definition: Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{short_timeouts, Reply, ScriptedTransport};
    use super::*;
    use crate::game::word_sets::WordSets;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;

    const DATAMUSE: &str = "api.datamuse.com";
    const RANDOM: &str = "random-word-api.herokuapp.com";
    const DICTIONARY: &str = "api.dictionaryapi.dev";

    fn source_over(transport: Arc<ScriptedTransport>) -> WordSource {
        let cache = DefinitionCache::new(Arc::new(MemoryStore::new()));
        WordSource::standard(transport, cache, short_timeouts())
    }

    #[test]
    fn test_primary_provider_supplies_word() {
        let transport = Arc::new(ScriptedTransport::new().reply(
            DATAMUSE,
            Reply::Json(json!([{ "word": "frog", "defs": ["n\ta tailless amphibian"] }])),
        ));
        let source = source_over(transport.clone());

        let entry = source.fetch_candidate(WordRequest::Random(Difficulty::Easy)).unwrap();
        assert_eq!(entry, WordEntry::new("frog", "a tailless amphibian"));
        assert_eq!(transport.calls(RANDOM), 0);
    }

    #[test]
    fn test_empty_primary_falls_back_to_random_word() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(DATAMUSE, Reply::Json(json!([])))
                .reply(RANDOM, Reply::Json(json!(["toad"])))
                .reply(
                    DICTIONARY,
                    Reply::Json(json!([{ "meanings": [{ "definitions": [{ "definition": "A warty amphibian." }] }] }])),
                ),
        );
        let source = source_over(transport.clone());

        let entry = source.fetch_candidate(WordRequest::Random(Difficulty::Easy)).unwrap();
        assert_eq!(entry, WordEntry::new("toad", "A warty amphibian."));
        assert_eq!(transport.calls(RANDOM), 1);
        assert_eq!(source.definitions().cache().get("toad").as_deref(), Some("A warty amphibian."));
    }

    #[test]
    fn test_timed_out_primary_tries_fallback_once() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(DATAMUSE, Reply::Stall)
                .reply(RANDOM, Reply::Json(json!([]))),
        );
        let source = source_over(transport.clone());

        let result = source.fetch_candidate(WordRequest::Random(Difficulty::Medium));
        assert_eq!(result, Err(SourceError::NoWordAvailable));
        assert_eq!(transport.calls(DATAMUSE), 1);
        assert_eq!(transport.calls(RANDOM), 1);
    }

    #[test]
    fn test_non_alphabetic_random_word_is_rejected() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(DATAMUSE, Reply::Fail)
                .reply(RANDOM, Reply::Json(json!(["ice-cream"]))),
        );
        let source = source_over(transport.clone());

        assert_eq!(
            source.fetch_candidate(WordRequest::Random(Difficulty::Easy)),
            Err(SourceError::NoWordAvailable)
        );
        assert_eq!(transport.calls(DICTIONARY), 0);
    }

    #[test]
    fn test_curated_word_uses_cache_before_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = source_over(transport.clone());
        source.definitions().cache().put("penguin", "a flightless seabird");

        let entry = source
            .fetch_candidate(WordRequest::Curated {
                word: "Penguin",
                info: Some("Penguins swim well."),
            })
            .unwrap();
        assert_eq!(entry.word, "penguin");
        assert_eq!(entry.definition, "a flightless seabird");
        assert_eq!(entry.info.as_deref(), Some("Penguins swim well."));
        assert_eq!(transport.calls(DICTIONARY), 0);
        assert_eq!(transport.calls(DATAMUSE), 0);
    }

    #[test]
    fn test_curated_definition_falls_back_to_datamuse() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(DICTIONARY, Reply::Json(json!({ "title": "No Definitions Found" })))
                .reply(DATAMUSE, Reply::Json(json!([{ "word": "comet", "defs": ["n\tan icy body"] }]))),
        );
        let source = source_over(transport);

        let entry = source
            .fetch_candidate(WordRequest::Curated { word: "comet", info: None })
            .unwrap();
        assert_eq!(entry.definition, "an icy body");
    }

    #[test]
    fn test_curated_supply_walks_queue() {
        let transport = Arc::new(ScriptedTransport::new());
        let source = Arc::new(source_over(transport));
        let sets = WordSets::from_json(
            r#"{"sets":[{"id":"pond","words":["frog","newt"],"info":{"frog":"Frogs drink through their skin."}}]}"#,
        )
        .unwrap();
        let set = sets.find("pond").unwrap().clone();
        source.definitions().cache().put("frog", "a tailless amphibian");
        source.definitions().cache().put("newt", "a small salamander");

        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let queue = WordQueue::load(&set.id, &set.words, store);
        let supply = CuratedSupply::new(source, set, queue);

        let mut served: Vec<WordEntry> = (0..2).map(|_| supply.supply().unwrap()).collect();
        served.sort_by(|a, b| a.word.cmp(&b.word));
        assert_eq!(served[0].word, "frog");
        assert_eq!(served[0].info.as_deref(), Some("Frogs drink through their skin."));
        assert_eq!(served[1].word, "newt");
        assert_eq!(served[1].info, None);
    }

    #[test]
    fn test_error_display() {
        let timeout = SourceError::ProviderTimeout {
            provider: DATAMUSE.to_string(),
            after: Duration::from_millis(1200),
        };
        assert_eq!(timeout.to_string(), "api.datamuse.com timed out after 1200ms");
        assert_eq!(
            SourceError::NoWordAvailable.to_string(),
            "no word available from any provider"
        );
    }
}
