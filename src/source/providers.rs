//! Remote word and definition providers
//!
//! - Datamuse pattern lookup (word + definitions in one call)
//! - Random-word API (word only, definition looked up afterwards)
//! - dictionaryapi.dev and Datamuse spelling lookup for definitions

use super::definitions::Definitions;
use super::transport::{fetch_json, Transport};
use super::{DefinitionLookup, SourceError, WordStrategy};
use crate::game::{is_alpha, Difficulty, WordEntry};
use rand::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const DATAMUSE_WORDS: &str = "https://api.datamuse.com/words";
const RANDOM_WORD: &str = "https://random-word-api.herokuapp.com/word";
const DICTIONARY_ENTRIES: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

/// Candidates requested from the pattern lookup per call
const PATTERN_MAX_RESULTS: usize = 30;

#[derive(Debug, Deserialize)]
struct DatamuseWord {
    #[serde(default)]
    word: String,
    #[serde(default)]
    defs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(default)]
    definitions: Vec<Sense>,
}

#[derive(Debug, Deserialize)]
struct Sense {
    #[serde(default)]
    definition: String,
}

/// Strip the `<part of speech>\t` prefix from a Datamuse definition.
pub fn parse_datamuse_definition(defs: &[String]) -> Option<String> {
    let first = defs.first()?;
    let def = match first.split_once('\t') {
        Some((_, rest)) => rest.to_string(),
        None => first.clone(),
    };
    let def = def.trim().to_string();
    (!def.is_empty()).then_some(def)
}

fn malformed(provider: &str, e: serde_json::Error) -> SourceError {
    SourceError::ProviderError {
        provider: provider.to_string(),
        reason: format!("malformed response: {}", e),
    }
}

fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, SourceError> {
    reqwest::Url::parse_with_params(base, params)
        .map(|u| u.to_string())
        .map_err(|e| SourceError::ProviderError {
            provider: base.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a Datamuse word list, keeping alphabetic words that carry a definition.
fn usable_datamuse_words(value: Value) -> Result<Vec<WordEntry>, SourceError> {
    let list: Vec<DatamuseWord> =
        serde_json::from_value(value).map_err(|e| malformed("api.datamuse.com", e))?;
    Ok(list
        .into_iter()
        .filter(|w| is_alpha(&w.word))
        .filter_map(|w| {
            let def = parse_datamuse_definition(&w.defs)?;
            Some(WordEntry::new(&w.word, &def))
        })
        .collect())
}

/// Primary strategy: Datamuse spelling-pattern lookup with a letter-count mask.
pub struct PatternLookup {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl PatternLookup {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

impl WordStrategy for PatternLookup {
    fn name(&self) -> &'static str {
        "pattern lookup"
    }

    fn fetch(&self, difficulty: Difficulty) -> Result<WordEntry, SourceError> {
        let mask = difficulty.pick_mask(&mut rand::rng());
        let max = PATTERN_MAX_RESULTS.to_string();
        let url = build_url(DATAMUSE_WORDS, &[("sp", mask), ("md", "d"), ("max", max.as_str())])?;

        let candidates = usable_datamuse_words(fetch_json(&self.transport, url, self.timeout)?)?;
        candidates
            .choose(&mut rand::rng())
            .cloned()
            .ok_or_else(|| SourceError::ProviderError {
                provider: "api.datamuse.com".to_string(),
                reason: format!("no usable words for mask {}", mask),
            })
    }
}

/// Fallback strategy: a random word of a tier length, then a definition lookup.
pub struct RandomThenDefine {
    transport: Arc<dyn Transport>,
    definitions: Arc<Definitions>,
    timeout: Duration,
}

impl RandomThenDefine {
    pub fn new(transport: Arc<dyn Transport>, definitions: Arc<Definitions>, timeout: Duration) -> Self {
        Self {
            transport,
            definitions,
            timeout,
        }
    }
}

impl WordStrategy for RandomThenDefine {
    fn name(&self) -> &'static str {
        "random word"
    }

    fn fetch(&self, difficulty: Difficulty) -> Result<WordEntry, SourceError> {
        let length = difficulty.pick_length(&mut rand::rng()).to_string();
        let url = build_url(RANDOM_WORD, &[("number", "1"), ("length", length.as_str())])?;

        let words: Vec<String> = serde_json::from_value(fetch_json(&self.transport, url, self.timeout)?)
            .map_err(|e| malformed("random-word-api.herokuapp.com", e))?;
        let word = words
            .into_iter()
            .next()
            .filter(|w| is_alpha(w))
            .ok_or_else(|| SourceError::ProviderError {
                provider: "random-word-api.herokuapp.com".to_string(),
                reason: "no alphabetic word returned".to_string(),
            })?;

        let definition = self.definitions.define(&word)?;
        Ok(WordEntry::new(&word, &definition))
    }
}

/// Definition lookup against dictionaryapi.dev.
pub struct DictionaryApiLookup {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl DictionaryApiLookup {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

/// First definition of the first meaning, else the first definition of any meaning.
fn first_dictionary_definition(value: Value) -> Result<Option<String>, SourceError> {
    let entries: Vec<DictionaryEntry> =
        serde_json::from_value(value).map_err(|e| malformed("api.dictionaryapi.dev", e))?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };
    Ok(entry
        .meanings
        .into_iter()
        .flat_map(|m| m.definitions)
        .map(|s| s.definition.trim().to_string())
        .find(|d| !d.is_empty()))
}

impl DefinitionLookup for DictionaryApiLookup {
    fn name(&self) -> &'static str {
        "dictionaryapi.dev"
    }

    fn lookup(&self, word: &str) -> Result<Option<String>, SourceError> {
        let url = format!("{}/{}", DICTIONARY_ENTRIES, word);
        first_dictionary_definition(fetch_json(&self.transport, url, self.timeout)?)
    }
}

/// Definition lookup via Datamuse exact spelling.
pub struct DatamuseDefinitionLookup {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl DatamuseDefinitionLookup {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

impl DefinitionLookup for DatamuseDefinitionLookup {
    fn name(&self) -> &'static str {
        "datamuse definitions"
    }

    fn lookup(&self, word: &str) -> Result<Option<String>, SourceError> {
        let url = build_url(DATAMUSE_WORDS, &[("sp", word), ("md", "d"), ("max", "1")])?;
        let list: Vec<DatamuseWord> = serde_json::from_value(fetch_json(&self.transport, url, self.timeout)?)
            .map_err(|e| malformed("api.datamuse.com", e))?;
        Ok(list.first().and_then(|w| parse_datamuse_definition(&w.defs)))
    }
}
