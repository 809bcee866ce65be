//! Domain types shared by the lexical, dense and hybrid engines.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};

pub type DocumentId = String;
pub type Fields = Map<String, Value>;

/// An indexed passage.
///
/// - `content`: the text payload; must be non-empty to be indexed
/// - `id`: optional string identity, set at most once (the retriever fills it
///   in when absent so rerankers can refer back to candidates)
/// - `fields`: arbitrary caller metadata carried along untouched
///
/// Documents are shared between indexes as `Arc<Document>`; indexes never
/// mutate them.
#[derive(Debug, Clone, Default)]
pub struct Document {
    content: String,
    id: OnceLock<DocumentId>,
    fields: Fields,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), id: OnceLock::new(), fields: Fields::new() }
    }

    pub fn with_id(self, id: impl Into<DocumentId>) -> Self { Self { id: OnceLock::from(id.into()), ..self } }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build a document from a JSON object such as `{"content": "...", "id": "a1", "source": "x.md"}`.
    ///
    /// `content` is required and must be a string; `id`, when present, must be
    /// a string. Every other key lands in `fields`.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::InvalidDocument("document must be a JSON object".into()));
        };
        let content = match map.remove("content") {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(Error::InvalidDocument(format!("'content' must be a string, got {}", json_kind(&other))))
            }
            None => return Err(Error::MissingContent),
        };
        let mut doc = Self::new(content);
        match map.remove("id") {
            Some(Value::String(id)) => doc = doc.with_id(id),
            Some(other) => {
                return Err(Error::InvalidDocument(format!("'id' must be a string, got {}", json_kind(&other))))
            }
            None => {}
        }
        doc.fields = map;
        Ok(doc)
    }

    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("content".into(), Value::String(self.content.clone()));
        if let Some(id) = self.id() {
            map.insert("id".into(), Value::String(id.to_string()));
        }
        Value::Object(map)
    }

    pub fn content(&self) -> &str { &self.content }

    pub fn id(&self) -> Option<&str> { self.id.get().map(String::as_str) }

    pub fn fields(&self) -> &Fields { &self.fields }

    pub fn field(&self, key: &str) -> Option<&Value> { self.fields.get(key) }

    /// Returns the existing id, or stores and returns the one produced by `generate`.
    pub fn id_or_insert_with(&self, generate: impl FnOnce() -> DocumentId) -> &str {
        self.id.get_or_init(generate)
    }

    /// Insertion contract shared by every index.
    pub fn validate(&self) -> Result<()> {
        if self.content.is_empty() { return Err(Error::MissingContent); }
        Ok(())
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Distance used by the dense index. Smaller is always closer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            other => Err(Error::InvalidConfig(format!("distance metric must be 'cosine' or 'euclidean', got '{other}'"))),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Self::Cosine => "cosine", Self::Euclidean => "euclidean" })
    }
}

/// What an index is asked to search with.
#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    Text(&'a str),
    Vector(&'a [f32]),
}

impl<'a> From<&'a str> for Query<'a> {
    fn from(text: &'a str) -> Self { Query::Text(text) }
}

impl<'a> From<&'a [f32]> for Query<'a> {
    fn from(vector: &'a [f32]) -> Self { Query::Vector(vector) }
}

/// A document paired with a layer-specific score.
///
/// Dense and lexical indexes return smaller-is-better scores (a distance, or
/// a normalized BM25 score); the retriever returns larger-is-better RRF
/// scores. Never compare scores from different layers directly.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Arc<Document>,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Arc<Document>, score: f32) -> Self { Self { document, score } }
}
