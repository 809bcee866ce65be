//! Language-model reranker.
//!
//! The model sees the query and every candidate tagged with its id, and
//! answers with a JSON object `{"document_ids": [...]}`. The completion
//! backend is pluggable through [`Completion`].

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use docidx_core::{Document, Reranker};

/// The assistant turn is primed with this so the reply is bare JSON.
pub const RESPONSE_PREFILL: &str = "```json";
pub const STOP_SEQUENCE: &str = "```";

/// Text completion backend: prompt in, continuation of `prefill` out.
/// Generation ends at `stop`, which is not included in the returned text.
pub trait Completion: Send + Sync {
    fn complete(&self, prompt: &str, prefill: &str, stop: &str) -> Result<String>;
}

impl<F> Completion for F
where
    F: Fn(&str, &str, &str) -> Result<String> + Send + Sync,
{
    fn complete(&self, prompt: &str, prefill: &str, stop: &str) -> Result<String> { self(prompt, prefill, stop) }
}

pub struct LlmReranker<C> {
    client: C,
}

impl<C: Completion> LlmReranker<C> {
    pub fn new(client: C) -> Self { Self { client } }
}

impl<C: Completion> Reranker for LlmReranker<C> {
    fn rerank(&self, documents: &[Arc<Document>], query: &str, k: usize) -> Result<Vec<String>> {
        let prompt = build_prompt(documents, query, k)?;
        let reply = self.client.complete(&prompt, RESPONSE_PREFILL, STOP_SEQUENCE).context("reranker completion failed")?;
        let ids = parse_document_ids(&reply)?;
        debug!(candidates = documents.len(), returned = ids.len(), "llm rerank");
        Ok(ids)
    }
}

pub fn build_prompt(documents: &[Arc<Document>], query: &str, k: usize) -> Result<String> {
    let mut joined = Vec::with_capacity(documents.len());
    for doc in documents {
        let id = doc.id().ok_or_else(|| anyhow!("candidate document has no id"))?;
        joined.push(format!(
            "<document>\n<document_id>{id}</document_id>\n<document_content>{}</document_content>\n</document>",
            doc.content()
        ));
    }
    let joined = joined.join("\n");

    Ok(format!(
        r#"You are about to be given a set of documents, along with an id of each.
Your task is to select the {k} most relevant documents to answer the user's question.

Here is the user's question:
<question>
{query}
</question>

Here are the documents to select from:
<documents>
{joined}
</documents>

Respond in the following format:
```json
{{
    "document_ids": str[] # List document ids, {k} elements long, sorted in order of decreasing relevance to the user's query.
}}
```
"#
    ))
}

#[derive(Deserialize)]
struct RerankReply {
    document_ids: Vec<String>,
}

/// Parse the model's reply. Tolerates the fences being echoed back.
pub fn parse_document_ids(reply: &str) -> Result<Vec<String>> {
    let mut body = reply.trim();
    body = body.strip_prefix(RESPONSE_PREFILL).unwrap_or(body);
    body = body.strip_suffix(STOP_SEQUENCE).unwrap_or(body).trim();
    let parsed: RerankReply =
        serde_json::from_str(body).with_context(|| format!("malformed reranker reply: {}", truncate(body, 200)))?;
    Ok(parsed.document_ids)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
