//! docidx-text
//!
//! Lexical side of the retrieval engine: a word tokenizer and an in-memory
//! BM25 index with lazily rebuilt corpus statistics.

pub mod bm25;
pub mod tokenizer;

pub use bm25::Bm25Index;
pub use tokenizer::{Tokenizer, WordTokenizer};
