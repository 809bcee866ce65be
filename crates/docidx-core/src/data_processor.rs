use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::Document;

/// Line of dashes separating sections in fetched API documentation.
pub const SECTION_DELIMITER: &str = "\n--------------------------------";

/// Split documentation text into sections on [`SECTION_DELIMITER`].
/// Sections are trimmed; blank ones are dropped.
pub fn chunk_by_section(text: &str) -> Vec<String> {
    text.split(SECTION_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub extensions: Vec<String>,
    /// Sections longer than this many words are split further on blank lines.
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { extensions: vec!["txt".into(), "md".into()], max_words: 400 }
    }
}

/// Turns a directory of documentation files into indexable documents.
#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    /// Every produced document carries `source` (file path) and `chunk_index`.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Document>> {
        let files = self.list_files(data_dir);
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no documentation files found");
            return Ok(vec![]);
        }
        let mut all_chunks = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), "processing file {}/{}", file_index + 1, files.len());
            let content = self.read_file_content(file_path)?;
            all_chunks.extend(self.chunk_text(&content, &file_path.to_string_lossy()));
        }
        info!(files = files.len(), chunks = all_chunks.len(), "processed documentation directory");
        Ok(all_chunks)
    }

    /// Chunk one text blob already in memory.
    pub fn chunk_text(&self, text: &str, source: &str) -> Vec<Document> {
        chunk_by_section(text)
            .into_iter()
            .flat_map(|section| self.split_long_section(section))
            .enumerate()
            .map(|(chunk_index, content)| {
                Document::new(content).with_field("source", source).with_field("chunk_index", chunk_index)
            })
            .collect()
    }

    fn split_long_section(&self, section: String) -> Vec<String> {
        if section.split_whitespace().count() <= self.chunking_config.max_words {
            return vec![section];
        }
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut current_words = 0;
        for paragraph in section.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
            let words = paragraph.split_whitespace().count();
            if current_words > 0 && current_words + words > self.chunking_config.max_words {
                parts.push(std::mem::take(&mut current));
                current_words = 0;
            }
            if !current.is_empty() { current.push_str("\n\n"); }
            current.push_str(paragraph);
            current_words += words;
        }
        if !current.is_empty() { parts.push(current); }
        parts
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => {
                let bytes = fs::read(file_path).with_context(|| format!("Failed to read {}", file_path.display()))?;
                Ok(String::from_utf8_lossy(&bytes).to_string())
            }
        }
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| self.chunking_config.extensions.iter().any(|e| e == ext));
            if matches { files.push(path.to_path_buf()); }
        }
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_split_on_dash_rule() {
        let text = "TITLE: a\nbody a\n--------------------------------\nTITLE: b\nbody b\n--------------------------------\n\n";
        let sections = chunk_by_section(text);
        assert_eq!(sections, vec!["TITLE: a\nbody a".to_string(), "TITLE: b\nbody b".to_string()]);
    }

    #[test]
    fn short_dash_runs_are_not_delimiters() {
        assert_eq!(chunk_by_section("a\n----\nb").len(), 1);
    }

    #[test]
    fn long_sections_split_on_paragraphs() {
        let processor = DataProcessor::with_config(ChunkingConfig { max_words: 3, ..Default::default() });
        let docs = processor.chunk_text("one two\n\nthree four\n\nfive", "mem");
        let contents: Vec<&str> = docs.iter().map(|d| d.content()).collect();
        assert_eq!(contents, vec!["one two", "three four\n\nfive"]);
        assert_eq!(docs[1].field("chunk_index"), Some(&serde_json::json!(1)));
    }
}
