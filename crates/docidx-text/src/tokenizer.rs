/// Text → terms for the lexical index.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn tokenize(&self, text: &str) -> Vec<String> { self(text) }
}

/// Lowercases, then splits on every run of non-word characters. A word
/// character is a Unicode alphanumeric or `_`. Empty pieces are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        let tokens = WordTokenizer.tokenize("The cat-sat, on   the MAT!");
        assert_eq!(tokens, vec!["the", "cat", "sat", "on", "the", "mat"]);
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(WordTokenizer.tokenize("chat_id=42"), vec!["chat_id", "42"]);
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert!(WordTokenizer.tokenize(" ... --- !!").is_empty());
        assert!(WordTokenizer.tokenize("").is_empty());
    }

    #[test]
    fn closures_are_tokenizers() {
        let ws = |text: &str| text.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(ws.tokenize("A b"), vec!["A", "b"]);
    }
}
