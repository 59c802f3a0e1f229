use std::ops::Deref;
use std::sync::Arc;

/// Splits text into normalized index terms.
pub trait TokenizerProvider: Send + Sync {
    /// Lowercased alphanumeric runs of `text`, stop words removed.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
            .filter(|term| !self.stop_words().contains(&term.as_str()))
            .collect()
    }

    fn stop_words(&self) -> &[&'static str];
}

#[derive(Clone)]
pub struct Tokenizer {
    inner: Arc<dyn TokenizerProvider>,
}

impl Tokenizer {
    pub fn new<T: TokenizerProvider + 'static>(inner: T) -> Self {
        Tokenizer {
            inner: Arc::new(inner),
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Tokenizer::new(EnglishTokenizer)
    }
}

impl Deref for Tokenizer {
    type Target = Arc<dyn TokenizerProvider>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

const ENGLISH_STOP_WORDS: [&str; 33] = [
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

pub struct EnglishTokenizer;

impl TokenizerProvider for EnglishTokenizer {
    fn stop_words(&self) -> &[&'static str] {
        &ENGLISH_STOP_WORDS
    }
}
