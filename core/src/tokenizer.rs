use crate::config::PreprocessConfig;
use crate::linguistic::{linguistic_for, Linguistic};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

/// Tokens shorter than this never become terms.
pub const MIN_TERM_LEN: usize = 3;

lazy_static! {
    static ref STANDALONE_NUMBER: Regex = Regex::new(r"\b\d+\b").expect("valid regex");
    static ref NON_LETTER: Regex = Regex::new(r"[^a-z\s]").expect("valid regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
    static ref DOMAIN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "mg","ml","gram","tablet","kapsul","sirup",
            "yang","pada","untuk","dengan","dari","atau","dan","seperti","termasuk","dapat","akan","per"
        ];
        words.iter().copied().collect()
    };
}

/// Lowercase (after NFKC), drop standalone numbers, replace anything outside
/// `[a-z\s]` with a space and collapse whitespace. Digits glued to a word
/// ("500mg") survive the number pass and are blanked by the letter pass.
pub fn clean_text(text: &str) -> String {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let without_numbers = STANDALONE_NUMBER.replace_all(&lowered, "");
    let letters = NON_LETTER.replace_all(&without_numbers, " ");
    WHITESPACE.replace_all(&letters, " ").trim().to_string()
}

/// Split cleaned text on whitespace.
pub fn tokenize(cleaned: &str) -> Vec<String> {
    cleaned.split_whitespace().map(str::to_string).collect()
}

pub fn is_domain_stopword(token: &str) -> bool { DOMAIN_STOPWORDS.contains(token) }

/// Text → term pipeline: clean, tokenize, stopword removal, stemming, length
/// filter. Deterministic and side-effect free once constructed.
#[derive(Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
    linguistic: Arc<dyn Linguistic>,
}

impl Preprocessor {
    /// Assemble a pipeline around an explicit linguistic capability.
    pub fn new(config: PreprocessConfig, linguistic: Arc<dyn Linguistic>) -> Self {
        tracing::info!(
            capability = linguistic.name(),
            stemming = config.stemming,
            stopwords = config.stopwords,
            "preprocessing pipeline ready"
        );
        Self { config, linguistic }
    }

    pub fn from_config(config: PreprocessConfig) -> Self {
        Self::new(config, linguistic_for(config.linguistic))
    }

    pub fn config(&self) -> PreprocessConfig { self.config }

    pub fn capability(&self) -> &'static str { self.linguistic.name() }

    /// Drop linguistic and domain stopwords. No-op when the toggle is off.
    pub fn remove_stopwords(&self, tokens: Vec<String>) -> Vec<String> {
        if !self.config.stopwords {
            return tokens;
        }
        tokens
            .into_iter()
            .filter(|t| !self.linguistic.is_stopword(t) && !is_domain_stopword(t))
            .collect()
    }

    /// Stem every token. No-op when the toggle is off.
    pub fn stem_tokens(&self, tokens: Vec<String>) -> Vec<String> {
        if !self.config.stemming {
            return tokens;
        }
        tokens.into_iter().map(|t| self.linguistic.stem(&t)).collect()
    }

    /// Full pipeline. An empty result means the text has no retrievable terms.
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(&clean_text(text));
        let tokens = self.remove_stopwords(tokens);
        let tokens = self.stem_tokens(tokens);
        tokens.into_iter().filter(|t| t.len() >= MIN_TERM_LEN).collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self { Self::from_config(PreprocessConfig::default()) }
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("config", &self.config)
            .field("capability", &self.linguistic.name())
            .finish()
    }
}
