use std::collections::HashSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in",
    "into", "is", "it", "its", "of", "on", "or", "that", "the", "their", "this", "to", "was",
    "were", "will", "with", "your", "you", "edition", "volume", "vol",
];

const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a", "ao", "aos", "as", "com", "da", "das", "de", "do", "dos", "e", "em", "na", "nas", "no",
    "nos", "o", "os", "ou", "para", "pela", "pelas", "pelo", "pelos", "por", "que", "se", "sem",
    "sobre", "um", "uma", "umas", "uns", "edicao",
];

/// Technical terms whose punctuation carries meaning, rewritten before stripping
const TECHNICAL_REWRITES: &[(&str, &str)] = &[
    ("c++", "cpp"),
    ("c#", "csharp"),
    ("f#", "fsharp"),
    ("node.js", "nodejs"),
    ("vue.js", "vuejs"),
    ("react.js", "reactjs"),
    (".net", "dotnet"),
    ("asp.net", "aspnet"),
    ("objective-c", "objectivec"),
];

/// Short tokens kept despite the minimum token length
const PRESERVED_TERMS: &[&str] = &[
    "ai", "ml", "ui", "ux", "go", "r", "c", "js", "ts", "os", "db", "io", "qt", "3d", "2d", "vr",
    "ar", "cpp", "csharp", "fsharp", "nodejs", "vuejs", "reactjs", "dotnet", "aspnet",
    "objectivec", "sql", "api",
];

/// Transformation that can be applied to a piece of text
///
/// Each transformation is composable and testable in isolation.
pub trait TextTransformation: Send + Sync {
    fn transform(&self, text: &str) -> String;
    fn name(&self) -> &'static str;
}

/// Decomposes accented characters and drops the combining marks
#[derive(Debug, Clone)]
pub struct UnicodeFoldTransform;

impl TextTransformation for UnicodeFoldTransform {
    fn transform(&self, text: &str) -> String {
        text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
    }

    fn name(&self) -> &'static str {
        "UnicodeFold"
    }
}

/// Converts text to lowercase
#[derive(Debug, Clone)]
pub struct LowercaseTransform;

impl TextTransformation for LowercaseTransform {
    fn transform(&self, text: &str) -> String {
        text.to_lowercase()
    }

    fn name(&self) -> &'static str {
        "Lowercase"
    }
}

/// Rewrites technical names like `c++` into punctuation-free tokens
#[derive(Debug, Clone)]
pub struct TechnicalTermsTransform;

impl TextTransformation for TechnicalTermsTransform {
    fn transform(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| {
                let trimmed =
                    word.trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '(' | ')' | '"' | '\''));
                let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
                TECHNICAL_REWRITES
                    .iter()
                    .find(|(from, _)| from.eq_ignore_ascii_case(trimmed))
                    .map_or_else(|| word.to_string(), |(_, to)| to.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn name(&self) -> &'static str {
        "TechnicalTerms"
    }
}

/// Replaces punctuation with spaces, keeping hyphens between alphanumerics
#[derive(Debug, Clone)]
pub struct StripPunctuationTransform;

impl TextTransformation for StripPunctuationTransform {
    fn transform(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        chars
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else if c == '-'
                    && i > 0
                    && i + 1 < chars.len()
                    && chars[i - 1].is_alphanumeric()
                    && chars[i + 1].is_alphanumeric()
                {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "StripPunctuation"
    }
}

/// Normalizes whitespace (collapses multiple spaces, trims)
#[derive(Debug, Clone)]
pub struct NormalizeWhitespaceTransform;

impl TextTransformation for NormalizeWhitespaceTransform {
    fn transform(&self, text: &str) -> String {
        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    fn name(&self) -> &'static str {
        "NormalizeWhitespace"
    }
}

/// Text normalizer that applies a pipeline of transformations, then
/// tokenizes with stop-word and short-token filtering
pub struct TextNormalizer {
    transformations: Vec<Box<dyn TextTransformation>>,
    stop_words: HashSet<String>,
    preserved_terms: HashSet<String>,
    min_token_length: usize,
}

impl TextNormalizer {
    /// Create a normalizer with no transformations and no filtering
    pub fn new() -> Self {
        Self {
            transformations: Vec::new(),
            stop_words: HashSet::new(),
            preserved_terms: HashSet::new(),
            min_token_length: 1,
        }
    }

    /// English + Portuguese stop words, technical term handling, tokens of 3+ chars
    pub fn default_pipeline() -> Self {
        Self::new()
            .with_unicode_fold()
            .with_lowercase()
            .with_technical_terms()
            .with_strip_punctuation()
            .with_normalize_whitespace()
            .with_stop_words(
                ENGLISH_STOP_WORDS
                    .iter()
                    .chain(PORTUGUESE_STOP_WORDS.iter())
                    .map(|w| w.to_string()),
            )
            .with_preserved_terms(PRESERVED_TERMS.iter().map(|w| w.to_string()))
            .with_min_token_length(3)
    }

    /// Accent-free, lowercase, punctuation-free text for character-level
    /// comparison; keeps every token
    pub fn comparison_pipeline() -> Self {
        Self::new()
            .with_unicode_fold()
            .with_lowercase()
            .with_strip_punctuation()
            .with_normalize_whitespace()
    }

    pub fn with_unicode_fold(mut self) -> Self {
        self.transformations.push(Box::new(UnicodeFoldTransform));
        self
    }

    pub fn with_lowercase(mut self) -> Self {
        self.transformations.push(Box::new(LowercaseTransform));
        self
    }

    pub fn with_technical_terms(mut self) -> Self {
        self.transformations.push(Box::new(TechnicalTermsTransform));
        self
    }

    pub fn with_strip_punctuation(mut self) -> Self {
        self.transformations.push(Box::new(StripPunctuationTransform));
        self
    }

    pub fn with_normalize_whitespace(mut self) -> Self {
        self.transformations
            .push(Box::new(NormalizeWhitespaceTransform));
        self
    }

    pub fn with_stop_words(mut self, words: impl IntoIterator<Item = String>) -> Self {
        self.stop_words.extend(words);
        self
    }

    pub fn with_preserved_terms(mut self, terms: impl IntoIterator<Item = String>) -> Self {
        self.preserved_terms.extend(terms);
        self
    }

    pub fn with_min_token_length(mut self, min_token_length: usize) -> Self {
        self.min_token_length = min_token_length;
        self
    }

    /// Apply all transformations to the text
    pub fn normalize(&self, text: &str) -> String {
        let mut result = text.to_string();

        for transformation in &self.transformations {
            result = transformation.transform(&result);
            log::trace!("After {}: '{}'", transformation.name(), result);
        }

        result
    }

    /// Normalize, split, and drop stop words and short tokens
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split_whitespace()
            .filter(|token| {
                if self.preserved_terms.contains(*token) {
                    return true;
                }
                !self.stop_words.contains(*token)
                    && token.chars().count() >= self.min_token_length
            })
            .map(str::to_string)
            .collect()
    }

    pub fn transformation_count(&self) -> usize {
        self.transformations.len()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::default_pipeline()
    }
}
