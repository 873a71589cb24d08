pub mod isbn_validator;
pub mod name_variants;
pub mod similarity_strategy;
pub mod text_normalizer;
pub mod tfidf;

pub use isbn_validator::{IsbnRepair, IsbnValidator};
pub use name_variants::{author_name_variants, name_tokens, ngrams, DEFAULT_NGRAM_SIZE};
pub use similarity_strategy::{
    jaro_similarity, jaro_winkler_similarity, levenshtein_distance, normalized_levenshtein,
    HybridStrategy, JaroWinklerStrategy, LevenshteinStrategy, SimilarityStrategy,
    DEFAULT_WINKLER_PREFIX_SCALE,
};
pub use text_normalizer::{TextNormalizer, TextTransformation};
pub use tfidf::{cosine_similarity, term_frequencies, TermVector, TfIdfCorpus};
